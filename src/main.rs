//! docker-relay entry point.
//!
//! Invoked under any other name, the binary relays that program into docker.
//! Invoked as `docker-relay`, it offers commands to inspect what a relay
//! would do.

use clap::{Parser, Subcommand};
use docker_relay::exec::fail;
use docker_relay::shim::{self, ProcessContext, RELAY_NAME};
use docker_relay::{ComposeResolver, Invocation, RelayConfig, Synthesis, Synthesizer};
use std::env;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "docker-relay")]
#[command(about = "Relay commands into docker containers", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the command a program would be relayed to, without running it
    Explain {
        /// Program name to resolve, as if invoked through a symlink
        program: String,

        /// Extra config file merged over the discovered ones
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Pretend stdin is a terminal
        #[arg(long)]
        tty: bool,

        /// Output in human-readable format instead of JSON
        #[arg(long)]
        human: bool,

        /// Arguments passed to the program (after --)
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Print the merged configuration and the files it came from
    Config {
        /// Extra config file merged over the discovered ones
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },
}

fn main() {
    let argv: Vec<String> = env::args_os()
        .map(|arg| arg.to_string_lossy().to_string())
        .collect();
    let program = argv
        .first()
        .map(|arg0| Invocation::program_name(arg0))
        .unwrap_or_default();

    if program != RELAY_NAME {
        let args = argv.into_iter().skip(1).collect();
        if let Err(e) = shim::run(program, args) {
            fail(&e);
        }
        return;
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Explain {
            program,
            config,
            tty,
            human,
            args,
        } => {
            run_explain(program, config, tty, human, args);
        }
        Commands::Config { config } => {
            run_config(config);
        }
    }
}

fn run_explain(program: String, config_path: Option<PathBuf>, tty: bool, human: bool, args: Vec<String>) {
    let context = ProcessContext::capture();
    let config = match RelayConfig::load(&context.load_options().with_explicit(config_path)) {
        Ok(c) => c,
        Err(e) => fail(&e),
    };

    let invocation = context.invocation(program, args, tty);
    let resolver = ComposeResolver::default();
    let synthesis = match Synthesizer::new(&config, &resolver).synthesize(&invocation) {
        Ok(s) => s,
        Err(e) => fail(&e),
    };

    if human {
        print_human(&synthesis, &resolver);
    } else {
        match serde_json::to_string_pretty(&synthesis) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
    }
}

fn print_human(synthesis: &Synthesis, resolver: &ComposeResolver) {
    println!("Mode: {:?}", synthesis.mode);
    match synthesis.lookup {
        Some(ref name) => println!("  Lookup: {}", resolver.command_line(name).join(" ")),
        None => println!("  Lookup: skipped"),
    }
    if let Some(ref target) = synthesis.target {
        println!("  Target: {}", target);
    }
    let options = synthesis.record.options();
    if !options.is_empty() {
        println!("  Options: {}", options.join(" "));
    }
    println!();
    println!("{}", synthesis.args.join(" "));
}

fn run_config(config_path: Option<PathBuf>) {
    let context = ProcessContext::capture();
    let config = match RelayConfig::load(&context.load_options().with_explicit(config_path)) {
        Ok(c) => c,
        Err(e) => fail(&e),
    };

    match config.to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}
