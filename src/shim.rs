//! The relay itself: capture the process context, synthesize, execute.

use std::collections::BTreeMap;
use std::env;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use crate::config::{EnvFile, LoadOptions, RelayConfig, ENV_FILE_NAME};
use crate::debug_log;
use crate::error::Result;
use crate::exec::{find_binary, replace_process};
use crate::resolver::ComposeResolver;
use crate::synth::{Invocation, Synthesizer};

/// Name under which the binary exposes its own commands instead of relaying
pub const RELAY_NAME: &str = "docker-relay";

/// Working directory and environment of the running process
#[derive(Debug, Clone, Default)]
pub struct ProcessContext {
    pub cwd: Option<PathBuf>,

    /// Process environment plus `.env` variables that were not already set
    pub env: BTreeMap<String, String>,

    /// The `.env` variables that were added, to hand on to the child
    pub dotenv: Vec<(String, String)>,
}

impl ProcessContext {
    /// Capture the current process's context.
    ///
    /// A malformed `.env` file is skipped, the same as a missing one.
    pub fn capture() -> Self {
        let cwd = env::current_dir().ok();
        let mut vars: BTreeMap<String, String> = env::vars_os()
            .map(|(k, v)| (k.to_string_lossy().to_string(), v.to_string_lossy().to_string()))
            .collect();

        let dotenv = cwd
            .as_ref()
            .and_then(|dir| EnvFile::load(&dir.join(ENV_FILE_NAME)).ok())
            .unwrap_or_default()
            .apply(&mut vars);

        Self {
            cwd,
            env: vars,
            dotenv,
        }
    }

    pub fn cwd_string(&self) -> Option<String> {
        self.cwd.as_ref().map(|p| p.to_string_lossy().to_string())
    }

    /// The invocation for `program` with `args` in this context
    pub fn invocation(&self, program: String, args: Vec<String>, tty: bool) -> Invocation {
        Invocation {
            program,
            args,
            cwd: self.cwd_string(),
            tty,
            env: self.env.clone(),
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            home: dirs::home_dir(),
            cwd: self.cwd.clone(),
            explicit: None,
        }
    }
}

/// Relay `program args...` into docker. Only returns on failure.
pub fn run(program: String, args: Vec<String>) -> Result<()> {
    let context = ProcessContext::capture();
    let config = RelayConfig::load(&context.load_options())?;
    let invocation = context.invocation(program, args, io::stdin().is_terminal());

    let resolver = ComposeResolver::default();
    let synthesis = Synthesizer::new(&config, &resolver).synthesize(&invocation)?;

    debug_log::record_invocation(
        &config.debug_settings(),
        invocation.cwd.as_deref(),
        &synthesis.args,
        &synthesis.record,
    );

    let binary = find_binary(synthesis.args.first().map(String::as_str).unwrap_or_default())?;
    replace_process(&binary, &synthesis.args, &context.dotenv)
}
