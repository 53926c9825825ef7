//! Command synthesis
//!
//! Turns a program's sub-configuration, the state of its container and the
//! caller's own arguments into the exact command vector to execute:
//!
//! ```text
//! docker exec -i [-t] <options> <container> <cmd...> <args...>
//! docker run  -i [-t] <options> <image>     <cmd...> <args...>
//! <exec...> <args...>
//! ```
//!
//! Nothing here executes anything; the caller replaces the process with the
//! returned vector.

use relay_record::{ConfigRecord, Expander};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::{merge_layers, RelayConfig};
use crate::error::{RelayError, Result};
use crate::resolver::{ContainerResolver, Resolution, SKIP_LOOKUP};

/// The binary every docker-mode vector starts with
pub const DOCKER_BINARY: &str = "docker";

/// Sub-configuration key naming the container to look up
const CONTAINER_KEY: &str = "container";

/// Sub-configuration table layered on top when running an image
const RUN_KEY: &str = "run";

/// One invocation of the shim
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    /// Base name the shim was invoked as
    pub program: String,

    /// Arguments after the program name
    pub args: Vec<String>,

    /// Current working directory, when it could be determined
    pub cwd: Option<String>,

    /// Whether stdin is a terminal
    pub tty: bool,

    /// Environment visible to `${VAR}` references
    pub env: BTreeMap<String, String>,
}

impl Invocation {
    /// Base name of `argv[0]`
    pub fn program_name(argv0: &str) -> String {
        Path::new(argv0)
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| argv0.to_string())
    }
}

/// Which kind of command was built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// `docker exec` into a running container
    Exec,
    /// `docker run` of the configured image
    Run,
    /// The configured `exec` command replaces docker entirely
    Override,
}

/// The synthesized command and what it was built from
#[derive(Debug, Clone, Serialize)]
pub struct Synthesis {
    pub mode: Mode,

    /// Container name that was looked up, `None` when the lookup was skipped
    pub lookup: Option<String>,

    /// Container id or image, `None` in override mode
    pub target: Option<String>,

    /// The command vector; `args[0]` is the binary
    pub args: Vec<String>,

    /// The record after substitution
    pub record: ConfigRecord,
}

/// Builds command vectors from a loaded configuration
pub struct Synthesizer<'a> {
    config: &'a RelayConfig,
    resolver: &'a dyn ContainerResolver,
    expander: Expander,
}

impl<'a> Synthesizer<'a> {
    pub fn new(config: &'a RelayConfig, resolver: &'a dyn ContainerResolver) -> Self {
        Self {
            config,
            resolver,
            expander: Expander::new(),
        }
    }

    /// Build the command vector for an invocation.
    pub fn synthesize(&self, invocation: &Invocation) -> Result<Synthesis> {
        let program = invocation.program.as_str();
        let sub = self
            .config
            .program(program)
            .ok_or_else(|| RelayError::ConfigurationMissing(program.to_string()))?;

        let name = container_name(sub, program);
        let (lookup, resolution) = if name == SKIP_LOOKUP {
            (None, Resolution::NotRunning)
        } else {
            let resolution = self.resolver.resolve(&name)?;
            let id = resolution.container_id();
            (Some(name), Resolution::from_lookup(id, !id.is_empty()))
        };

        let running = matches!(resolution, Resolution::Running(_));
        let mut record = build_record(sub, !running)?;

        self.expander
            .expand(&mut record, invocation.cwd.as_deref(), |var| {
                invocation.env.get(var).cloned()
            });

        let trailing = rewrite_paths(&invocation.args, &record.path, invocation.cwd.as_deref());

        if !record.exec.is_empty() {
            let mut args = record.exec.clone();
            args.extend(trailing);
            return Ok(Synthesis {
                mode: Mode::Override,
                lookup,
                target: None,
                args,
                record,
            });
        }

        let (mode, target) = match resolution {
            Resolution::Running(id) => (Mode::Exec, id),
            Resolution::NotRunning => {
                if record.image.is_empty() {
                    return Err(RelayError::MissingImage(program.to_string()));
                }
                (Mode::Run, record.image.clone())
            }
        };

        let mut args = vec![
            DOCKER_BINARY.to_string(),
            match mode {
                Mode::Exec => "exec".to_string(),
                _ => "run".to_string(),
            },
            "-i".to_string(),
        ];
        if invocation.tty {
            args.push("-t".to_string());
        }
        args.extend(record.options());
        args.push(target.clone());
        args.extend(record.cmd.iter().cloned());
        args.extend(trailing);

        Ok(Synthesis {
            mode,
            lookup,
            target: Some(target),
            args,
            record,
        })
    }
}

/// The `container` key when set, otherwise the program name
fn container_name(sub: &Map<String, Value>, program: &str) -> String {
    sub.get(CONTAINER_KEY)
        .and_then(|v| v.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(program)
        .to_string()
}

/// Decode the record for this invocation.
///
/// When running an image, `rm = true` is the default beneath the program's
/// own settings and the `run` table is layered on top of them.
fn build_record(sub: &Map<String, Value>, run_image: bool) -> Result<ConfigRecord> {
    let mut base = sub.clone();
    let run_layer = base.remove(RUN_KEY);
    let base = ConfigRecord::normalize_layer(Value::Object(base))?;

    if !run_image {
        return Ok(ConfigRecord::from_value(base)?);
    }

    let mut layers = vec![json!({ "rm": true }), base];
    if let Some(run_layer @ Value::Object(_)) = run_layer {
        layers.push(ConfigRecord::normalize_layer(run_layer)?);
    }

    Ok(ConfigRecord::from_value(merge_layers(layers))?)
}

/// Replace the first occurrence of the working directory in each argument
/// with the configured path.
pub fn rewrite_paths(args: &[String], path: &str, cwd: Option<&str>) -> Vec<String> {
    match cwd {
        Some(cwd) if !path.is_empty() && !cwd.is_empty() => {
            args.iter().map(|arg| arg.replacen(cwd, path, 1)).collect()
        }
        _ => args.to_vec(),
    }
}
