//! Container lookup
//!
//! Maps a logical container name to the id of a running container. The
//! default adapter asks `docker-compose` for the service in the current
//! project.

use std::process::Command;

use crate::error::Result;

/// Container name that skips the lookup and always runs the image
pub const SKIP_LOOKUP: &str = "!";

/// Outcome of a container lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Running(String),
    NotRunning,
}

impl Resolution {
    /// Build from an `(id, ok)` pair; `ok == false` or an empty id means
    /// not running.
    pub fn from_lookup(id: &str, ok: bool) -> Self {
        let id = id.trim();
        if ok && !id.is_empty() {
            Resolution::Running(id.to_string())
        } else {
            Resolution::NotRunning
        }
    }

    /// The container id, or an empty string when not running
    pub fn container_id(&self) -> &str {
        match self {
            Resolution::Running(id) => id,
            Resolution::NotRunning => "",
        }
    }
}

/// Resolves container names to running containers.
pub trait ContainerResolver {
    /// Look up `name`. "Not running" is a normal outcome; an error means
    /// the lookup itself could not be answered.
    fn resolve(&self, name: &str) -> Result<Resolution>;
}

/// Looks services up with `docker-compose ps -q <name>`
#[derive(Debug, Clone)]
pub struct ComposeResolver {
    program: String,
}

impl Default for ComposeResolver {
    fn default() -> Self {
        Self::new("docker-compose")
    }
}

impl ComposeResolver {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The command line used for a lookup
    pub fn command_line(&self, name: &str) -> Vec<String> {
        vec![
            self.program.clone(),
            "ps".to_string(),
            "-q".to_string(),
            name.to_string(),
        ]
    }
}

impl ContainerResolver for ComposeResolver {
    /// Every failure collapses to "not running": a missing binary, no
    /// compose project here, or an unknown service all fall back to the
    /// image.
    fn resolve(&self, name: &str) -> Result<Resolution> {
        let output = Command::new(&self.program).args(&self.command_line(name)[1..]).output();

        match output {
            Ok(output) if output.status.success() => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                Ok(Resolution::from_lookup(&stdout, true))
            }
            _ => Ok(Resolution::NotRunning),
        }
    }
}
