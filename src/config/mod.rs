//! Layered configuration
//!
//! Layers, lowest precedence first:
//! 1. Home directory (`~/.docker-relay.{json,toml,yaml,yml}`, first found)
//! 2. Working directory (`.docker-relay.{json,yaml,yml,toml}`, all found)
//! 3. An explicit `--config` file (management commands only)
//!
//! The merged result is an immutable [`RelayConfig`] handed to the
//! synthesizer.

mod env_file;
mod merge;
mod sources;

pub use env_file::{EnvFile, ENV_FILE_NAME};
pub use merge::{deep_merge, lowercase_keys, merge_layers};
pub use sources::{
    discover, load_file, parse_str, ConfigFormat, ConfigOrigin, ConfigSource, CONFIG_BASENAME,
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::error::{RelayError, Result};

/// Top-level table holding the debug file settings
pub const DEBUG_KEY: &str = "docker-relay-debug";

/// Default debug file, relative to the working directory
pub const DEFAULT_DEBUG_FILE: &str = "docker-relay-debug.txt";

/// Where to look for configuration layers
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub home: Option<PathBuf>,
    pub cwd: Option<PathBuf>,
    pub explicit: Option<PathBuf>,
}

impl LoadOptions {
    pub fn with_explicit(mut self, path: Option<PathBuf>) -> Self {
        self.explicit = path;
        self
    }
}

/// Merged configuration with provenance
#[derive(Debug, Clone, Serialize)]
pub struct RelayConfig {
    /// The merged configuration object
    pub config: Value,

    /// Contributing files in precedence order
    pub sources: Vec<ConfigSource>,
}

/// Debug file settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugSettings {
    pub enabled: bool,
    pub file: PathBuf,
}

/// The `docker-relay-debug` table as written
#[derive(Debug, Default, Deserialize)]
struct DebugTable {
    #[serde(default, deserialize_with = "relay_record::de::flag")]
    enabled: bool,

    #[serde(default, deserialize_with = "relay_record::de::text")]
    file: String,
}

impl RelayConfig {
    /// Discover, parse and merge every layer.
    ///
    /// Home and working-directory files are optional; an explicit file must
    /// exist.
    pub fn load(options: &LoadOptions) -> Result<Self> {
        let mut found = discover(options.home.as_deref(), options.cwd.as_deref());
        if let Some(ref path) = options.explicit {
            if !path.is_file() {
                return Err(RelayError::ConfigurationParse {
                    path: path.clone(),
                    message: "file does not exist".to_string(),
                });
            }
            found.push((ConfigOrigin::Explicit, path.clone()));
        }

        let mut layers = Vec::with_capacity(found.len());
        let mut sources = Vec::with_capacity(found.len());
        for (origin, path) in found {
            let (value, digest) = load_file(&path)?;
            layers.push(value);
            sources.push(ConfigSource {
                origin,
                path: path.to_string_lossy().to_string(),
                digest,
            });
        }

        Ok(Self::from_layers(layers, sources))
    }

    /// Merge already-parsed layers.
    pub fn from_layers(layers: Vec<Value>, sources: Vec<ConfigSource>) -> Self {
        let merged = match merge_layers(layers.into_iter().map(lowercase_keys).collect()) {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };

        Self {
            config: merged,
            sources,
        }
    }

    /// Build from a single in-memory value.
    pub fn from_value(value: Value) -> Self {
        Self::from_layers(vec![value], Vec::new())
    }

    /// The sub-configuration for a program, if it exists and is a table.
    pub fn program(&self, name: &str) -> Option<&Map<String, Value>> {
        self.config.get(name.to_lowercase())?.as_object()
    }

    /// Debug file settings from the `docker-relay-debug` table.
    ///
    /// A table that does not decode leaves debugging off.
    pub fn debug_settings(&self) -> DebugSettings {
        let table = self
            .config
            .get(DEBUG_KEY)
            .and_then(|table| DebugTable::deserialize(table).ok())
            .unwrap_or_default();

        let file = if table.file.is_empty() {
            DEFAULT_DEBUG_FILE.to_string()
        } else {
            table.file
        };

        DebugSettings {
            enabled: table.enabled,
            file: PathBuf::from(file),
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
