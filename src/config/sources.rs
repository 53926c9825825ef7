//! Configuration file discovery and parsing with provenance
//!
//! Files are named `.docker-relay.<ext>` and may be JSON, TOML or YAML.
//! Each parsed layer is converted to a JSON value with lower-cased keys so
//! every format merges the same way.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use super::merge::lowercase_keys;
use crate::error::{RelayError, Result};

/// Base name of configuration files
pub const CONFIG_BASENAME: &str = ".docker-relay";

/// Home directory: the first file found in this order is used
const HOME_EXTENSIONS: &[&str] = &["json", "toml", "yaml", "yml"];

/// Working directory: every file found is merged, in this order
const LOCAL_EXTENSIONS: &[&str] = &["json", "yaml", "yml", "toml"];

/// Where a configuration layer came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Home,
    Local,
    Explicit,
}

/// A contributing config file with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    pub path: String,

    /// SHA-256 digest of the raw file bytes
    pub digest: String,
}

/// Supported file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
    Yaml,
}

impl ConfigFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(ConfigFormat::Json),
            "toml" => Some(ConfigFormat::Toml),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            _ => None,
        }
    }
}

/// Find the configuration files for a home and a working directory, in
/// merge order.
pub fn discover(home: Option<&Path>, cwd: Option<&Path>) -> Vec<(ConfigOrigin, PathBuf)> {
    let mut found = Vec::new();

    if let Some(home) = home {
        let first = HOME_EXTENSIONS
            .iter()
            .map(|ext| config_file(home, ext))
            .find(|path| path.is_file());
        if let Some(path) = first {
            found.push((ConfigOrigin::Home, path));
        }
    }

    if let Some(cwd) = cwd {
        for ext in LOCAL_EXTENSIONS {
            let path = config_file(cwd, ext);
            if path.is_file() {
                found.push((ConfigOrigin::Local, path));
            }
        }
    }

    found
}

fn config_file(dir: &Path, ext: &str) -> PathBuf {
    dir.join(format!("{}.{}", CONFIG_BASENAME, ext))
}

/// Load and parse one file, returning the value and the digest of its bytes
pub fn load_file(path: &Path) -> Result<(Value, String)> {
    let format = ConfigFormat::from_path(path).ok_or_else(|| RelayError::ConfigurationParse {
        path: path.to_path_buf(),
        message: "unsupported file extension (expected json, toml, yaml or yml)".to_string(),
    })?;

    let bytes = fs::read(path)?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hex::encode(hasher.finalize());

    let contents = String::from_utf8(bytes).map_err(|e| RelayError::ConfigurationParse {
        path: path.to_path_buf(),
        message: format!("Invalid UTF-8: {}", e),
    })?;

    let value = parse_str(&contents, format).map_err(|message| RelayError::ConfigurationParse {
        path: path.to_path_buf(),
        message,
    })?;

    Ok((value, digest))
}

/// Parse file contents into a JSON value with lower-cased keys
pub fn parse_str(contents: &str, format: ConfigFormat) -> std::result::Result<Value, String> {
    let value = match format {
        ConfigFormat::Json => {
            serde_json::from_str(contents).map_err(|e| format!("JSON parse error: {}", e))?
        }
        ConfigFormat::Toml => {
            let table: toml::Value =
                toml::from_str(contents).map_err(|e| format!("TOML parse error: {}", e))?;
            toml_to_json(table)
        }
        ConfigFormat::Yaml => {
            // An empty YAML document is a valid, empty layer
            if contents.trim().is_empty() {
                Value::Object(Default::default())
            } else {
                serde_yaml::from_str(contents).map_err(|e| format!("YAML parse error: {}", e))?
            }
        }
    };

    Ok(lowercase_keys(value))
}

/// Convert TOML Value to JSON Value
fn toml_to_json(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.json")), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_path(Path::new("a.TOML")), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_path(Path::new("a.yml")), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_path(Path::new("a.ini")), None);
        assert_eq!(ConfigFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_parse_formats_agree() {
        let json = parse_str(r#"{"PHP": {"image": "php", "cmd": ["php"]}}"#, ConfigFormat::Json)
            .unwrap();
        let toml = parse_str("[PHP]\nimage = \"php\"\ncmd = [\"php\"]\n", ConfigFormat::Toml)
            .unwrap();
        let yaml = parse_str("PHP:\n  image: php\n  cmd:\n    - php\n", ConfigFormat::Yaml)
            .unwrap();

        assert_eq!(json, toml);
        assert_eq!(json, yaml);
        assert_eq!(json["php"]["image"], "php");
    }

    #[test]
    fn test_empty_yaml_is_empty_table() {
        let value = parse_str("\n", ConfigFormat::Yaml).unwrap();
        assert_eq!(value, Value::Object(Default::default()));
    }

    #[test]
    fn test_parse_error_message() {
        let err = parse_str("[php\n", ConfigFormat::Toml).unwrap_err();
        assert!(err.starts_with("TOML parse error"));
    }

    #[test]
    fn test_discover_home_takes_first_only() {
        let home = TempDir::new().unwrap();
        fs::write(home.path().join(".docker-relay.toml"), "").unwrap();
        fs::write(home.path().join(".docker-relay.yml"), "").unwrap();

        let found = discover(Some(home.path()), None);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, ConfigOrigin::Home);
        assert!(found[0].1.ends_with(".docker-relay.toml"));
    }

    #[test]
    fn test_discover_local_takes_all_in_order() {
        let cwd = TempDir::new().unwrap();
        fs::write(cwd.path().join(".docker-relay.toml"), "").unwrap();
        fs::write(cwd.path().join(".docker-relay.json"), "{}").unwrap();
        fs::write(cwd.path().join(".docker-relay.yaml"), "").unwrap();

        let found = discover(None, Some(cwd.path()));
        let names: Vec<String> = found
            .iter()
            .map(|(_, p)| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(
            names,
            vec![".docker-relay.json", ".docker-relay.yaml", ".docker-relay.toml"]
        );
        assert!(found.iter().all(|(origin, _)| *origin == ConfigOrigin::Local));
    }

    #[test]
    fn test_load_file_digest_and_error_path() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join(".docker-relay.json");
        fs::write(&good, "{}").unwrap();

        let (value, digest) = load_file(&good).unwrap();
        assert!(value.as_object().unwrap().is_empty());
        // sha256("{}")
        assert_eq!(
            digest,
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );

        let bad = dir.path().join(".docker-relay.yaml");
        fs::write(&bad, "php: [unclosed").unwrap();
        match load_file(&bad).unwrap_err() {
            RelayError::ConfigurationParse { path, .. } => assert_eq!(path, bad),
            other => panic!("unexpected error: {}", other),
        }
    }
}
