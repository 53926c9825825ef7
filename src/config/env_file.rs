//! `.env` file support
//!
//! Variables from a `.env` file in the working directory are visible to
//! `${VAR}` references in the configuration and are handed to the relayed
//! process. They never override a variable that is already set.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{RelayError, Result};

/// Name of the file read from the working directory
pub const ENV_FILE_NAME: &str = ".env";

/// Variables read from a `.env` file, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    pub vars: Vec<(String, String)>,
}

impl EnvFile {
    /// Read a `.env` file. A missing file yields no variables.
    pub fn load(path: &Path) -> Result<Self> {
        let iter = match dotenvy::from_path_iter(path) {
            Ok(iter) => iter,
            Err(e) if e.not_found() => return Ok(Self::default()),
            Err(e) => return Err(parse_error(path, e)),
        };

        let mut vars = Vec::new();
        for item in iter {
            vars.push(item.map_err(|e| parse_error(path, e))?);
        }

        Ok(Self { vars })
    }

    /// Add the file's variables to `env` where not already set.
    ///
    /// Returns the variables that were added, for passing on to the child.
    pub fn apply(&self, env: &mut BTreeMap<String, String>) -> Vec<(String, String)> {
        let mut added = Vec::new();
        for (key, value) in &self.vars {
            if !env.contains_key(key) {
                env.insert(key.clone(), value.clone());
                added.push((key.clone(), value.clone()));
            }
        }
        added
    }
}

fn parse_error(path: &Path, err: dotenvy::Error) -> RelayError {
    RelayError::ConfigurationParse {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let env = EnvFile::load(&dir.path().join(ENV_FILE_NAME)).unwrap();
        assert!(env.vars.is_empty());
    }

    #[test]
    fn test_load_in_file_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(ENV_FILE_NAME);
        fs::write(&path, "# comment\nDB_HOST=db\nAPP_ENV=\"dev\"\n").unwrap();

        let env = EnvFile::load(&path).unwrap();

        assert_eq!(
            env.vars,
            vec![
                ("DB_HOST".to_string(), "db".to_string()),
                ("APP_ENV".to_string(), "dev".to_string()),
            ]
        );
    }

    #[test]
    fn test_apply_does_not_override() {
        let file = EnvFile {
            vars: vec![
                ("HOME".to_string(), "/elsewhere".to_string()),
                ("DB_HOST".to_string(), "db".to_string()),
            ],
        };
        let mut env = BTreeMap::from([("HOME".to_string(), "/home/me".to_string())]);

        let added = file.apply(&mut env);

        assert_eq!(env["HOME"], "/home/me");
        assert_eq!(env["DB_HOST"], "db");
        assert_eq!(added, vec![("DB_HOST".to_string(), "db".to_string())]);
    }
}
