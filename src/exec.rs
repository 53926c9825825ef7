//! Binary lookup and process replacement
//!
//! The only place that executes anything. On Unix the relay process image is
//! replaced by the target; elsewhere the target runs as a child and its exit
//! code is passed through.

use std::path::{Path, PathBuf};
use std::process::{self, Command};

use crate::error::{RelayError, Result};

/// Find `name` on the process `PATH`.
///
/// Names containing a slash are checked as given, without searching.
pub fn find_binary(name: &str) -> Result<PathBuf> {
    if name.is_empty() {
        return Err(RelayError::BinaryNotFound(name.to_string()));
    }
    which::which(name).map_err(|_| RelayError::BinaryNotFound(name.to_string()))
}

/// Replace the current process with `binary`, passing `args[1..]` and
/// keeping `args[0]` as the program name. `extra_env` is added to the
/// inherited environment.
///
/// Only returns on failure.
pub fn replace_process(binary: &Path, args: &[String], extra_env: &[(String, String)]) -> Result<()> {
    let Some((arg0, rest)) = args.split_first() else {
        return Err(RelayError::BinaryNotFound(String::new()));
    };

    let mut command = Command::new(binary);
    command
        .args(rest)
        .envs(extra_env.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    #[cfg(unix)]
    let result = {
        use std::os::unix::process::CommandExt;
        let source = command.arg0(arg0).exec();
        Err(RelayError::Exec {
            binary: binary.to_path_buf(),
            source,
        })
    };

    #[cfg(not(unix))]
    let result = {
        let _ = arg0;
        match command.status() {
            Ok(status) => process::exit(status.code().unwrap_or(1)),
            Err(source) => Err(RelayError::Exec {
                binary: binary.to_path_buf(),
                source,
            }),
        }
    };

    result
}

/// Print an error the way every relay failure is reported and exit 1.
pub fn fail(err: &RelayError) -> ! {
    eprintln!("{}", err);
    process::exit(1);
}
