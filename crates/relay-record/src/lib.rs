//! Per-command relay record.
//!
//! A [`ConfigRecord`] is decoded from one program's sub-configuration and
//! carries everything needed to build a `docker exec`/`docker run` command:
//! the image or explicit exec override, the in-container command, and the
//! docker options that become command-line flags.
//!
//! The crate is pure: it never reads the process environment, the current
//! directory, or any file. Callers pass those in.

pub mod de;
mod options;
mod record;
pub mod substitute;

pub use options::{DockerOptions, OptionField, OptionValue, OPTION_TABLE};
pub use record::{ConfigRecord, RecordError};
pub use substitute::{replace_matches, Expander, ENV_PATTERN, PWD_PATTERN};
