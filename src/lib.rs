//! docker-relay - run commands inside docker under their own names
//!
//! Symlink a program name (`php`, `composer`, `node`...) to this binary and
//! it relays the call into the matching docker-compose container when one is
//! running, or into a fresh `docker run` of the configured image when not.

pub mod config;
pub mod debug_log;
pub mod error;
pub mod exec;
pub mod resolver;
pub mod shim;
pub mod synth;

pub use config::{DebugSettings, LoadOptions, RelayConfig};
pub use error::{RelayError, Result};
pub use relay_record::{ConfigRecord, DockerOptions};
pub use resolver::{ComposeResolver, ContainerResolver, Resolution};
pub use synth::{Invocation, Mode, Synthesis, Synthesizer};
