//! Debug trace of the last relayed command
//!
//! When `docker-relay-debug.enabled` is set, each invocation overwrites the
//! debug file with the working directory, the command vector, the record and
//! its docker options, separated by `---` lines. Writing is best effort.

use relay_record::ConfigRecord;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::config::DebugSettings;

/// Write the trace if enabled; any failure is ignored.
pub fn record_invocation(
    settings: &DebugSettings,
    cwd: Option<&str>,
    args: &[String],
    record: &ConfigRecord,
) {
    if settings.enabled {
        let _ = write_trace(&settings.file, cwd, args, record);
    }
}

fn write_trace(path: &Path, cwd: Option<&str>, args: &[String], record: &ConfigRecord) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);

    if let Some(cwd) = cwd {
        writeln!(out, "{}", cwd)?;
    }
    writeln!(out, "---")?;
    writeln!(out, "{}", serde_json::to_string(args)?)?;
    writeln!(out, "---")?;
    writeln!(out, "{}", serde_json::to_string_pretty(record)?)?;
    writeln!(out, "---")?;
    writeln!(out, "{}", serde_json::to_string(&record.options())?)?;

    out.flush()
}
