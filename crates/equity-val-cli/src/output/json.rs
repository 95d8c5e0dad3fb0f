use serde_json::Value;
use std::io::{self, Write};

/// Pretty-print the full result envelope to stdout.
pub fn print_json(value: &Value) {
    if let Err(e) = write_json(io::stdout().lock(), value) {
        tracing::warn!(error = %e, "failed to write JSON output");
    }
}

/// The envelope keeps its nesting; per-year projections are only
/// available in this format.
fn write_json<W: Write>(mut out: W, value: &Value) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    out.flush()
}
