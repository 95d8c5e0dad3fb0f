use serde_json::Value;
use std::io::{self, Read};

use equity_val_core::parse_document;

/// Snapshot piped on stdin, or `None` when stdin is an interactive terminal.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    read_document(io::stdin().lock())
}

/// Blank input means no snapshot was piped. Anything else must parse,
/// and a parse failure is rejected input.
fn read_document<R: Read>(mut reader: R) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let mut buffer = String::new();
    reader
        .read_to_string(&mut buffer)
        .map_err(|e| format!("Failed to read stdin: {e}"))?;

    match buffer.trim() {
        "" => Ok(None),
        text => Ok(Some(parse_document(text)?)),
    }
}
