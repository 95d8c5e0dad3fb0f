use serde_json::Value;
use std::io;

use super::{flatten, result_section};

/// Write output as two-column CSV (field, value) to stdout.
pub fn print_csv(value: &Value) {
    if let Err(e) = write_csv(io::stdout().lock(), result_section(value)) {
        tracing::warn!(error = %e, "failed to write CSV output");
    }
}

fn write_csv<W: io::Write>(out: W, result: &Value) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(["field", "value"])?;
    for (key, val) in flatten(result) {
        wtr.write_record([key.as_str(), val.as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct ClosedPipe;

    impl io::Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn test_csv_rows() {
        let mut buf = Vec::new();
        write_csv(
            &mut buf,
            &json!({"liquidation": {"discount_pct": {"value": "-37.50"}, "position": "discount"}}),
        )
        .unwrap();
        let data = String::from_utf8(buf).unwrap();
        assert_eq!(
            data,
            "field,value\nliquidation.discount_pct,-37.50\nliquidation.position,discount\n"
        );
    }

    #[test]
    fn test_write_failure_is_reported() {
        let result = write_csv(ClosedPipe, &json!({"rating": {"tier": "hold"}}));
        assert!(result.is_err());
    }
}
