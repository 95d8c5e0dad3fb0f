use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::{flatten, result_section};

/// Format output as a field/value table using the tabled crate.
pub fn print_table(value: &Value) {
    println!("{}", build_table(result_section(value)));

    if let Some(envelope) = value.as_object() {
        if let Some(Value::Array(warnings)) = envelope.get("warnings") {
            if !warnings.is_empty() {
                println!("\nWarnings:");
                for w in warnings {
                    if let Value::String(s) = w {
                        println!("  - {}", s);
                    }
                }
            }
        }

        if let Some(Value::String(meth)) = envelope.get("methodology") {
            println!("\nMethodology: {}", meth);
        }
    }
}

fn build_table(result: &Value) -> Table {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in flatten(result) {
        builder.push_record([key, val]);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_lists_flattened_fields() {
        let rendered = build_table(&json!({
            "rating": {"tier": "avoid"},
            "enterprise": {"ev_ebitda": {"value": "0.90"}}
        }))
        .to_string();
        assert!(rendered.contains("rating.tier"));
        assert!(rendered.contains("avoid"));
        assert!(rendered.contains("enterprise.ev_ebitda"));
        assert!(rendered.contains("0.90"));
    }
}
