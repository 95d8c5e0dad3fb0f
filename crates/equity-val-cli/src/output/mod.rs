pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Flatten a nested document into dotted `(key, value)` rows.
///
/// DCF scenarios are keyed by scenario name (`dcf.middle.implied_price`),
/// metric sentinels collapse to a single cell, and per-year projections are
/// left to the JSON format.
pub fn flatten(value: &Value) -> Vec<(String, String)> {
    let mut rows = Vec::new();
    flatten_into("", value, &mut rows);
    rows
}

fn flatten_into(prefix: &str, value: &Value, rows: &mut Vec<(String, String)>) {
    if let Some(cell) = metric_cell(value) {
        rows.push((prefix.to_string(), cell));
        return;
    }

    match value {
        Value::Object(map) => {
            for (key, val) in map {
                if key == "projections" {
                    continue;
                }
                flatten_into(&join(prefix, key), val, rows);
            }
        }
        Value::Array(items) if items.iter().all(Value::is_object) && !items.is_empty() => {
            for (i, item) in items.iter().enumerate() {
                let label = item
                    .get("scenario")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| i.to_string());
                flatten_into(&join(prefix, &label), item, rows);
            }
        }
        _ => rows.push((prefix.to_string(), format_value(value))),
    }
}

/// `{"value": x}` prints as x, `{"not_applicable": reason}` as `n/a (reason)`.
fn metric_cell(value: &Value) -> Option<String> {
    let map = value.as_object()?;
    if map.len() != 1 {
        return None;
    }
    if let Some(v) = map.get("value") {
        return Some(format_value(v));
    }
    map.get("not_applicable")
        .map(|reason| format!("n/a ({})", format_value(reason)))
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// The `result` section of an envelope, or the value itself.
pub fn result_section(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_nested_result() {
        let doc = json!({
            "per_share": {
                "per_forecast": {"value": "13.16"},
                "per_actual": {"not_applicable": "Trailing EPS is not positive"}
            },
            "dcf": [
                {"scenario": "middle", "implied_price": "789", "projections": [{"year": 1}]}
            ],
            "rescaled_fields": ["net_cash"]
        });
        let mut rows = flatten(&doc);
        rows.sort();
        let expected: Vec<(String, String)> = [
            ("dcf.middle.implied_price", "789"),
            ("dcf.middle.scenario", "middle"),
            ("per_share.per_actual", "n/a (Trailing EPS is not positive)"),
            ("per_share.per_forecast", "13.16"),
            ("rescaled_fields", "net_cash"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(rows, expected);
    }

    #[test]
    fn test_result_section() {
        let envelope = json!({"result": {"a": 1}, "warnings": []});
        assert_eq!(result_section(&envelope), &json!({"a": 1}));
        let bare = json!({"a": 1});
        assert_eq!(result_section(&bare), &bare);
    }
}
