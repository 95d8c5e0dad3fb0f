use serde_json::Value;

use super::{flatten, result_section};

/// Key answers in priority order. The first one present is printed.
const PRIORITY_KEYS: [&str; 3] = [
    "rating.tier",
    "dcf.middle.implied_price",
    "enterprise.enterprise_value",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(value));
}

fn minimal_line(value: &Value) -> String {
    let rows = flatten(result_section(value));

    for key in PRIORITY_KEYS {
        if let Some((_, val)) = rows.iter().find(|(k, _)| k == key) {
            return val.clone();
        }
    }

    // Fall back to first field
    match rows.first() {
        Some((key, val)) if !key.is_empty() => format!("{}: {}", key, val),
        Some((_, val)) => val.clone(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rating_tier_wins() {
        let envelope = json!({
            "result": {
                "dcf": [{"scenario": "middle", "implied_price": "789"}],
                "rating": {"tier": "avoid"}
            }
        });
        assert_eq!(minimal_line(&envelope), "avoid");
    }

    #[test]
    fn test_falls_back_to_first_field() {
        assert_eq!(
            minimal_line(&json!({"max_dcf_years": 50})),
            "max_dcf_years: 50"
        );
    }
}
