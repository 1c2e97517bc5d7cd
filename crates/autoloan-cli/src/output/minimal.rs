use serde_json::Value;

/// Key answer of each command, in priority order. A budget solution nests
/// its quote, so `dp_percent` is reached only when no upfront total is at
/// the top level.
const PRIORITY_KEYS: [&str; 5] = [
    "total_upfront_payment",
    "premium",
    "lowest_upfront_tenor",
    "dp_percent",
    "monthly_installment",
];

/// Print just the key answer value from the output.
///
/// Looks for well-known result fields in order of priority,
/// then falls back to the first field in the result object.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(value));
}

fn minimal_line(value: &Value) -> String {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        for key in PRIORITY_KEYS {
            if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
                return format_minimal(val);
            }
        }

        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, format_minimal(val));
        }
    }

    format_minimal(result_obj)
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
