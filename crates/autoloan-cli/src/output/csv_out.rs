use serde_json::Value;
use std::io;

/// Result fields that hold the main row set, in priority order.
const ROW_KEYS: [&str; 2] = ["rows", "insurance_bands"];

/// Write output as CSV to stdout.
///
/// Row-shaped results (tenor comparison, rate sheet) become one record per
/// row; anything else becomes a two-column field/value listing.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => {
                match ROW_KEYS.iter().find_map(|k| result.get(*k).and_then(Value::as_array)) {
                    Some(rows) => write_array_csv(&mut wtr, rows),
                    None => write_fields(&mut wtr, result),
                }
            }
            _ => write_fields(&mut wtr, map),
        },
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_fields<W: io::Write>(wtr: &mut csv::Writer<W>, map: &serde_json::Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
    }
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
        return;
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);

    for map in arr.iter().filter_map(Value::as_object) {
        let row: Vec<String> = headers
            .iter()
            .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
            .collect();
        let _ = wtr.write_record(&row);
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr.iter().map(format_csv_value).collect::<Vec<_>>().join(";"),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(rows: &[Value]) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        write_array_csv(&mut wtr, rows);
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_rows_become_records() {
        let rows = vec![
            json!({"tenor_years": 1, "monthly_installment": "100"}),
            json!({"tenor_years": 2, "monthly_installment": "55"}),
        ];
        let out = render(&rows);
        let lines: Vec<&str> = out.lines().collect();
        // serde_json objects iterate in key order
        assert_eq!(lines[0], "monthly_installment,tenor_years");
        assert_eq!(lines[2], "55,2");
    }

    #[test]
    fn test_rate_arrays_join_with_semicolons() {
        assert_eq!(format_csv_value(&json!(["1.2", "1.45"])), "1.2;1.45");
        assert_eq!(format_csv_value(&Value::Null), "");
    }
}
