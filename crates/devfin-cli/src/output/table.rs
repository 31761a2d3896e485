use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Format output as tables using the tabled crate.
///
/// Scalar fields go into a Field/Value table; arrays of objects (per-method
/// breakdowns, catalog rows) get a table of their own.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_object(map);
            }
        }
        Value::Array(arr) => {
            print_array_table(arr);
        }
        _ => {
            println!("{}", value);
        }
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res_map) => print_object(res_map),
        other => println!("{}", format_value(other)),
    }

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

fn print_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut nested: Vec<(&str, &[Value])> = Vec::new();
    for (key, val) in map {
        match val {
            Value::Array(arr) if arr.iter().any(Value::is_object) => {
                nested.push((key.as_str(), arr.as_slice()));
            }
            _ => builder.push_record([key.as_str(), &format_value(val)]),
        }
    }
    println!("{}", Table::from(builder));

    for (key, arr) in nested {
        println!("\n{}:", key);
        print_array_table(arr);
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(map) => format_object(map),
    }
}

/// Inline rendering for small nested objects such as the developer's position
/// or the equity multiplier (`{"status": "finite", "value": "2.955"}` -> `2.955`).
fn format_object(map: &Map<String, Value>) -> String {
    match (map.get("status"), map.get("value")) {
        (Some(_), Some(v)) => format_value(v),
        (Some(Value::String(status)), None) => status.replace('_', " "),
        _ => map
            .iter()
            .map(|(k, v)| format!("{}: {}", k, format_value(v)))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_multiplier_rendering() {
        assert_eq!(
            format_value(&json!({"status": "finite", "value": "2.955"})),
            "2.955"
        );
        assert_eq!(
            format_value(&json!({"status": "no_own_capital"})),
            "no own capital"
        );
        assert_eq!(format_value(&json!({"status": "unbounded"})), "unbounded");
    }

    #[test]
    fn test_nested_object_rendering() {
        let v = json!({"equity_fraction": "0.5", "investment": "250000"});
        assert_eq!(format_value(&v), "equity_fraction: 0.5, investment: 250000");
    }
}
