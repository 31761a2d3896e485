use serde_json::{Map, Value};
use std::io;

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout.
///
/// Scalar fields become `field,value` rows. Each array of objects follows as
/// its own block, separated by an empty record.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(stdout.lock());

    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => write_object(&mut wtr, result),
            _ => write_object(&mut wtr, map),
        },
        Value::Array(arr) => {
            write_array_csv(&mut wtr, arr);
        }
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_object(wtr: &mut StdoutWriter<'_>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    let mut nested = Vec::new();
    for (key, val) in map {
        match val {
            Value::Array(arr) if arr.iter().any(Value::is_object) => nested.push(arr),
            _ => {
                let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
            }
        }
    }
    for arr in nested {
        let _ = wtr.write_record([""]);
        write_array_csv(wtr, arr);
    }
}

fn write_array_csv(wtr: &mut StdoutWriter<'_>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Object(map) => match (map.get("status"), map.get("value")) {
            (Some(_), Some(v)) => format_csv_value(v),
            (Some(Value::String(status)), None) => status.replace('_', " "),
            _ => serde_json::to_string(value).unwrap_or_default(),
        },
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
