use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{scalar_text, ROW_SECTIONS};

/// Format output as tables: scalar result fields first, then one table per
/// list of records (scenario summaries, schedule rows, per-column results).
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => {
                print_result(result);
                print_envelope_notes(map);
            }
            None => print_fields(map),
        },
        Value::Array(arr) => print_records(arr),
        _ => println!("{}", value),
    }
}

fn print_result(result: &Value) {
    match result {
        Value::Object(map) => {
            print_fields(map);
            for section in ROW_SECTIONS {
                if let Some(Value::Array(records)) = map.get(section) {
                    println!("\n{}:", section);
                    print_records(records);
                }
            }
        }
        Value::Array(records) => print_records(records),
        other => println!("{}", other),
    }
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// Two-column table of the scalar fields; nested values are left to
/// `print_records` or omitted.
fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut any = false;
    for (key, val) in map {
        if let Some(text) = scalar_text(val) {
            builder.push_record([key.clone(), text]);
            any = true;
        }
    }
    if any {
        println!("{}", Table::from(builder));
    }
}

fn print_records(records: &[Value]) {
    let Some(Value::Object(first)) = records.first() else {
        if records.is_empty() {
            println!("(empty)");
        }
        for item in records {
            println!("{}", scalar_text(item).unwrap_or_else(|| item.to_string()));
        }
        return;
    };

    // Only scalar columns; nested distributions and trajectories stay in JSON output.
    let headers: Vec<String> = first
        .iter()
        .filter(|(_, v)| scalar_text(v).is_some())
        .map(|(k, _)| k.clone())
        .collect();
    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for item in records {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h).and_then(scalar_text).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
    }
    println!("{}", Table::from(builder));
}
