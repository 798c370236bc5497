use serde_json::Value;
use std::io;

use super::{result_of, scalar_text, ROW_SECTIONS};

/// Write output as CSV to stdout: the first list of records in the result
/// (schedule rows, scenario summaries, per-column results), otherwise
/// field/value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());
    let _ = write_csv(&mut wtr, result_of(value));
    let _ = wtr.flush();
}

fn write_csv<W: io::Write>(wtr: &mut csv::Writer<W>, result: &Value) -> csv::Result<()> {
    match result {
        Value::Array(records) => write_records(wtr, records),
        Value::Object(map) => {
            let section = ROW_SECTIONS
                .iter()
                .find_map(|s| map.get(*s).and_then(Value::as_array));
            match section {
                Some(records) => write_records(wtr, records),
                None => {
                    wtr.write_record(["field", "value"])?;
                    for (key, val) in map {
                        if let Some(text) = scalar_text(val) {
                            wtr.write_record([key.as_str(), text.as_str()])?;
                        }
                    }
                    Ok(())
                }
            }
        }
        other => wtr.write_record([scalar_text(other).unwrap_or_else(|| other.to_string())]),
    }
}

fn write_records<W: io::Write>(wtr: &mut csv::Writer<W>, records: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = records.first() else {
        for item in records {
            wtr.write_record([scalar_text(item).unwrap_or_else(|| item.to_string())])?;
        }
        return Ok(());
    };

    let headers: Vec<&str> = first
        .iter()
        .filter(|(_, v)| scalar_text(v).is_some())
        .map(|(k, _)| k.as_str())
        .collect();
    wtr.write_record(&headers)?;
    for item in records {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).and_then(scalar_text).unwrap_or_default())
                .collect();
            wtr.write_record(&row)?;
        }
    }
    Ok(())
}
