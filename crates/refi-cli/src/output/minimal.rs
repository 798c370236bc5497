use serde_json::Value;

use super::{result_of, scalar_text};

/// Key answer fields, most specific first.
const PRIORITY_KEYS: [&str; 9] = [
    "best_scenario",
    "required_contribution",
    "required_lump_sum",
    "final_value",
    "monthly_payment",
    "success_probability",
    "geometric_mean",
    "payoff_month",
    "total_interest",
];

/// Print just the key answer: one line per item for list results.
pub fn print_minimal(value: &Value) {
    match result_of(value) {
        Value::Array(items) => {
            for item in items {
                let label = item
                    .get("column")
                    .or_else(|| item.get("name"))
                    .and_then(scalar_text);
                match (label, key_answer(item)) {
                    (Some(label), Some(answer)) => println!("{}: {}", label, answer),
                    (None, Some(answer)) => println!("{}", answer),
                    _ => println!("{}", item),
                }
            }
        }
        other => match key_answer(other) {
            Some(answer) => println!("{}", answer),
            None => println!("{}", other),
        },
    }
}

fn key_answer(value: &Value) -> Option<String> {
    let map = value.as_object()?;
    PRIORITY_KEYS
        .iter()
        .filter_map(|k| map.get(*k))
        .find(|v| !v.is_null())
        .and_then(scalar_text)
        .or_else(|| {
            map.iter()
                .find_map(|(k, v)| scalar_text(v).map(|s| format!("{}: {}", k, s)))
        })
}
