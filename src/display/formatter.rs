use crate::docstore::{DocumentData, DocumentSnapshot, QuerySnapshot};
use serde_json::Value;

/// Compact one-line rendering of document data with keys sorted
pub fn format_document(data: &DocumentData) -> String {
    let mut keys: Vec<&String> = data.keys().collect();
    keys.sort();
    let fields: Vec<String> = keys
        .into_iter()
        .map(|key| format!("{}: {}", key, format_value(&data[key.as_str()])))
        .collect();
    format!("{{{}}}", fields.join(", "))
}

/// Scalars without JSON quoting noise, containers as compact JSON
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Object(map) => format_document(map),
        other => other.to_string(),
    }
}

/// `path => data` or `path => <absent>`
pub fn format_snapshot(snapshot: &DocumentSnapshot) -> String {
    match snapshot.data() {
        Some(data) => format!("{} => {}", snapshot.path(), format_document(data)),
        None => format!("{} => <absent>", snapshot.path()),
    }
}

/// Multi-line rendering of a collection snapshot
pub fn format_query(snapshot: &QuerySnapshot) -> String {
    if snapshot.is_empty() {
        return format!("{}: <empty>", snapshot.collection());
    }
    snapshot
        .docs()
        .iter()
        .map(format_snapshot)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Status line for a walkthrough check
pub fn format_check(passed: bool, label: &str) -> String {
    format!("[{}] {}", if passed { "PASS" } else { "FAIL" }, label)
}
