//! JSON output on stdout and stderr

use claude_switch_core::SwitchError;
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Serialize a report and put `"success": true` in front of its fields
///
/// # Errors
/// Returns an error if the report does not serialize
pub fn success<T: Serialize>(report: &T) -> anyhow::Result<Value> {
    let mut out = Map::new();
    out.insert("success".to_string(), Value::Bool(true));
    match serde_json::to_value(report)? {
        Value::Object(fields) => out.extend(fields),
        Value::Null => {}
        other => {
            out.insert("result".to_string(), other);
        }
    }
    Ok(Value::Object(out))
}

pub fn print_success(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => print_error(&e.into()),
    }
}

/// Write `{"error", "code"}` to stderr
pub fn print_error(error: &anyhow::Error) {
    let (message, code) = match error.downcast_ref::<SwitchError>() {
        Some(e) => (e.to_string(), e.code()),
        None => (format!("{error:#}"), "ERROR"),
    };
    let payload = json!({ "error": message, "code": code });
    eprintln!("{payload}");
}
