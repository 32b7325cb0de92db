use serde_json::Value;

/// Convert arbitrary JSON values into sanitized strings for display.
pub fn value_to_string(value: Value) -> String {
    let raw = match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    };
    sanitize(raw)
}

fn sanitize(s: String) -> String {
    s.chars().filter(|c| !c.is_control()).collect()
}

/// Extract the human-readable `detail` from a backend error payload.
///
/// The backend sends either `{"detail": "message"}` or, for request validation
/// errors, `{"detail": [{"loc": [...], "msg": "...", "type": "..."}]}`. In the
/// latter case the individual `msg` entries are joined.
pub fn detail_message(body: &Value) -> Option<String> {
    let detail = body.get("detail")?;
    let message = match detail {
        Value::Null => return None,
        Value::Array(items) => items
            .iter()
            .map(|item| match item.get("msg") {
                Some(msg) => value_to_string(msg.clone()),
                None => value_to_string(item.clone()),
            })
            .filter(|m| !m.is_empty())
            .collect::<Vec<_>>()
            .join("; "),
        other => value_to_string(other.clone()),
    };
    let message = message.trim().to_string();
    if message.is_empty() {
        None
    } else {
        Some(message)
    }
}
