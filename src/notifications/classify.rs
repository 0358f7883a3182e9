//! Classification of push-channel message bodies.

use serde_json::Value;

/// Field paths checked, in order, for an event identifier in a JSON envelope.
const EVENT_PATHS: [&[&str]; 9] = [
    &["event"],
    &["type"],
    &["eventType"],
    &["action"],
    &["name"],
    &["payload", "event"],
    &["payload", "type"],
    &["data", "event"],
    &["data", "type"],
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Added,
    Updated,
    Deleted,
    Unrecognized,
}

impl EventKind {
    /// Maps conventional event names (`ADD`, `USER_DELETED`, `updated`, ...)
    /// to a kind.
    pub fn from_name(name: &str) -> Self {
        let normalized = name.trim().to_ascii_uppercase().replace('-', "_");
        let verb = ["USER_", "CUSTOMER_", "RECORD_"]
            .iter()
            .find_map(|prefix| normalized.strip_prefix(prefix))
            .unwrap_or(normalized.as_str());

        match verb {
            "ADD" | "ADDED" | "CREATE" | "CREATED" | "NEW" => EventKind::Added,
            "EDIT" | "EDITED" | "UPDATE" | "UPDATED" | "SAVE" | "SAVED" => EventKind::Updated,
            "DELETE" | "DELETED" | "REMOVE" | "REMOVED" => EventKind::Deleted,
            _ => EventKind::Unrecognized,
        }
    }
}

/// A message received on the subscribed topic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Event identifier extracted from the body, if any.
    pub name: Option<String>,
    pub kind: EventKind,
}

impl ChangeEvent {
    pub fn classify(body: &str) -> Self {
        let name = extract_event_name(body);
        let kind = name
            .as_deref()
            .map(EventKind::from_name)
            .unwrap_or(EventKind::Unrecognized);
        Self { name, kind }
    }

    pub fn is_recognized(&self) -> bool {
        self.kind != EventKind::Unrecognized
    }
}

/// Extracts the event identifier from a message body.
///
/// JSON strings are the identifier themselves; JSON objects are searched
/// along [`EVENT_PATHS`]. Bodies that are not JSON are used verbatim once
/// trimmed.
pub fn extract_event_name(body: &str) -> Option<String> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::String(name)) => non_empty(&name),
        Ok(value) => EVENT_PATHS.iter().find_map(|path| lookup(&value, path)),
        Err(_) => non_empty(body),
    }
}

fn lookup(value: &Value, path: &[&str]) -> Option<String> {
    let mut current = value;
    for key in path {
        current = current.get(*key)?;
    }
    current.as_str().and_then(non_empty)
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
