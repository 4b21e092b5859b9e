//! Attribute resolution with metadata fallback.
//!
//! [`resolve`] reads a named attribute from the record first. Only when the
//! attribute is unset (`None`, or a key the record does not have) does it ask
//! the [`MetadataStore`] for `(event.id, key)`. Defined falsy values such as
//! `""`, `0` or `false` are returned as they are.

use std::collections::HashMap;

use serde_json::Value;
use tracing::trace;

use crate::event::Event;

/// External key-value metadata attached to events.
pub trait MetadataStore {
    /// Look up a single scalar value. `None` when nothing is stored.
    fn lookup(&self, event_id: i64, key: &str) -> Option<Value>;
}

/// A store that never has anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetadata;

impl MetadataStore for NoMetadata {
    fn lookup(&self, _event_id: i64, _key: &str) -> Option<Value> {
        None
    }
}

/// HashMap-backed metadata, keyed by `(event_id, key)`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetadata {
    entries: HashMap<(i64, String), Value>,
}

impl InMemoryMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, event_id: i64, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert((event_id, key.into()), value.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MetadataStore for InMemoryMetadata {
    fn lookup(&self, event_id: i64, key: &str) -> Option<Value> {
        self.entries.get(&(event_id, key.to_string())).cloned()
    }
}

impl<F> MetadataStore for F
where
    F: Fn(i64, &str) -> Option<Value>,
{
    fn lookup(&self, event_id: i64, key: &str) -> Option<Value> {
        self(event_id, key)
    }
}

/// Resolve `key` on `event`, falling back to `store` when the attribute is unset.
///
/// Returns `None` when neither source has a value. A JSON `null` from the
/// store counts as absent. Events without an `id` have no metadata scope.
///
/// # Examples
///
/// ```
/// use event_interval::attribute::{resolve, InMemoryMetadata};
/// use event_interval::Event;
/// use serde_json::json;
///
/// let mut meta = InMemoryMetadata::new();
/// meta.insert(1, "location", "Room 4");
/// meta.insert(1, "title", "from metadata");
///
/// let event = Event { id: Some(1), title: Some(String::new()), ..Default::default() };
/// assert_eq!(resolve(&event, "location", &meta), Some(json!("Room 4")));
/// // A defined empty title is not replaced.
/// assert_eq!(resolve(&event, "title", &meta), Some(json!("")));
/// ```
pub fn resolve(event: &Event, key: &str, store: &dyn MetadataStore) -> Option<Value> {
    if let Some(value) = field_value(event, key) {
        return Some(value);
    }

    let id = event.id?;
    trace!(event_id = id, key, "attribute unset, consulting metadata");
    store.lookup(id, key).filter(|v| !v.is_null())
}

/// Truthiness of a resolved value. Absent is falsy.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !(s.is_empty() || s == "0"),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(_)) => true,
    }
}

/// The record's own value for `key`, if the record has that attribute and it is set.
fn field_value(event: &Event, key: &str) -> Option<Value> {
    fn text(v: &Option<String>) -> Option<Value> {
        v.as_ref().map(|s| Value::String(s.clone()))
    }

    match key {
        "id" => event.id.map(Value::from),
        "object_id" => event.object_id.map(Value::from),
        "object_type" => text(&event.object_type),
        "title" => text(&event.title),
        "content" => text(&event.content),
        "status" => text(&event.status),
        "start" => text(&event.start),
        "end" => text(&event.end),
        "start_tz" => text(&event.start_tz),
        "end_tz" => text(&event.end_tz),
        "all_day" => event.all_day.map(Value::Bool),
        "recurrence" => text(&event.recurrence),
        "recurrence_interval" => event.recurrence_interval.map(Value::from),
        "recurrence_count" => event.recurrence_count.map(Value::from),
        "recurrence_end" => text(&event.recurrence_end),
        "recurrence_end_tz" => text(&event.recurrence_end_tz),
        _ => None,
    }
}
