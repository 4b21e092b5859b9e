//! The event record evaluated by the classifier.
//!
//! Records are loaded by an external store and are read-only here. Every
//! attribute that a loader may leave out is an `Option`: `None` means unset
//! (and is eligible for metadata fallback), while `Some("")`, `Some(0)` and
//! `Some(false)` are defined values.

use serde::{Deserialize, Serialize};

/// The zero datetime that denotes an unset start, end or recurrence end.
pub const EMPTY_DATE: &str = "0000-00-00 00:00:00";

/// A calendar event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    pub id: Option<i64>,
    /// Identifier of the subject this event is attached to.
    pub object_id: Option<i64>,
    /// Kind of the subject this event is attached to (e.g. `"group"`).
    pub object_type: Option<String>,

    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<String>,

    /// Start as `Y-m-d H:i:s` wall-clock time in `start_tz`.
    pub start: Option<String>,
    /// End as `Y-m-d H:i:s` wall-clock time in `end_tz`.
    pub end: Option<String>,
    /// IANA name for `start`. Empty or `None` means floating.
    pub start_tz: Option<String>,
    /// IANA name for `end`. Empty or `None` means floating.
    pub end_tz: Option<String>,
    /// Explicit all-day flag. `true` wins over the clock values.
    pub all_day: Option<bool>,

    // Recurrence descriptor, carried as data only
    pub recurrence: Option<String>,
    pub recurrence_interval: Option<u32>,
    pub recurrence_count: Option<u32>,
    pub recurrence_end: Option<String>,
    pub recurrence_end_tz: Option<String>,
}

impl Event {
    /// Create an event with the given raw start and end values.
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Event {
            start: Some(start.into()),
            end: Some(end.into()),
            ..Default::default()
        }
    }

    /// Pin the start and end to IANA timezones (empty string = floating).
    pub fn with_zones(mut self, start_tz: impl Into<String>, end_tz: impl Into<String>) -> Self {
        self.start_tz = Some(start_tz.into());
        self.end_tz = Some(end_tz.into());
        self
    }

    pub fn with_all_day(mut self, all_day: bool) -> Self {
        self.all_day = Some(all_day);
        self
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// The start zone, or `None` when the start is floating.
    pub fn start_zone(&self) -> Option<&str> {
        non_empty(self.start_tz.as_deref())
    }

    /// The end zone, or `None` when the end is floating.
    pub fn end_zone(&self) -> Option<&str> {
        non_empty(self.end_tz.as_deref())
    }

    pub fn recurrence_end_zone(&self) -> Option<&str> {
        non_empty(self.recurrence_end_tz.as_deref())
    }

    /// Whether the record carries a recurrence descriptor.
    ///
    /// This only inspects the stored data; occurrences are expanded elsewhere.
    pub fn is_recurring(&self) -> bool {
        match self.recurrence.as_deref().map(str::trim) {
            None | Some("") => false,
            Some(rule) => !rule.eq_ignore_ascii_case("none"),
        }
    }
}

/// Treat blank strings as absent.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_accessors_treat_blank_as_floating() {
        let event = Event::new("2024-03-10 09:00:00", "2024-03-10 10:00:00")
            .with_zones("America/New_York", " ");
        assert_eq!(event.start_zone(), Some("America/New_York"));
        assert_eq!(event.end_zone(), None);
        assert_eq!(Event::default().start_zone(), None);
    }

    #[test]
    fn test_is_recurring() {
        let mut event = Event::default();
        assert!(!event.is_recurring());

        event.recurrence = Some("none".to_string());
        assert!(!event.is_recurring());

        event.recurrence = Some(String::new());
        assert!(!event.is_recurring());

        event.recurrence = Some("weekly".to_string());
        assert!(event.is_recurring());
    }

    #[test]
    fn test_deserialize_partial_record() {
        let event: Event = serde_json::from_str(
            r#"{"id": 7, "start": "2024-03-10 09:00:00", "start_tz": "Europe/Paris"}"#,
        )
        .unwrap();
        assert_eq!(event.id, Some(7));
        assert_eq!(event.start_zone(), Some("Europe/Paris"));
        assert_eq!(event.end, None);
        assert_eq!(event.all_day, None);
    }

    #[test]
    fn test_unset_differs_from_falsy() {
        let unset = Event::default();
        let falsy = Event {
            title: Some(String::new()),
            all_day: Some(false),
            ..Default::default()
        };
        assert_ne!(unset, falsy);
    }
}
