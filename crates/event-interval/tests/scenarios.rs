//! End-to-end scenarios through the public API.

use event_interval::{
    CalendarUnit, Evaluator, EvaluatorConfig, Event, InMemoryMetadata, IntersectMode,
    ZonedInstant, EMPTY_DATE,
};

fn new_york_meeting() -> Event {
    Event::new("2024-03-10 09:00:00", "2024-03-10 10:00:00")
        .with_zones("America/New_York", "America/New_York")
        .with_all_day(false)
}

fn window(start: &str, end: &str) -> (ZonedInstant, ZonedInstant) {
    (
        ZonedInstant::parse(start, None).unwrap(),
        ZonedInstant::parse(end, None).unwrap(),
    )
}

#[test]
fn meeting_overlaps_utc_window() {
    let evaluator = Evaluator::new(EvaluatorConfig::default()).unwrap();
    let (start, end) = window("2024-03-10 13:30:00Z", "2024-03-10 14:30:00Z");
    let result = evaluator
        .intersects(&new_york_meeting(), Some(&start), Some(&end), IntersectMode::Day)
        .unwrap();
    assert!(result);
}

#[test]
fn meeting_misses_next_day_window() {
    let evaluator = Evaluator::new(EvaluatorConfig::default()).unwrap();
    let (start, end) = window("2024-03-11 00:00:00Z", "2024-03-11 01:00:00Z");
    let result = evaluator
        .intersects(&new_york_meeting(), Some(&start), Some(&end), IntersectMode::Day)
        .unwrap();
    assert!(!result);
}

#[test]
fn late_evening_event_is_multi_day() {
    let evaluator = Evaluator::default();
    let event = Event::new("2024-03-10 23:30:00", "2024-03-11 00:30:00");
    assert!(evaluator.is_multi(&event, CalendarUnit::Day).unwrap());
    assert!(evaluator.is_multi(&event, "d".parse().unwrap()).unwrap());
}

#[test]
fn record_loaded_from_json_with_metadata_flag() {
    let config = EvaluatorConfig::from_json(
        r#"{"floating_time": false, "default_timezone": "Europe/Berlin", "locale": "fr_FR"}"#,
    )
    .unwrap();

    let mut metadata = InMemoryMetadata::new();
    metadata.insert(12, "all_day", true);
    metadata.insert(12, "location", "Salle 3");

    let evaluator = Evaluator::new(config).unwrap().with_metadata(metadata);

    let event: Event = serde_json::from_str(
        r#"{
            "id": 12,
            "object_id": 4,
            "object_type": "group",
            "title": "Conseil",
            "start": "2024-05-01 00:00:00",
            "end": "2024-05-01 12:00:00",
            "start_tz": "Europe/Paris",
            "end_tz": "Europe/Paris",
            "recurrence": "none"
        }"#,
    )
    .unwrap();

    assert!(evaluator.is_all_day(&event).unwrap());
    assert!(!event.is_recurring());
    assert_eq!(
        evaluator.resolve(&event, "location"),
        Some(serde_json::json!("Salle 3"))
    );
    assert_eq!(
        evaluator.start_date(&event, "l j F", None).unwrap(),
        "mercredi 1 mai"
    );

    // All-day ignores the Paris zone: 00:00-12:00 is read in UTC, where it
    // reaches 11:00. Read as Paris time it would end at 10:00 UTC.
    let (start, end) = window("2024-05-01 11:00:00Z", "2024-05-01 11:30:00Z");
    assert!(evaluator
        .intersects(&event, Some(&start), Some(&end), IntersectMode::Week)
        .unwrap());
}

#[test]
fn hooks_can_hide_cancelled_events() {
    let mut evaluator = Evaluator::default();
    evaluator.on_intersect(|result, event, _| {
        result && event.status.as_deref() != Some("cancelled")
    });

    let mut event = new_york_meeting();
    event.status = Some("cancelled".to_string());

    let (start, end) = window("2024-03-10 13:30:00Z", "2024-03-10 14:30:00Z");
    assert!(!evaluator
        .intersects(&event, Some(&start), Some(&end), IntersectMode::Day)
        .unwrap());
}

#[test]
fn unset_dates_are_empty() {
    let evaluator = Evaluator::default();
    let event = Event::default();
    assert!(evaluator.is_empty_date(event.start.as_deref()));
    assert!(evaluator.is_empty_date(Some(EMPTY_DATE)));
    assert!(!evaluator.is_empty_date(Some("2024-03-10 09:00:00")));
}
