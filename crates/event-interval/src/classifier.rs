//! All-day detection, calendar-unit span checks and overlap tests.
//!
//! The [`Evaluator`] owns the configuration, the formatting and metadata
//! collaborators, and the override hook chains. It never mutates the events
//! it is given; every operation is a function of its inputs.
//!
//! # Effective timezone
//!
//! An overlap test reads the event's start and end in an *effective* zone:
//!
//! 1. By default, the zone of the matching query bound.
//! 2. For events that are not all-day, when the evaluator is not in floating
//!    mode, the event's own `start_tz` / `end_tz` replace the query zones
//!    wherever they are set.
//!
//! All-day events therefore cover the same calendar dates for every viewer.

use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono_tz::Tz;
use serde_json::Value;
use tracing::{debug, trace};

use crate::attribute::{is_truthy, resolve, MetadataStore, NoMetadata};
use crate::config::EvaluatorConfig;
use crate::error::IntervalError;
use crate::event::{non_empty, Event, EMPTY_DATE};
use crate::formatter::{ChronoFormatter, DateFormatter, DEFAULT_PATTERN};
use crate::hooks::{HookChain, IntersectQuery, LegacyIntersectQuery};
use crate::instant::{parse_zone, ZonedInstant};

// ── Calendar units and modes ────────────────────────────────────────────────

/// Granularity for [`Evaluator::is_multi`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CalendarUnit {
    Hour,
    #[default]
    Day,
    Week,
    Month,
    Year,
}

impl CalendarUnit {
    /// The format token compared by [`Evaluator::is_multi`].
    pub fn token(self) -> &'static str {
        match self {
            CalendarUnit::Hour => "H",
            CalendarUnit::Day => "d",
            CalendarUnit::Week => "W",
            CalendarUnit::Month => "m",
            CalendarUnit::Year => "Y",
        }
    }
}

impl FromStr for CalendarUnit {
    type Err = IntervalError;

    /// Accepts a unit name (`"day"`, case-insensitive) or its token (`"d"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let unit = match s {
            "H" => CalendarUnit::Hour,
            "d" => CalendarUnit::Day,
            "W" => CalendarUnit::Week,
            "m" => CalendarUnit::Month,
            "Y" => CalendarUnit::Year,
            _ => match s.to_ascii_lowercase().as_str() {
                "hour" => CalendarUnit::Hour,
                "day" => CalendarUnit::Day,
                "week" => CalendarUnit::Week,
                "month" => CalendarUnit::Month,
                "year" => CalendarUnit::Year,
                _ => return Err(IntervalError::InvalidUnit(format!("'{}'", s))),
            },
        };
        Ok(unit)
    }
}

/// View granularity of an overlap query. Passed through to hooks unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IntersectMode {
    #[default]
    Day,
    Week,
    Month,
    Year,
}

impl FromStr for IntersectMode {
    type Err = IntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(IntersectMode::Day),
            "week" => Ok(IntersectMode::Week),
            "month" => Ok(IntersectMode::Month),
            "year" => Ok(IntersectMode::Year),
            _ => Err(IntervalError::InvalidMode(format!("'{}'", s.trim()))),
        }
    }
}

impl fmt::Display for IntersectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IntersectMode::Day => "day",
            IntersectMode::Week => "week",
            IntersectMode::Month => "month",
            IntersectMode::Year => "year",
        })
    }
}

// ── Evaluator ───────────────────────────────────────────────────────────────

/// Evaluates events against the configured timezone policy.
///
/// # Examples
///
/// ```
/// use event_interval::{Evaluator, EvaluatorConfig, Event, IntersectMode, ZonedInstant};
///
/// let evaluator = Evaluator::new(EvaluatorConfig::default()).unwrap();
/// let event = Event::new("2024-03-10 09:00:00", "2024-03-10 10:00:00")
///     .with_zones("America/New_York", "America/New_York");
///
/// // 09:00-10:00 EDT is 13:00-14:00 UTC
/// let start = ZonedInstant::parse("2024-03-10 13:30:00Z", None).unwrap();
/// let end = ZonedInstant::parse("2024-03-10 14:30:00Z", None).unwrap();
/// assert!(evaluator
///     .intersects(&event, Some(&start), Some(&end), IntersectMode::Day)
///     .unwrap());
/// ```
pub struct Evaluator {
    config: EvaluatorConfig,
    default_tz: Tz,
    formatter: Box<dyn DateFormatter + Send + Sync>,
    metadata: Box<dyn MetadataStore + Send + Sync>,
    intersect_hooks: HookChain<IntersectQuery>,
    legacy_hooks: HookChain<LegacyIntersectQuery>,
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("config", &self.config)
            .field("intersect_hooks", &self.intersect_hooks)
            .field("legacy_hooks", &self.legacy_hooks)
            .finish_non_exhaustive()
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator::with_default_tz(EvaluatorConfig::default(), Tz::UTC)
    }
}

impl Evaluator {
    /// Build an evaluator with the `chrono-tz` formatter and no metadata.
    ///
    /// # Errors
    ///
    /// Returns [`IntervalError::InvalidTimezone`] if the configured default
    /// timezone is unknown.
    pub fn new(config: EvaluatorConfig) -> Result<Self, IntervalError> {
        let default_tz = config.default_tz()?;
        Ok(Evaluator::with_default_tz(config, default_tz))
    }

    fn with_default_tz(config: EvaluatorConfig, default_tz: Tz) -> Self {
        Evaluator {
            config,
            default_tz,
            formatter: Box::new(ChronoFormatter::new(default_tz)),
            metadata: Box::new(NoMetadata),
            intersect_hooks: HookChain::new(),
            legacy_hooks: HookChain::new(),
        }
    }

    /// Replace the formatting collaborator.
    ///
    /// The replacement should read floating values in the same default
    /// timezone as the configuration, since query bounds use it too.
    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: DateFormatter + Send + Sync + 'static,
    {
        self.formatter = Box::new(formatter);
        self
    }

    /// Replace the metadata collaborator used for attribute fallback.
    pub fn with_metadata<M>(mut self, metadata: M) -> Self
    where
        M: MetadataStore + Send + Sync + 'static,
    {
        self.metadata = Box::new(metadata);
        self
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Register an override hook for [`intersects`](Self::intersects).
    pub fn on_intersect<H>(&mut self, hook: H) -> &mut Self
    where
        H: Fn(bool, &Event, &IntersectQuery) -> bool + Send + Sync + 'static,
    {
        self.intersect_hooks.register(hook);
        self
    }

    /// Register an override hook for the legacy timestamp entry point.
    pub fn on_legacy_intersect<H>(&mut self, hook: H) -> &mut Self
    where
        H: Fn(bool, &Event, &LegacyIntersectQuery) -> bool + Send + Sync + 'static,
    {
        self.legacy_hooks.register(hook);
        self
    }

    /// Resolve an attribute, falling back to metadata when it is unset.
    pub fn resolve(&self, event: &Event, key: &str) -> Option<Value> {
        resolve(event, key, &*self.metadata)
    }

    // ── Accessors ───────────────────────────────────────────────────────

    /// Format the event start, read in `start_tz` and rendered in `timezone`.
    ///
    /// An unset start formats as the zero date.
    pub fn start_date(
        &self,
        event: &Event,
        format: &str,
        timezone: Option<&str>,
    ) -> Result<String, IntervalError> {
        self.format_stored(event.start.as_deref(), event.start_zone(), format, timezone)
    }

    /// Format the event end, read in `end_tz` and rendered in `timezone`.
    pub fn end_date(
        &self,
        event: &Event,
        format: &str,
        timezone: Option<&str>,
    ) -> Result<String, IntervalError> {
        self.format_stored(event.end.as_deref(), event.end_zone(), format, timezone)
    }

    /// Format the recurrence end in its own zone.
    pub fn recurrence_end_date(&self, event: &Event, format: &str) -> Result<String, IntervalError> {
        self.format_stored(
            event.recurrence_end.as_deref(),
            event.recurrence_end_zone(),
            format,
            None,
        )
    }

    fn format_stored(
        &self,
        value: Option<&str>,
        zone: Option<&str>,
        format: &str,
        timezone: Option<&str>,
    ) -> Result<String, IntervalError> {
        let value = non_empty(value).unwrap_or(EMPTY_DATE);
        self.formatter
            .format(format, Some(value), zone, timezone, self.config.locale.as_deref())
    }

    // ── Classification ──────────────────────────────────────────────────

    /// Whether the event spans whole days.
    ///
    /// True when the `all_day` attribute (record, then metadata) is truthy,
    /// or when the start reads `00:00:00` and the end reads `23:59:59` in
    /// their own zones.
    pub fn is_all_day(&self, event: &Event) -> Result<bool, IntervalError> {
        if is_truthy(self.resolve(event, "all_day").as_ref()) {
            return Ok(true);
        }

        let start_time = self.start_date(event, "H:i:s", None)?;
        let end_time = self.end_date(event, "H:i:s", None)?;
        Ok(start_time == "00:00:00" && end_time == "23:59:59")
    }

    /// Whether start and end differ in the `unit` component.
    ///
    /// This compares formatted tokens, not spans: Jan 10 to Feb 10 is not
    /// multi-day, while 23:30 to 00:30 the next day is. Week numbers follow
    /// ISO 8601.
    pub fn is_multi(&self, event: &Event, unit: CalendarUnit) -> Result<bool, IntervalError> {
        let token = unit.token();
        let start = self.start_date(event, token, None)?;
        let end = self.end_date(event, token, None)?;
        Ok(start != end)
    }

    /// Whether `value` denotes an unset date.
    ///
    /// True for a missing or blank value, the [`EMPTY_DATE`] literal, or any
    /// value that formats to it (e.g. `"0000-00-00"`). Values the formatter
    /// rejects are not empty.
    pub fn is_empty_date(&self, value: Option<&str>) -> bool {
        let Some(raw) = non_empty(value) else {
            return true;
        };
        if raw == EMPTY_DATE {
            return true;
        }
        matches!(
            self.formatter.format(DEFAULT_PATTERN, Some(raw), None, None, None),
            Ok(formatted) if formatted == EMPTY_DATE
        )
    }

    // ── Overlap ─────────────────────────────────────────────────────────

    /// Whether the event's interval overlaps `[query_start, query_end]`.
    ///
    /// Bounds are inclusive on both sides. A missing query bound returns
    /// `false` without consulting the hooks. An event without a start or end
    /// occupies no interval. `mode` is only handed to the hooks.
    ///
    /// # Errors
    ///
    /// Formatter failures (unparseable stored values, unknown zone names)
    /// are returned instead of being coerced to a boolean.
    pub fn intersects(
        &self,
        event: &Event,
        query_start: Option<&ZonedInstant>,
        query_end: Option<&ZonedInstant>,
        mode: IntersectMode,
    ) -> Result<bool, IntervalError> {
        let (Some(query_start), Some(query_end)) = (query_start, query_end) else {
            return Ok(false);
        };

        let query = IntersectQuery {
            start: *query_start,
            end: *query_end,
            mode,
        };
        let computed = self.overlaps(event, &query)?;
        let result = self.intersect_hooks.apply(computed, event, &query);

        debug!(
            event_id = ?event.id,
            %mode,
            computed,
            result,
            overridden = computed != result,
            "intersects"
        );
        Ok(result)
    }

    /// Timestamp-based variant of [`intersects`](Self::intersects).
    ///
    /// `start` and `end` are Unix seconds or any accepted datetime layout,
    /// read in `timezone` (floating when `None` or blank). The result of
    /// `intersects`, hooks included, is then passed through the legacy hooks.
    #[deprecated(note = "build `ZonedInstant` bounds and call `intersects`")]
    pub fn intersects_legacy(
        &self,
        event: &Event,
        start: Option<&str>,
        end: Option<&str>,
        mode: IntersectMode,
        timezone: Option<&str>,
    ) -> Result<bool, IntervalError> {
        debug!(event_id = ?event.id, ?timezone, "legacy intersects entry point");

        let query_start = non_empty(start)
            .map(|raw| legacy_instant(raw, timezone, self.default_tz))
            .transpose()?;
        let query_end = non_empty(end)
            .map(|raw| legacy_instant(raw, timezone, self.default_tz))
            .transpose()?;

        let result = self.intersects(event, query_start.as_ref(), query_end.as_ref(), mode)?;

        let query = LegacyIntersectQuery {
            start: start.map(str::to_string),
            end: end.map(str::to_string),
            mode,
            timezone: timezone.map(str::to_string),
        };
        Ok(self.legacy_hooks.apply(result, event, &query))
    }

    fn overlaps(&self, event: &Event, query: &IntersectQuery) -> Result<bool, IntervalError> {
        if self.is_empty_date(event.start.as_deref()) || self.is_empty_date(event.end.as_deref()) {
            debug!(event_id = ?event.id, "event has no start or end");
            return Ok(false);
        }

        let mut start_zone = query.start.zone_name();
        let mut end_zone = query.end.zone_name();
        if !self.config.floating_time && !self.is_all_day(event)? {
            if let Some(zone) = event.start_zone() {
                start_zone = Some(zone);
            }
            if let Some(zone) = event.end_zone() {
                end_zone = Some(zone);
            }
        }
        trace!(?start_zone, ?end_zone, "effective zones");

        let event_start =
            self.formatter
                .instant(event.start.as_deref(), start_zone, query.start.zone_name())?;
        let event_end =
            self.formatter
                .instant(event.end.as_deref(), end_zone, query.end.zone_name())?;
        let query_start = query.start.to_comparable(self.default_tz)?;
        let query_end = query.end.to_comparable(self.default_tz)?;

        Ok(contains_or_overlaps(
            (event_start, event_end),
            (query_start, query_end),
        ))
    }
}

/// Inclusive overlap of `event` with `query`.
fn contains_or_overlaps(
    (event_start, event_end): (DateTime<Tz>, DateTime<Tz>),
    (query_start, query_end): (DateTime<Tz>, DateTime<Tz>),
) -> bool {
    let contained = event_end <= query_end && event_start >= query_start;
    let intersecting = event_end >= query_start && event_start <= query_end;
    contained || intersecting
}

/// Build a query bound from Unix seconds or a datetime string.
///
/// Unix seconds without a zone become a floating reading of that instant in
/// `default_tz`, which is where floating bounds are read back.
fn legacy_instant(
    raw: &str,
    timezone: Option<&str>,
    default_tz: Tz,
) -> Result<ZonedInstant, IntervalError> {
    let raw = raw.trim();
    let Ok(secs) = raw.parse::<i64>() else {
        return ZonedInstant::parse(raw, timezone);
    };

    let utc = DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| IntervalError::InvalidDatetime(format!("timestamp {} out of range", secs)))?;
    Ok(match parse_zone(timezone)? {
        Some(tz) => ZonedInstant::from_datetime(&utc.with_timezone(&tz)),
        None => ZonedInstant::floating(utc.with_timezone(&default_tz).naive_local()),
    })
}

// ── Tests ───────────────────────────────────────────────────────────────────
