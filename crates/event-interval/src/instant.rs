//! Zoned query instants and wall-clock localization.
//!
//! A [`ZonedInstant`] is a wall-clock reading plus an optional IANA zone.
//! `zone = None` is floating time: the reading is resolved against the
//! evaluator's default timezone preference when it has to be placed on the
//! timeline.

use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc,
};
use chrono_tz::Tz;

use crate::error::IntervalError;

/// Wall-clock layouts accepted for stored and query values.
const NAIVE_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Offset-bearing layouts (besides RFC 3339) accepted for query values.
const OFFSET_LAYOUTS: &[&str] = &["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%z"];

/// A wall-clock datetime with an optional timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZonedInstant {
    pub local: NaiveDateTime,
    pub zone: Option<Tz>,
}

impl ZonedInstant {
    /// A floating wall-clock value.
    pub fn floating(local: NaiveDateTime) -> Self {
        ZonedInstant { local, zone: None }
    }

    pub fn in_zone(local: NaiveDateTime, zone: Tz) -> Self {
        ZonedInstant {
            local,
            zone: Some(zone),
        }
    }

    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        ZonedInstant::in_zone(dt.naive_utc(), Tz::UTC)
    }

    pub fn from_datetime(dt: &DateTime<Tz>) -> Self {
        ZonedInstant::in_zone(dt.naive_local(), dt.timezone())
    }

    /// Parse a query bound.
    ///
    /// `value` is either a wall-clock layout (`Y-m-d H:i:s`, `Y-m-d`, ...)
    /// read in `zone`, or carries its own zone: a trailing `Z` means UTC and
    /// an explicit offset is converted to UTC. A blank or missing `zone`
    /// yields a floating instant.
    ///
    /// # Errors
    ///
    /// Returns [`IntervalError::InvalidDatetime`] for unparseable values and
    /// [`IntervalError::InvalidTimezone`] for unknown zone names.
    ///
    /// # Examples
    ///
    /// ```
    /// use event_interval::ZonedInstant;
    ///
    /// let q = ZonedInstant::parse("2024-03-10 13:30:00Z", None).unwrap();
    /// assert_eq!(q.zone_name(), Some("UTC"));
    ///
    /// let f = ZonedInstant::parse("2024-03-10 13:30:00", None).unwrap();
    /// assert!(f.is_floating());
    /// ```
    pub fn parse(value: &str, zone: Option<&str>) -> Result<Self, IntervalError> {
        let value = value.trim();

        if let Some(rest) = value.strip_suffix('Z').or_else(|| value.strip_suffix('z')) {
            return Ok(ZonedInstant::in_zone(parse_naive(rest)?, Tz::UTC));
        }
        if let Some(fixed) = parse_with_offset(value) {
            return Ok(ZonedInstant::from_utc(fixed.with_timezone(&Utc)));
        }

        let local = parse_naive(value)?;
        Ok(match parse_zone(zone)? {
            Some(tz) => ZonedInstant::in_zone(local, tz),
            None => ZonedInstant::floating(local),
        })
    }

    pub fn is_floating(&self) -> bool {
        self.zone.is_none()
    }

    /// The IANA name of the zone, or `None` when floating.
    pub fn zone_name(&self) -> Option<&'static str> {
        self.zone.map(|tz| tz.name())
    }

    /// Place this reading on the timeline, using `default` for floating values.
    pub fn to_comparable(&self, default: Tz) -> Result<DateTime<Tz>, IntervalError> {
        localize(self.local, self.zone.unwrap_or(default))
    }
}

/// Parse an optional IANA zone name. Blank means floating (`None`).
pub(crate) fn parse_zone(name: Option<&str>) -> Result<Option<Tz>, IntervalError> {
    match name.map(str::trim) {
        None | Some("") => Ok(None),
        Some(name) => name
            .parse::<Tz>()
            .map(Some)
            .map_err(|_| IntervalError::InvalidTimezone(format!("'{}'", name))),
    }
}

/// Parse a wall-clock value in one of the accepted layouts. A bare date is midnight.
pub(crate) fn parse_naive(value: &str) -> Result<NaiveDateTime, IntervalError> {
    let value = value.trim();
    for layout in NAIVE_LAYOUTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, layout) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| IntervalError::InvalidDatetime(format!("'{}'", value)))
}

/// Parse a value that carries its own UTC offset.
pub(crate) fn parse_with_offset(value: &str) -> Option<DateTime<chrono::FixedOffset>> {
    DateTime::parse_from_rfc3339(value).ok().or_else(|| {
        OFFSET_LAYOUTS
            .iter()
            .find_map(|layout| DateTime::parse_from_str(value, layout).ok())
    })
}

/// Read a wall-clock value in `tz`.
///
/// Ambiguous readings (DST fall-back) take the earlier offset. Readings in a
/// DST gap are moved forward by the length of the gap.
pub(crate) fn localize(local: NaiveDateTime, tz: Tz) -> Result<DateTime<Tz>, IntervalError> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => {
            let missing =
                || IntervalError::InvalidDatetime(format!("'{}' does not exist in {}", local, tz));
            let before = local
                .checked_sub_signed(Duration::days(1))
                .and_then(|day_before| tz.from_local_datetime(&day_before).earliest())
                .ok_or_else(missing)?;
            let offset = Duration::seconds(before.offset().fix().local_minus_utc() as i64);
            let utc = local.checked_sub_signed(offset).ok_or_else(missing)?;
            Ok(tz.from_utc_datetime(&utc))
        }
    }
}
