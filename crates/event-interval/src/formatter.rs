//! Date formatting with two-zone indirection.
//!
//! A stored value is a wall-clock reading that means something only together
//! with a zone. [`DateFormatter::format`] interprets the reading in `zone_a`
//! (falling back to the default timezone preference) and renders the
//! resulting instant as seen from `zone_b`, when one is given. The comparable
//! variant [`DateFormatter::instant`] returns the same instant as a
//! `DateTime<Tz>`, which orders by absolute time whatever zone it carries.
//! Overlap tests must compare those, never rendered strings.
//!
//! # Pattern language
//!
//! Patterns use single-letter tokens (`Y-m-d H:i:s`). A backslash makes the
//! next character literal and any other character is copied as is.
//!
//! | Token | Output | Token | Output |
//! |-------|--------|-------|--------|
//! | `d` | day, 2 digits | `j` | day |
//! | `D` | short weekday name | `l` | weekday name |
//! | `N` | ISO weekday 1-7 | `w` | weekday 0 (Sunday)-6 |
//! | `S` | English ordinal suffix | `z` | day of year from 0 |
//! | `W` | ISO week, 2 digits | `o` | ISO week-numbering year |
//! | `F` | month name | `M` | short month name |
//! | `m` | month, 2 digits | `n` | month |
//! | `t` | days in month | `L` | leap year 1/0 |
//! | `Y` | year, 4 digits | `y` | year, 2 digits |
//! | `a` / `A` | am/pm, AM/PM | `g` / `G` | hour 12h / 24h |
//! | `h` / `H` | hour 12h / 24h, 2 digits | `i` / `s` | minutes / seconds |
//! | `u` / `v` | micro / milliseconds | `e` | zone identifier |
//! | `T` | zone abbreviation | `P` / `O` / `p` | offset `+05:00` / `+0500` / `Z` |
//! | `Z` | offset in seconds | `U` | Unix seconds |
//! | `c` | ISO 8601 | `r` | RFC 2822 |

use chrono::{DateTime, Datelike, Locale, NaiveDate, Offset, Timelike, Utc};
use chrono_tz::Tz;

use crate::error::IntervalError;
use crate::event::non_empty;
use crate::instant::{localize, parse_naive, parse_with_offset, parse_zone};

/// Pattern used when callers do not supply one.
pub const DEFAULT_PATTERN: &str = "Y-m-d H:i:s";

/// Formatting collaborator consumed by the evaluator.
pub trait DateFormatter {
    /// Render `instant` (now when `None`) through `pattern`.
    ///
    /// `zone_a` is the zone the stored reading is interpreted in; `zone_b`,
    /// when given, is the zone it is rendered in. `locale` only changes
    /// names in the output.
    fn format(
        &self,
        pattern: &str,
        instant: Option<&str>,
        zone_a: Option<&str>,
        zone_b: Option<&str>,
        locale: Option<&str>,
    ) -> Result<String, IntervalError>;

    /// The comparable instant for the same inputs.
    fn instant(
        &self,
        instant: Option<&str>,
        zone_a: Option<&str>,
        zone_b: Option<&str>,
    ) -> Result<DateTime<Tz>, IntervalError>;
}

/// A stored value after parsing.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Reading {
    /// The zero date (`0000-00-00 ...`).
    Zero,
    Local(chrono::NaiveDateTime),
    Fixed(DateTime<chrono::FixedOffset>),
}

/// [`DateFormatter`] backed by `chrono` and the IANA database in `chrono-tz`.
#[derive(Debug, Clone, Copy)]
pub struct ChronoFormatter {
    default_tz: Tz,
    anchor: Option<DateTime<Utc>>,
}

impl Default for ChronoFormatter {
    fn default() -> Self {
        ChronoFormatter::new(Tz::UTC)
    }
}

impl ChronoFormatter {
    /// A formatter that reads floating values in `default_tz`.
    pub fn new(default_tz: Tz) -> Self {
        ChronoFormatter {
            default_tz,
            anchor: None,
        }
    }

    /// Pin "now" to `anchor` instead of reading the system clock.
    pub fn with_anchor(mut self, anchor: DateTime<Utc>) -> Self {
        self.anchor = Some(anchor);
        self
    }

    /// Interpret the inputs; `None` for the zero date.
    fn resolve(
        &self,
        instant: Option<&str>,
        zone_a: Option<&str>,
        zone_b: Option<&str>,
    ) -> Result<Option<DateTime<Tz>>, IntervalError> {
        let tz_a = parse_zone(zone_a)?.unwrap_or(self.default_tz);
        let tz_b = parse_zone(zone_b)?.unwrap_or(tz_a);

        let interpreted = match non_empty(instant) {
            None => Some(self.anchor.unwrap_or_else(Utc::now).with_timezone(&tz_a)),
            Some(raw) => match parse_reading(raw)? {
                Reading::Zero => None,
                Reading::Local(local) => Some(localize(local, tz_a)?),
                Reading::Fixed(fixed) => Some(fixed.with_timezone(&tz_a)),
            },
        };

        Ok(interpreted.map(|dt| dt.with_timezone(&tz_b)))
    }
}

impl DateFormatter for ChronoFormatter {
    fn format(
        &self,
        pattern: &str,
        instant: Option<&str>,
        zone_a: Option<&str>,
        zone_b: Option<&str>,
        locale: Option<&str>,
    ) -> Result<String, IntervalError> {
        let locale = parse_locale(locale);
        match self.resolve(instant, zone_a, zone_b)? {
            Some(dt) => render(pattern, Subject::Moment(&dt), locale),
            None => render(pattern, Subject::Zero, locale),
        }
    }

    fn instant(
        &self,
        instant: Option<&str>,
        zone_a: Option<&str>,
        zone_b: Option<&str>,
    ) -> Result<DateTime<Tz>, IntervalError> {
        match self.resolve(instant, zone_a, zone_b)? {
            Some(dt) => Ok(dt),
            None => Err(IntervalError::EmptyDate(format!(
                "'{}' has no position in time",
                instant.unwrap_or_default().trim()
            ))),
        }
    }
}

fn parse_reading(raw: &str) -> Result<Reading, IntervalError> {
    let raw = raw.trim();
    if is_zero_date(raw) {
        return Ok(Reading::Zero);
    }
    if let Some(fixed) = parse_with_offset(raw) {
        return Ok(Reading::Fixed(fixed));
    }
    parse_naive(raw).map(Reading::Local)
}

/// `0000-00-00`, optionally followed by a zero time in any accepted layout.
fn is_zero_date(raw: &str) -> bool {
    match raw.strip_prefix("0000-00-00") {
        Some(rest) => rest
            .chars()
            .all(|c| matches!(c, '0' | ':' | '.' | ' ' | 'T')),
        None => false,
    }
}

// ── Rendering ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum Subject<'a> {
    Zero,
    Moment(&'a DateTime<Tz>),
}

fn render(pattern: &str, subject: Subject<'_>, locale: Locale) -> Result<String, IntervalError> {
    let mut out = String::with_capacity(pattern.len() * 3);
    let mut chars = pattern.chars();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            let literal = chars.next().ok_or_else(|| {
                IntervalError::InvalidFormat(format!("dangling escape at end of '{}'", pattern))
            })?;
            out.push(literal);
            continue;
        }

        let token = match subject {
            Subject::Moment(dt) => moment_token(ch, dt, locale),
            Subject::Zero => zero_token(ch)?.map(str::to_string),
        };
        match token {
            Some(text) => out.push_str(&text),
            None => out.push(ch),
        }
    }

    Ok(out)
}

fn moment_token(ch: char, dt: &DateTime<Tz>, locale: Locale) -> Option<String> {
    let offset = dt.offset().fix().local_minus_utc();

    let text = match ch {
        'd' => format!("{:02}", dt.day()),
        'D' => dt.format_localized("%a", locale).to_string(),
        'j' => dt.day().to_string(),
        'l' => dt.format_localized("%A", locale).to_string(),
        'N' => dt.weekday().number_from_monday().to_string(),
        'S' => ordinal_suffix(dt.day()).to_string(),
        'w' => dt.weekday().num_days_from_sunday().to_string(),
        'z' => dt.ordinal0().to_string(),
        'W' => format!("{:02}", dt.iso_week().week()),
        'o' => dt.iso_week().year().to_string(),
        'F' => dt.format_localized("%B", locale).to_string(),
        'M' => dt.format_localized("%b", locale).to_string(),
        'm' => format!("{:02}", dt.month()),
        'n' => dt.month().to_string(),
        't' => days_in_month(dt.year(), dt.month()).to_string(),
        'L' => u8::from(NaiveDate::from_ymd_opt(dt.year(), 2, 29).is_some()).to_string(),
        'Y' => format!("{:04}", dt.year()),
        'y' => format!("{:02}", dt.year().rem_euclid(100)),
        'a' => meridiem(dt, locale, false),
        'A' => meridiem(dt, locale, true),
        'g' => dt.hour12().1.to_string(),
        'G' => dt.hour().to_string(),
        'h' => format!("{:02}", dt.hour12().1),
        'H' => format!("{:02}", dt.hour()),
        'i' => format!("{:02}", dt.minute()),
        's' => format!("{:02}", dt.second()),
        'u' => format!("{:06}", dt.timestamp_subsec_micros()),
        'v' => format!("{:03}", dt.timestamp_subsec_millis()),
        'e' => dt.timezone().name().to_string(),
        'T' => dt.format("%Z").to_string(),
        'P' => format_offset(offset, true),
        'O' => format_offset(offset, false),
        'p' if offset == 0 => "Z".to_string(),
        'p' => format_offset(offset, true),
        'Z' => offset.to_string(),
        'U' => dt.timestamp().to_string(),
        'c' => dt.format("%Y-%m-%dT%H:%M:%S%:z").to_string(),
        'r' => dt.format("%a, %d %b %Y %H:%M:%S %z").to_string(),
        _ => return None,
    };
    Some(text)
}

/// Numeric tokens render as zeros for the zero date; tokens that need a real
/// calendar position are an error.
fn zero_token(ch: char) -> Result<Option<&'static str>, IntervalError> {
    let text = match ch {
        'Y' | 'o' => "0000",
        'd' | 'm' | 'y' | 'H' | 'h' | 'i' | 's' | 'W' => "00",
        'j' | 'n' | 'G' | 'g' | 'z' => "0",
        'u' => "000000",
        'v' => "000",
        'D' | 'l' | 'N' | 'S' | 'w' | 'F' | 'M' | 't' | 'L' | 'a' | 'A' | 'e' | 'T' | 'P'
        | 'O' | 'p' | 'Z' | 'U' | 'c' | 'r' => {
            return Err(IntervalError::EmptyDate(format!(
                "token '{}' has no value for the zero date",
                ch
            )))
        }
        _ => return Ok(None),
    };
    Ok(Some(text))
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (y, m) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1)
        .and_then(|first_next| first_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

/// Localized am/pm marker. Locales without one fall back to English.
fn meridiem(dt: &DateTime<Tz>, locale: Locale, upper: bool) -> String {
    let marker = dt
        .format_localized(if upper { "%p" } else { "%P" }, locale)
        .to_string();
    if !marker.is_empty() {
        return marker;
    }
    match (dt.hour() < 12, upper) {
        (true, false) => "am".to_string(),
        (true, true) => "AM".to_string(),
        (false, false) => "pm".to_string(),
        (false, true) => "PM".to_string(),
    }
}

/// Format a UTC offset in seconds as `+05:00` (or `+0500` without colon).
fn format_offset(offset_secs: i32, colon: bool) -> String {
    let sign = if offset_secs >= 0 { "+" } else { "-" };
    let abs_secs = offset_secs.unsigned_abs();
    let hours = abs_secs / 3600;
    let minutes = (abs_secs % 3600) / 60;
    if colon {
        format!("{sign}{hours:02}:{minutes:02}")
    } else {
        format!("{sign}{hours:02}{minutes:02}")
    }
}

// ── Locale ──────────────────────────────────────────────────────────────────

/// Resolve a locale name such as `de_DE`, `fr-FR`, `es` or `de_DE.UTF-8`.
/// A bare language tries `<lang>_<LANG>`. Unknown names get `en_US`.
fn parse_locale(locale: Option<&str>) -> Locale {
    let Some(name) = locale.map(str::trim).filter(|l| !l.is_empty()) else {
        return Locale::en_US;
    };
    let name = name.split('.').next().unwrap_or(name).replace('-', "_");
    if let Ok(found) = Locale::try_from(name.as_str()) {
        return found;
    }
    if !name.contains('_') {
        let paired = format!("{}_{}", name.to_ascii_lowercase(), name.to_ascii_uppercase());
        if let Ok(found) = Locale::try_from(paired.as_str()) {
            return found;
        }
    }
    Locale::en_US
}

// ── Tests ───────────────────────────────────────────────────────────────────
