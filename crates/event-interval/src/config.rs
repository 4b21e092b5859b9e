//! Evaluator configuration.
//!
//! The floating-time switch and the default timezone preference are passed
//! into the [`Evaluator`](crate::Evaluator) at construction instead of being
//! read from process-wide state, so several configurations can coexist in one
//! process (and in one test binary).

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::IntervalError;

/// Timezone used when neither the value nor the configuration names one.
pub const FALLBACK_TIMEZONE: &str = "UTC";

/// Configuration for an [`Evaluator`](crate::Evaluator).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// When true, every stored time is floating: event zones never override
    /// the query's zones in overlap tests.
    pub floating_time: bool,
    /// IANA name applied to floating values. `None` or empty means UTC.
    pub default_timezone: Option<String>,
    /// Locale for day/month names in formatted output (e.g. `"de_DE"`).
    pub locale: Option<String>,
}

impl EvaluatorConfig {
    /// Parse a configuration from JSON. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`IntervalError::Config`] if the JSON is malformed, or
    /// [`IntervalError::InvalidTimezone`] if `default_timezone` is not a
    /// valid IANA name.
    ///
    /// # Examples
    ///
    /// ```
    /// use event_interval::EvaluatorConfig;
    ///
    /// let config = EvaluatorConfig::from_json(r#"{"floating_time": true}"#).unwrap();
    /// assert!(config.floating_time);
    /// assert_eq!(config.default_timezone, None);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, IntervalError> {
        let config: EvaluatorConfig =
            serde_json::from_str(json).map_err(|e| IntervalError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configured default timezone exists.
    pub fn validate(&self) -> Result<(), IntervalError> {
        self.default_tz().map(|_| ())
    }

    /// The default timezone preference as a `Tz`.
    pub fn default_tz(&self) -> Result<Tz, IntervalError> {
        let name = match self.default_timezone.as_deref().map(str::trim) {
            None | Some("") => FALLBACK_TIMEZONE,
            Some(name) => name,
        };
        name.parse::<Tz>()
            .map_err(|_| IntervalError::InvalidTimezone(format!("'{}'", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_fixed_time_utc() {
        let config = EvaluatorConfig::default();
        assert!(!config.floating_time);
        assert_eq!(config.default_tz().unwrap(), Tz::UTC);
        assert!(config.locale.is_none());
    }

    #[test]
    fn test_from_json_full() {
        let config = EvaluatorConfig::from_json(
            r#"{"floating_time": false, "default_timezone": "Europe/Berlin", "locale": "de_DE"}"#,
        )
        .unwrap();
        assert_eq!(config.default_tz().unwrap(), chrono_tz::Europe::Berlin);
        assert_eq!(config.locale.as_deref(), Some("de_DE"));
    }

    #[test]
    fn test_from_json_empty_object_uses_defaults() {
        let config = EvaluatorConfig::from_json("{}").unwrap();
        assert_eq!(config, EvaluatorConfig::default());
    }

    #[test]
    fn test_empty_timezone_name_means_utc() {
        let config = EvaluatorConfig {
            default_timezone: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.default_tz().unwrap(), Tz::UTC);
    }

    #[test]
    fn test_from_json_rejects_unknown_timezone() {
        let err = EvaluatorConfig::from_json(r#"{"default_timezone": "Mars/Olympus"}"#)
            .unwrap_err();
        assert!(err.is_timezone_error());
        assert!(err.to_string().contains("Mars/Olympus"), "got: {err}");
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        let err = EvaluatorConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, IntervalError::Config(_)));
    }
}
