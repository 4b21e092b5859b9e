//! Error types for event-interval operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntervalError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error("Invalid format pattern: {0}")]
    InvalidFormat(String),

    /// The value is the zero date and has no position on the timeline.
    #[error("Empty date: {0}")]
    EmptyDate(String),

    #[error("Invalid calendar unit: {0}")]
    InvalidUnit(String),

    #[error("Invalid intersect mode: {0}")]
    InvalidMode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl IntervalError {
    /// Whether this error came from the formatter rejecting an instant or pattern.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            IntervalError::InvalidDatetime(_)
                | IntervalError::InvalidFormat(_)
                | IntervalError::EmptyDate(_)
        )
    }

    /// Whether this error came from an unknown timezone name.
    pub fn is_timezone_error(&self) -> bool {
        matches!(self, IntervalError::InvalidTimezone(_))
    }
}

pub type Result<T> = std::result::Result<T, IntervalError>;
