//! # event-interval
//!
//! Timezone-aware interval model for calendar events.
//!
//! Given an event's start and end (each optionally pinned to its own IANA
//! timezone), its all-day flag and its recurrence descriptor, the
//! [`Evaluator`] answers three questions:
//!
//! - does the event span whole days ([`Evaluator::is_all_day`]),
//! - does it cross an hour/day/week/month/year boundary ([`Evaluator::is_multi`]),
//! - does it overlap a query window ([`Evaluator::intersects`]).
//!
//! ## Modules
//!
//! - [`event`] — The event record and the zero-date sentinel
//! - [`attribute`] — Attribute lookup with metadata fallback
//! - [`formatter`] — Two-zone date formatting and comparable instants
//! - [`instant`] — Zoned and floating query bounds
//! - [`hooks`] — Override hooks for overlap decisions
//! - [`classifier`] — All-day, span and overlap evaluation
//! - [`config`] — Evaluator configuration
//! - [`error`] — Error types

pub mod attribute;
pub mod classifier;
pub mod config;
pub mod error;
pub mod event;
pub mod formatter;
pub mod hooks;
pub mod instant;

pub use attribute::{InMemoryMetadata, MetadataStore, NoMetadata};
pub use classifier::{CalendarUnit, Evaluator, IntersectMode};
pub use config::EvaluatorConfig;
pub use error::IntervalError;
pub use event::{Event, EMPTY_DATE};
pub use formatter::{ChronoFormatter, DateFormatter, DEFAULT_PATTERN};
pub use hooks::{HookChain, IntersectQuery, LegacyIntersectQuery};
pub use instant::ZonedInstant;
