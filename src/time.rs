//! Timestamp persistence and the clock collaborator.
//!
//! Timestamps are whole seconds since the Unix epoch. On a node they are
//! stored as compact ISO 8601 basic strings in UTC (`20240131T235959`),
//! which keeps the container readable by tools that only understand
//! string attributes.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};

use crate::error::{NixError, NixResult, ValidationError};

/// `strftime` pattern used for persisted timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Formats epoch seconds as a persisted timestamp string.
///
/// # Errors
///
/// Returns `ValidationError::TimestampOutOfRange` if `seconds` does not fall
/// in years 0 through 9999, the range the fixed-width format can hold.
///
/// # Examples
///
/// ```
/// use nixid::time::time_to_str;
///
/// assert_eq!(time_to_str(0).unwrap(), "19700101T000000");
/// ```
pub fn time_to_str(seconds: i64) -> Result<String, ValidationError> {
    let dt = DateTime::<Utc>::from_timestamp(seconds, 0)
        .filter(|dt| (0..=9999).contains(&dt.year()))
        .ok_or(ValidationError::TimestampOutOfRange { seconds })?;
    Ok(dt.format(TIMESTAMP_FORMAT).to_string())
}

/// Parses a persisted timestamp string read from attribute `field`.
///
/// # Errors
///
/// Returns `NixError::Format` if `value` does not match [`TIMESTAMP_FORMAT`].
pub fn str_to_time(field: &str, value: &str) -> NixResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| NixError::Format {
            field: field.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Source of "now" for stamping operations.
///
/// Every stamping operation reads the clock when it runs; nothing caches a
/// reading across calls.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current time as whole seconds since the Unix epoch.
    fn now(&self) -> i64;
}

/// Wall clock backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// A clock that only moves when told to.
///
/// Used by tests, and by migration tooling that replays a store with
/// historical timestamps.
///
/// # Examples
///
/// ```
/// use nixid::time::{Clock, ManualClock};
///
/// let clock = ManualClock::new(100);
/// assert_eq!(clock.now(), 100);
/// clock.advance(5);
/// assert_eq!(clock.now(), 105);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    seconds: AtomicI64,
}

impl ManualClock {
    #[must_use]
    pub const fn new(seconds: i64) -> Self {
        Self {
            seconds: AtomicI64::new(seconds),
        }
    }

    /// Sets the current reading.
    pub fn set(&self, seconds: i64) {
        self.seconds.store(seconds, Ordering::SeqCst);
    }

    /// Moves the clock forward by `by` seconds and returns the new reading.
    pub fn advance(&self, by: i64) -> i64 {
        self.seconds.fetch_add(by, Ordering::SeqCst) + by
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.seconds.load(Ordering::SeqCst)
    }
}
