//! Watermark: the timestamp of the most recent processed event.

use std::fmt;

use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Timestamp layout used by the bulletin's first two columns.
pub const BULLETIN_TIMESTAMP_FORMAT: &str = "%Y.%m.%d %H:%M:%S";

/// Epoch seconds of the newest record seen by a previous run.
///
/// Bulletin wall-clock time is mapped to epoch seconds as if it were UTC, so
/// converting back yields exactly the text the bulletin printed regardless of
/// the host time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watermark(i64);

impl Watermark {
    pub fn from_epoch(seconds: i64) -> Self {
        Self(seconds)
    }

    pub fn from_datetime(timestamp: NaiveDateTime) -> Self {
        Self(timestamp.and_utc().timestamp())
    }

    /// Epoch seconds.
    pub fn epoch(&self) -> i64 {
        self.0
    }

    /// Wall-clock time this watermark stands for, if representable.
    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        DateTime::from_timestamp(self.0, 0).map(|dt| dt.naive_utc())
    }

    /// Render as `YYYY.MM.DD HH:MM:SS`, the prefix of the matching bulletin line.
    pub fn bulletin_form(&self) -> Option<String> {
        self.to_datetime()
            .map(|dt| dt.format(BULLETIN_TIMESTAMP_FORMAT).to_string())
    }

    /// Parse the persisted tracker value.
    ///
    /// Accepts integer seconds and the older `1704103200.0` float form.
    /// Values that do not map to a calendar time are rejected so that a
    /// damaged tracker reads as absent instead of pinning the watermark.
    pub fn parse_stored(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        let watermark = match value.parse::<i64>() {
            Ok(seconds) => Self(seconds),
            Err(_) => Self::from_legacy(value.parse::<f64>().ok()?)?,
        };
        watermark.to_datetime().map(|_| watermark)
    }

    /// Float values are host-local epochs of the bulletin wall clock.
    /// Shift them by the host's UTC offset back onto the bulletin time.
    fn from_legacy(seconds: f64) -> Option<Self> {
        if !seconds.is_finite() || seconds < i64::MIN as f64 || seconds >= i64::MAX as f64 {
            return None;
        }
        let wall_clock = DateTime::from_timestamp(seconds.trunc() as i64, 0)?
            .with_timezone(&Local)
            .naive_local();
        Some(Self::from_datetime(wall_clock))
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
