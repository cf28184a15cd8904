//! Earthquake record decoded from one bulletin row.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::Watermark;

/// A single event line of the bulletin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarthquakeRecord {
    /// Zero-based line number in the bulletin text
    pub row: usize,

    /// Event date (UTC+3 wall clock as published)
    pub date: NaiveDate,

    /// Event time of day
    pub time: NaiveTime,

    /// Latitude token, kept verbatim for prefix matching
    pub latitude: String,

    /// Longitude token, kept verbatim for prefix matching
    pub longitude: String,

    /// Depth in kilometres
    pub depth_km: Option<f64>,

    /// Duration magnitude, `None` when published as `-.-`
    pub md: Option<f64>,

    /// Local magnitude used for threshold filtering
    pub magnitude: f64,

    /// Moment magnitude, `None` when published as `-.-`
    pub mw: Option<f64>,

    /// The two region tokens joined by a single space
    pub region: String,

    /// Original line, used verbatim in notifications
    pub raw: String,
}

impl EarthquakeRecord {
    /// Combined date and time.
    pub fn timestamp(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    /// Watermark value this record would set.
    pub fn watermark(&self) -> Watermark {
        Watermark::from_datetime(self.timestamp())
    }
}
