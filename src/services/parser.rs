// src/services/parser.rs

//! Bulletin parser service.
//!
//! Decodes the fixed-column KOERI event table into typed records. The column
//! contract lives in [`Columns`]; a row that does not fit it is reported as a
//! [`MalformedRecord`] and skipped.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use thiserror::Error;

use crate::error::{AppError, Result};
use crate::models::{BULLETIN_TIMESTAMP_FORMAT, BulletinLayout, EarthquakeRecord};

/// `YYYY.MM.DD HH:MM:SS`, digits only, fixed widths.
static TIMESTAMP_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}\.\d{2}\.\d{2} \d{2}:\d{2}:\d{2}$").expect("timestamp pattern is valid")
});

/// A data row that could not be decoded.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("row {row}: {reason}")]
pub struct MalformedRecord {
    pub row: usize,
    pub reason: MalformedReason,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MalformedReason {
    #[error("expected at least {expected} fields, found {found}")]
    TooFewFields { expected: usize, found: usize },

    #[error("timestamp '{0}' does not match YYYY.MM.DD HH:MM:SS")]
    Timestamp(String),

    #[error("magnitude '{0}' is not a number")]
    Magnitude(String),
}

/// Column positions of one event row.
///
/// `DATE TIME LAT LON DEPTH MD ML MW REGION1 REGION2 ...`
struct Columns<'a> {
    date: &'a str,
    time: &'a str,
    latitude: &'a str,
    longitude: &'a str,
    depth: &'a str,
    md: &'a str,
    ml: &'a str,
    mw: &'a str,
    region: [&'a str; 2],
}

impl<'a> Columns<'a> {
    const MIN_FIELDS: usize = 10;

    fn split(line: &'a str) -> std::result::Result<Self, MalformedReason> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < Self::MIN_FIELDS {
            return Err(MalformedReason::TooFewFields {
                expected: Self::MIN_FIELDS,
                found: fields.len(),
            });
        }

        Ok(Self {
            date: fields[0],
            time: fields[1],
            latitude: fields[2],
            longitude: fields[3],
            depth: fields[4],
            md: fields[5],
            ml: fields[6],
            mw: fields[7],
            region: [fields[8], fields[9]],
        })
    }
}

/// Outcome of parsing a whole bulletin.
#[derive(Debug, Clone, Default)]
pub struct ParsedBulletin {
    /// Valid records, newest first
    pub records: Vec<EarthquakeRecord>,
    /// Rows that were skipped
    pub skipped: Vec<MalformedRecord>,
}

impl ParsedBulletin {
    /// Most recent event (first data row).
    pub fn newest(&self) -> Option<&EarthquakeRecord> {
        self.records.first()
    }
}

/// Parser for the fixed-layout bulletin text.
#[derive(Debug, Clone, Copy, Default)]
pub struct BulletinParser {
    layout: BulletinLayout,
}

impl BulletinParser {
    pub fn new(layout: BulletinLayout) -> Self {
        Self { layout }
    }

    /// Parse bulletin text into records in bulletin order.
    ///
    /// Rows in `[header_lines, footer_row)` are decoded; blank rows are
    /// ignored and undecodable rows are collected in `skipped`. Fails when
    /// the data region yields no record at all, or when the last header line
    /// already decodes as an event, since both mean the layout changed rather
    /// than that nothing happened.
    pub fn parse(&self, raw: &str) -> Result<ParsedBulletin> {
        if let Some(row) = self.layout.header_lines.checked_sub(1) {
            if let Some(line) = raw.lines().nth(row) {
                if Self::decode_line(row, line).is_ok() {
                    return Err(AppError::malformed(format!(
                        "header row {row} holds an event; the table has shifted"
                    )));
                }
            }
        }

        let mut parsed = ParsedBulletin::default();
        let mut data_rows = 0;

        for (row, line) in raw
            .lines()
            .enumerate()
            .take(self.layout.footer_row)
            .skip(self.layout.header_lines)
        {
            if line.trim().is_empty() {
                continue;
            }
            data_rows += 1;
            match Self::decode_line(row, line) {
                Ok(record) => parsed.records.push(record),
                Err(malformed) => parsed.skipped.push(malformed),
            }
        }

        if data_rows == 0 {
            return Err(AppError::malformed(format!(
                "no data rows after the {}-line header",
                self.layout.header_lines
            )));
        }
        if parsed.records.is_empty() {
            return Err(AppError::malformed(format!(
                "none of the {data_rows} data rows match the column layout (first: {})",
                parsed.skipped[0]
            )));
        }

        Ok(parsed)
    }

    /// Decode a single data row.
    pub fn decode_line(
        row: usize,
        line: &str,
    ) -> std::result::Result<EarthquakeRecord, MalformedRecord> {
        Self::decode_columns(row, line).map_err(|reason| MalformedRecord { row, reason })
    }

    fn decode_columns(
        row: usize,
        line: &str,
    ) -> std::result::Result<EarthquakeRecord, MalformedReason> {
        let columns = Columns::split(line)?;

        let stamp = format!("{} {}", columns.date, columns.time);
        if !TIMESTAMP_SHAPE.is_match(&stamp) {
            return Err(MalformedReason::Timestamp(stamp));
        }
        let timestamp = NaiveDateTime::parse_from_str(&stamp, BULLETIN_TIMESTAMP_FORMAT)
            .map_err(|_| MalformedReason::Timestamp(stamp.clone()))?;

        let magnitude = optional_number(columns.ml)
            .ok_or_else(|| MalformedReason::Magnitude(columns.ml.to_string()))?;

        Ok(EarthquakeRecord {
            row,
            date: timestamp.date(),
            time: timestamp.time(),
            latitude: columns.latitude.to_string(),
            longitude: columns.longitude.to_string(),
            depth_km: optional_number(columns.depth),
            md: optional_number(columns.md),
            magnitude,
            mw: optional_number(columns.mw),
            region: columns.region.join(" "),
            raw: line.trim_end().to_string(),
        })
    }
}

/// Numeric column; the bulletin prints `-.-` for missing values.
fn optional_number(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|value| value.is_finite())
}
