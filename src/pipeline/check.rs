// src/pipeline/check.rs

//! Single bulletin check: fetch, parse, advance, locate, filter, notify.

use serde::Serialize;

use crate::error::{AppError, Result};
use crate::mail::{DispatchAck, MailTransport};
use crate::models::{Config, EarthquakeRecord, Watermark};
use crate::pipeline::{DeltaLocator, RecordFilter};
use crate::services::{BulletinParser, NotificationDispatcher, ParsedBulletin};
use crate::source::BulletinSource;
use crate::storage::{Advance, WatermarkStore};

/// What a check run did.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckOutcome {
    /// Newest record equals the stored watermark.
    Unchanged { watermark: Watermark },
    /// First run: the newest record became the baseline.
    Baseline { watermark: Watermark },
    /// Bulletin is older than the stored watermark.
    Regressed { stored: Watermark, newest: Watermark },
    /// New records exist but none qualified.
    NoMatches { new_records: usize },
    /// One notification was accepted by the transport.
    Notified {
        new_records: usize,
        matched: Vec<String>,
        ack: DispatchAck,
    },
}

/// Summary of a check run.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    /// Malformed data rows skipped by the parser
    pub skipped_lines: usize,
    #[serde(flatten)]
    pub outcome: CheckOutcome,
}

impl CheckReport {
    pub fn notified(&self) -> bool {
        matches!(self.outcome, CheckOutcome::Notified { .. })
    }
}

/// Fetch and parse the bulletin, logging skipped rows.
async fn load_bulletin(config: &Config, source: &dyn BulletinSource) -> Result<ParsedBulletin> {
    let raw = source.fetch().await?;
    let parsed = BulletinParser::new(config.bulletin).parse(&raw)?;

    for malformed in &parsed.skipped {
        log::warn!("Skipping malformed bulletin line {}", malformed);
    }
    log::info!(
        "Parsed {} records from {} ({} skipped)",
        parsed.records.len(),
        source.name(),
        parsed.skipped.len()
    );
    Ok(parsed)
}

fn newest_watermark(parsed: &ParsedBulletin) -> Result<Watermark> {
    parsed
        .newest()
        .map(EarthquakeRecord::watermark)
        .ok_or_else(|| AppError::malformed("bulletin has no records"))
}

/// Run one check against the bulletin.
///
/// The watermark is advanced before filtering and sending, so a failure
/// after that point loses the notification instead of repeating it.
pub async fn run_check(
    config: &Config,
    source: &dyn BulletinSource,
    store: &dyn WatermarkStore,
    transport: &dyn MailTransport,
) -> Result<CheckReport> {
    let criteria = config.track.criteria()?;

    let parsed = load_bulletin(config, source).await?;
    let skipped_lines = parsed.skipped.len();
    let newest = newest_watermark(&parsed)?;

    let report = |outcome| CheckReport {
        skipped_lines,
        outcome,
    };

    let previous = match store.compare_and_advance(newest)? {
        Advance::Unchanged => {
            log::info!("No new events since {}", newest);
            return Ok(report(CheckOutcome::Unchanged { watermark: newest }));
        }
        Advance::Baseline => {
            log::info!("Stored baseline watermark {}; not notifying on first run", newest);
            return Ok(report(CheckOutcome::Baseline { watermark: newest }));
        }
        Advance::Regressed { stored } => {
            log::warn!(
                "Bulletin top record {} is older than stored watermark {}; leaving it",
                newest,
                stored
            );
            return Ok(report(CheckOutcome::Regressed { stored, newest }));
        }
        Advance::Advanced { previous } => previous,
    };
    log::info!("Watermark advanced {} -> {}", previous, newest);

    let range = DeltaLocator::new(config.track.on_unresolved_boundary)
        .resolve(&parsed.records, previous)?;
    let new_records = range.len();
    let matched = RecordFilter::new(&criteria).filter(&parsed.records, range);
    log::info!("{} new record(s), {} matching", new_records, matched.len());

    if matched.is_empty() {
        return Ok(report(CheckOutcome::NoMatches { new_records }));
    }

    let ack = NotificationDispatcher::new(transport)
        .dispatch(&matched, &config.notification)
        .await?;

    Ok(report(CheckOutcome::Notified {
        new_records,
        matched: matched.into_iter().map(|record| record.raw).collect(),
        ack,
    }))
}

/// Read-only view of what the next check would consider.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewReport {
    pub stored: Option<Watermark>,
    pub newest: Watermark,
    /// Index of the stored watermark's row, if present
    pub boundary: Option<usize>,
    pub skipped_lines: usize,
    pub matched: Vec<EarthquakeRecord>,
}

/// Fetch, parse and filter without touching the watermark or sending mail.
///
/// Without a stored watermark, or when it is not in the bulletin, the whole
/// bulletin is filtered.
pub async fn run_preview(
    config: &Config,
    source: &dyn BulletinSource,
    store: &dyn WatermarkStore,
) -> Result<PreviewReport> {
    let criteria = config.track.criteria()?;
    let parsed = load_bulletin(config, source).await?;
    let newest = newest_watermark(&parsed)?;
    let stored = store.load()?;

    let locator = DeltaLocator::new(config.track.on_unresolved_boundary);
    let boundary = stored.and_then(|previous| locator.locate(&parsed.records, previous));
    let end = boundary.unwrap_or(parsed.records.len());
    let matched = RecordFilter::new(&criteria).filter(&parsed.records, 0..end);

    Ok(PreviewReport {
        stored,
        newest,
        boundary,
        skipped_lines: parsed.skipped.len(),
        matched,
    })
}
