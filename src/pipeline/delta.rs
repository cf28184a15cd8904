//! Delta location between runs.
//!
//! The bulletin is newest-first, so once the row carrying the previous
//! watermark is found, every record above it is new:
//!
//! ```text
//! idx 0  2024.01.01 12:10:04 ...   new
//! idx 1  2024.01.01 11:00:00 ...   new
//! idx 2  2024.01.01 10:00:00 ...   <- previous watermark (boundary = 2)
//! idx 3  2024.01.01 09:41:55 ...   already processed
//! ```

use std::ops::Range;

use crate::error::{AppError, Result};
use crate::models::{BoundaryPolicy, EarthquakeRecord, Watermark};

/// Locates the boundary between new and already processed records.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeltaLocator {
    policy: BoundaryPolicy,
}

impl DeltaLocator {
    /// Create a locator with the given policy for unresolved boundaries.
    pub fn new(policy: BoundaryPolicy) -> Self {
        Self { policy }
    }

    /// Index of the first record whose raw line starts with the watermark's
    /// bulletin timestamp, scanning from the newest record.
    pub fn locate(&self, records: &[EarthquakeRecord], previous: Watermark) -> Option<usize> {
        let prefix = previous.bulletin_form()?;
        records
            .iter()
            .position(|record| record.raw.starts_with(&prefix))
    }

    /// Range of record indices that are new since `previous`.
    ///
    /// When the watermark is not in the bulletin the configured policy
    /// decides: `NotifyNone` fails with `DeltaBoundaryUnresolved`,
    /// `NotifyAll` returns every record.
    pub fn resolve(
        &self,
        records: &[EarthquakeRecord],
        previous: Watermark,
    ) -> Result<Range<usize>> {
        if let Some(boundary) = self.locate(records, previous) {
            log::debug!("Previous watermark {} found at index {}", previous, boundary);
            return Ok(0..boundary);
        }

        let watermark = previous
            .bulletin_form()
            .unwrap_or_else(|| previous.to_string());
        match self.policy {
            BoundaryPolicy::NotifyNone => Err(AppError::DeltaBoundaryUnresolved { watermark }),
            BoundaryPolicy::NotifyAll => {
                log::warn!(
                    "Previous watermark {} not in bulletin; treating all {} records as new",
                    watermark,
                    records.len()
                );
                Ok(0..records.len())
            }
        }
    }
}

/// Convenience function to locate the delta boundary.
pub fn locate_delta(records: &[EarthquakeRecord], previous: Watermark) -> Option<usize> {
    DeltaLocator::default().locate(records, previous)
}
