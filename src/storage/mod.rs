//! Watermark persistence.
//!
//! The watermark is the epoch timestamp of the newest bulletin record already
//! processed. It is read and advanced under an exclusive lock so overlapping
//! runs never both observe the same old value.
//!
//! ## Layout
//!
//! ```text
//! data/
//! ├── tracker        # single line: epoch seconds
//! └── tracker.lock   # advisory lock held during read-compare-write
//! ```

pub mod local;

use serde::Serialize;

use crate::error::Result;
use crate::models::Watermark;

// Re-export for convenience
pub use local::FileWatermarkStore;

/// Result of comparing the newest record against the stored watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advance {
    /// Stored value equals the newest record; nothing was written.
    Unchanged,
    /// No usable prior value; the newest record was stored as the baseline.
    Baseline,
    /// Newest record is older than the stored value; nothing was written.
    Regressed { stored: Watermark },
    /// The newest record was persisted, replacing `previous`.
    Advanced { previous: Watermark },
}

impl Advance {
    /// The replaced watermark, present only when new data must be scanned.
    pub fn previous(&self) -> Option<Watermark> {
        match self {
            Self::Advanced { previous } => Some(*previous),
            _ => None,
        }
    }
}

/// Trait for watermark storage backends.
pub trait WatermarkStore: Send + Sync {
    /// Read the stored watermark. Missing or unreadable content is `None`.
    fn load(&self) -> Result<Option<Watermark>>;

    /// Atomically replace the stored watermark with `newest` if it is newer.
    ///
    /// The new value is durable before this returns `Advanced` or `Baseline`.
    fn compare_and_advance(&self, newest: Watermark) -> Result<Advance>;
}
