//! Pipeline entry points for bulletin checks.
//!
//! - `run_check`: One full check, advancing the watermark and notifying
//! - `run_preview`: Same filtering without side effects

pub mod check;
pub mod delta;
pub mod filter;

pub use check::{CheckOutcome, CheckReport, PreviewReport, run_check, run_preview};
pub use delta::{DeltaLocator, locate_delta};
pub use filter::RecordFilter;
