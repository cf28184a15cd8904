// src/models/mod.rs

//! Domain models for the bulletin watcher.

mod config;
mod criteria;
mod record;
mod watermark;

// Re-export all public types
pub use config::{
    BoundaryPolicy, BulletinLayout, Config, MailConfig, NotificationConfig, SMTP_PASSWORD_ENV,
    SourceConfig, TrackBase, TrackConfig, TrackerConfig,
};
pub use criteria::FilterCriteria;
pub use record::EarthquakeRecord;
pub use watermark::{BULLETIN_TIMESTAMP_FORMAT, Watermark};
