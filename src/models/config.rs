//! Application configuration structures.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

use super::FilterCriteria;

/// Environment variable that overrides `mail.password`.
pub const SMTP_PASSWORD_ENV: &str = "QUAKEWATCH_SMTP_PASSWORD";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where the bulletin comes from
    #[serde(default)]
    pub source: SourceConfig,

    /// Fixed layout of the bulletin table
    #[serde(default)]
    pub bulletin: BulletinLayout,

    /// Watermark persistence
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// Filter selection
    #[serde(default)]
    pub track: TrackConfig,

    /// SMTP connection settings
    #[serde(default)]
    pub mail: MailConfig,

    /// Message envelope
    #[serde(default)]
    pub notification: NotificationConfig,
}

impl Config {
    /// Load configuration from a TOML file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Override secrets from the environment when present.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(password) = std::env::var(SMTP_PASSWORD_ENV) {
            if !password.is_empty() {
                self.mail.password = password;
            }
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.source.file.is_none() {
            url::Url::parse(&self.source.url)?;
            if self.source.user_agent.trim().is_empty() {
                return Err(AppError::validation("source.user_agent is empty"));
            }
            if self.source.timeout_secs == 0 {
                return Err(AppError::validation("source.timeout_secs must be > 0"));
            }
        }
        if self.bulletin.footer_row <= self.bulletin.header_lines {
            return Err(AppError::validation(format!(
                "bulletin.footer_row ({}) must be greater than bulletin.header_lines ({})",
                self.bulletin.footer_row, self.bulletin.header_lines
            )));
        }
        if self.tracker.tracker_file.as_os_str().is_empty() {
            return Err(AppError::validation("tracker.tracker_file is empty"));
        }
        self.track.criteria()?;
        if self.mail.smtp_server.trim().is_empty() {
            return Err(AppError::validation("mail.smtp_server is empty"));
        }
        if self.mail.port == 0 {
            return Err(AppError::validation("mail.port must be > 0"));
        }
        if self.notification.sender_mail.trim().is_empty() {
            return Err(AppError::validation("notification.sender_mail is empty"));
        }
        if self.notification.receiver_mail.trim().is_empty() {
            return Err(AppError::validation("notification.receiver_mail is empty"));
        }
        Ok(())
    }
}

/// Bulletin source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Bulletin page URL
    #[serde(default = "defaults::url")]
    pub url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Read the bulletin from a local file instead of `url`
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: defaults::url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            file: None,
        }
    }
}

/// Fixed row layout of the bulletin text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulletinLayout {
    /// Number of header lines before the first event row
    #[serde(default = "defaults::header_lines")]
    pub header_lines: usize,

    /// Line index where the data region ends (exclusive)
    #[serde(default = "defaults::footer_row")]
    pub footer_row: usize,
}

impl Default for BulletinLayout {
    fn default() -> Self {
        Self {
            header_lines: defaults::header_lines(),
            footer_row: defaults::footer_row(),
        }
    }
}

/// Watermark tracker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// File holding the last processed epoch timestamp
    #[serde(default = "defaults::tracker_file")]
    pub tracker_file: PathBuf,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tracker_file: defaults::tracker_file(),
        }
    }
}

/// Filter mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackBase {
    Coordinates,
    #[default]
    Region,
}

/// What to do when the previous watermark is missing from the bulletin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Abort without notifying.
    #[default]
    NotifyNone,
    /// Treat every retained row as new.
    NotifyAll,
}

/// Filter selection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackConfig {
    #[serde(default)]
    pub base: TrackBase,

    /// Latitude prefix, used when `base = "coordinates"`
    #[serde(default)]
    pub latitude: String,

    /// Longitude prefix, used when `base = "coordinates"`
    #[serde(default)]
    pub longitude: String,

    /// Region substring, used when `base = "region"`
    #[serde(default)]
    pub region: String,

    /// Minimum magnitude (inclusive)
    #[serde(default)]
    pub magnitude: f64,

    #[serde(default)]
    pub on_unresolved_boundary: BoundaryPolicy,
}

impl TrackConfig {
    /// Build the filter criteria for the configured base.
    pub fn criteria(&self) -> Result<FilterCriteria> {
        if !self.magnitude.is_finite() || self.magnitude < 0.0 {
            return Err(AppError::validation(format!(
                "track.magnitude must be a non-negative number, got {}",
                self.magnitude
            )));
        }

        match self.base {
            TrackBase::Coordinates => {
                let latitude = self.latitude.trim();
                let longitude = self.longitude.trim();
                if latitude.is_empty() || longitude.is_empty() {
                    return Err(AppError::validation(
                        "track.latitude and track.longitude are required for coordinates base",
                    ));
                }
                Ok(FilterCriteria::ByCoordinates {
                    latitude: latitude.to_string(),
                    longitude: longitude.to_string(),
                    min_magnitude: self.magnitude,
                })
            }
            TrackBase::Region => {
                let region = self.region.trim();
                if region.is_empty() {
                    return Err(AppError::validation(
                        "track.region is required for region base",
                    ));
                }
                Ok(FilterCriteria::ByRegion {
                    region: region.to_string(),
                    min_magnitude: self.magnitude,
                })
            }
        }
    }
}

/// SMTP connection settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub smtp_server: String,

    #[serde(default = "defaults::smtp_port")]
    pub port: u16,

    #[serde(default)]
    pub username: String,

    #[serde(default, skip_serializing)]
    pub password: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_server: String::new(),
            port: defaults::smtp_port(),
            username: String::new(),
            password: String::new(),
        }
    }
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("smtp_server", &self.smtp_server)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Message envelope settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "defaults::subject")]
    pub subject: String,

    #[serde(default)]
    pub sender_mail: String,

    #[serde(default)]
    pub receiver_mail: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            subject: defaults::subject(),
            sender_mail: String::new(),
            receiver_mail: String::new(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Source defaults
    pub fn url() -> String {
        "http://www.koeri.boun.edu.tr/scripts/lst0.asp".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; quakewatch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Bulletin layout defaults
    pub fn header_lines() -> usize {
        7
    }
    pub fn footer_row() -> usize {
        506
    }

    pub fn tracker_file() -> PathBuf {
        PathBuf::from("data/tracker")
    }

    // Mail defaults
    pub fn smtp_port() -> u16 {
        587
    }
    pub fn subject() -> String {
        "New earthquakes".into()
    }
}
