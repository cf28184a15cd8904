//! Service layer for the bulletin watcher.
//!
//! This module contains the business logic for:
//! - Bulletin decoding (`BulletinParser`)
//! - Notification delivery (`NotificationDispatcher`)

mod notifier;
mod parser;

pub use notifier::NotificationDispatcher;
pub use parser::{BulletinParser, MalformedReason, MalformedRecord, ParsedBulletin};
