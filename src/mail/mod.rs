//! Mail transport abstraction.
//!
//! The dispatcher builds a [`MailMessage`] and hands it to a
//! [`MailTransport`]; connection setup, TLS and authentication belong to the
//! transport.

#[cfg(feature = "smtp")]
pub mod smtp;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

#[cfg(feature = "smtp")]
pub use smtp::SmtpMailTransport;

/// A plain-text message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Server acknowledgement of an accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchAck {
    /// Reply code, e.g. `250`
    pub code: String,
    /// Reply text
    pub message: String,
}

/// Trait for outbound mail backends.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Submit one message. Implementations do not retry.
    async fn send(&self, message: &MailMessage) -> Result<DispatchAck, DispatchError>;
}
