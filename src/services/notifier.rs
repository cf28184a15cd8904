// src/services/notifier.rs

//! Notification dispatcher service.
//!
//! Turns matched records into one plain-text message and hands it to the
//! mail transport. Failures are returned to the caller untouched; retrying is
//! left to the next scheduled run.

use crate::error::DispatchError;
use crate::mail::{DispatchAck, MailMessage, MailTransport};
use crate::models::{EarthquakeRecord, NotificationConfig};

/// Service for sending earthquake notifications.
pub struct NotificationDispatcher<'a> {
    transport: &'a dyn MailTransport,
}

impl<'a> NotificationDispatcher<'a> {
    pub fn new(transport: &'a dyn MailTransport) -> Self {
        Self { transport }
    }

    /// Build the message for the given records.
    ///
    /// The body is the records' raw bulletin lines joined by newlines.
    pub fn compose(
        records: &[EarthquakeRecord],
        config: &NotificationConfig,
    ) -> Result<MailMessage, DispatchError> {
        if records.is_empty() {
            return Err(DispatchError::EmptyMessage);
        }

        let body = records
            .iter()
            .map(|record| record.raw.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(MailMessage {
            from: config.sender_mail.clone(),
            to: config.receiver_mail.clone(),
            subject: config.subject.clone(),
            body,
        })
    }

    /// Compose and send a single notification.
    pub async fn dispatch(
        &self,
        records: &[EarthquakeRecord],
        config: &NotificationConfig,
    ) -> Result<DispatchAck, DispatchError> {
        let message = Self::compose(records, config)?;
        log::info!(
            "Sending notification for {} record(s) to {}",
            records.len(),
            message.to
        );

        let ack = self.transport.send(&message).await?;
        log::info!("Notification accepted: {} {}", ack.code, ack.message);
        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::services::BulletinParser;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<MailMessage>>,
        fail: bool,
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn send(&self, message: &MailMessage) -> Result<DispatchAck, DispatchError> {
            if self.fail {
                return Err(DispatchError::transport("535 authentication rejected"));
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(DispatchAck {
                code: "250".to_string(),
                message: "OK".to_string(),
            })
        }
    }

    fn config() -> NotificationConfig {
        NotificationConfig {
            subject: "Deprem".to_string(),
            sender_mail: "alerts@example.com".to_string(),
            receiver_mail: "me@example.com".to_string(),
        }
    }

    fn records() -> Vec<EarthquakeRecord> {
        [
            "2024.01.01 11:00:00 38.00 27.00 5.0 -.- 5.1 -.- AEGEAN SEA",
            "2024.01.01 10:00:00 38.00 27.00 5.0 -.- 4.7 -.- AEGEAN SEA",
        ]
        .iter()
        .enumerate()
        .map(|(i, line)| BulletinParser::decode_line(i + 7, line).unwrap())
        .collect()
    }

    #[test]
    fn test_compose_joins_raw_lines() {
        let message = NotificationDispatcher::compose(&records(), &config()).unwrap();
        assert_eq!(
            message.body,
            "2024.01.01 11:00:00 38.00 27.00 5.0 -.- 5.1 -.- AEGEAN SEA\n\
             2024.01.01 10:00:00 38.00 27.00 5.0 -.- 4.7 -.- AEGEAN SEA"
        );
        assert_eq!(message.subject, "Deprem");
        assert_eq!(message.from, "alerts@example.com");
        assert_eq!(message.to, "me@example.com");
    }

    #[test]
    fn test_compose_refuses_empty() {
        assert!(matches!(
            NotificationDispatcher::compose(&[], &config()),
            Err(DispatchError::EmptyMessage)
        ));
    }

    #[tokio::test]
    async fn test_dispatch_sends_once() {
        let transport = RecordingTransport::default();
        let ack = NotificationDispatcher::new(&transport)
            .dispatch(&records(), &config())
            .await
            .unwrap();

        assert_eq!(ack.code, "250");
        assert_eq!(transport.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_reports_transport_failure() {
        let transport = RecordingTransport {
            fail: true,
            ..RecordingTransport::default()
        };
        let err = NotificationDispatcher::new(&transport)
            .dispatch(&records(), &config())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Transport(_)));
    }
}
