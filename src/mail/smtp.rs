//! SMTP transport using STARTTLS and password authentication.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::response::Response;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::error::DispatchError;
use crate::mail::{DispatchAck, MailMessage, MailTransport};
use crate::models::MailConfig;

/// Mail transport backed by an authenticated SMTP relay.
pub struct SmtpMailTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailTransport {
    /// Build a STARTTLS transport for the configured relay.
    ///
    /// No connection is opened until the first message is sent.
    pub fn new(config: &MailConfig) -> Result<Self, DispatchError> {
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server)
            .map_err(DispatchError::transport)?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self { mailer })
    }

    fn build_message(message: &MailMessage) -> Result<Message, DispatchError> {
        let from: Mailbox = message
            .from
            .parse()
            .map_err(|e| DispatchError::address("sender", &message.from, e))?;
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| DispatchError::address("recipient", &message.to, e))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject.clone())
            .date_now()
            .message_id(None)
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| DispatchError::Build(e.to_string()))
    }

    /// Reply code plus the reply lines joined by spaces.
    fn acknowledge(response: &Response) -> DispatchAck {
        DispatchAck {
            code: response.code().to_string(),
            message: response.message().collect::<Vec<_>>().join(" "),
        }
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, message: &MailMessage) -> Result<DispatchAck, DispatchError> {
        let email = Self::build_message(message)?;
        let response = self
            .mailer
            .send(email)
            .await
            .map_err(DispatchError::transport)?;

        Ok(Self::acknowledge(&response))
    }
}
