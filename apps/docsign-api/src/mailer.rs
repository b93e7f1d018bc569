//! Mail delivery for composed notifications
//!
//! With `SMTP_HOST` configured messages go out through the lettre async SMTP
//! transport. Without it they are kept in an in-memory outbox and logged,
//! which is what local development and the test suite run against. The
//! outbox is unbounded, so production configuration refuses to start without
//! SMTP.

use docsign_core::MailMessage;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tokio::sync::Mutex;

use crate::config::SmtpConfig;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(String),

    #[error("Message has no recipients")]
    NoRecipients,
}

enum Transport {
    Smtp {
        transport: AsyncSmtpTransport<Tokio1Executor>,
        from: Mailbox,
    },
    Outbox(Mutex<Vec<MailMessage>>),
}

pub struct Mailer {
    transport: Transport,
}

impl Mailer {
    pub fn smtp(config: &SmtpConfig) -> Result<Self, MailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port);
        if let (Some(user), Some(password)) = (&config.user, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(Self {
            transport: Transport::Smtp {
                transport: builder.build(),
                from: config.from.parse()?,
            },
        })
    }

    pub fn outbox() -> Self {
        Self {
            transport: Transport::Outbox(Mutex::new(Vec::new())),
        }
    }

    pub async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        if message.to.is_empty() {
            return Err(MailError::NoRecipients);
        }

        match &self.transport {
            Transport::Smtp { transport, from } => {
                let email = build_message(from, message)?;
                transport.send(email).await?;
            }
            Transport::Outbox(outbox) => {
                outbox.lock().await.push(message.clone());
            }
        }

        tracing::info!(
            recipients = message.to.len(),
            attachments = message.attachments.len(),
            subject = %message.subject,
            "Mail sent"
        );
        Ok(())
    }

    /// Messages captured by the outbox transport, oldest first
    pub async fn sent(&self) -> Vec<MailMessage> {
        match &self.transport {
            Transport::Outbox(outbox) => outbox.lock().await.clone(),
            Transport::Smtp { .. } => Vec::new(),
        }
    }
}

fn build_message(from: &Mailbox, message: &MailMessage) -> Result<Message, MailError> {
    let mut builder = Message::builder()
        .from(from.clone())
        .subject(message.subject.clone());
    for recipient in &message.to {
        builder = builder.to(Mailbox::new(
            Some(recipient.name.clone()),
            recipient.email.trim().parse()?,
        ));
    }

    let mut body = MultiPart::mixed().singlepart(SinglePart::html(message.html.clone()));
    for attachment in &message.attachments {
        let content_type = ContentType::parse(&attachment.content_type)
            .map_err(|e| MailError::Build(e.to_string()))?;
        body = body.singlepart(
            Attachment::new(attachment.filename.clone())
                .body(attachment.bytes.clone(), content_type),
        );
    }

    builder
        .multipart(body)
        .map_err(|e| MailError::Build(e.to_string()))
}
