/*!
 * Mail Module
 * Contact-form notifications over SMTP (lettre), dispatched off the request path
 */
pub mod notifier;

use std::sync::Arc;

use async_trait::async_trait;
use lazy_static::lazy_static;
use lettre::message::header::{ContentType, ContentTypeErr};
use lettre::message::{Attachment, Mailbox, Message, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use thiserror::Error;

use crate::config::MailConfig;
use crate::db::models::Upload;

pub use notifier::Notifier;

lazy_static! {
    /// Both ends of a mailer whose configured addresses are unusable
    static ref UNCONFIGURED: Mailbox = "Portfolio <noreply@localhost>".parse().unwrap();
}

#[derive(Error, Debug)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("invalid content type: {0}")]
    ContentType(#[from] ContentTypeErr),

    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// What the site owner is told about a contact submission
#[derive(Debug, Clone)]
pub struct ContactNotification {
    pub sender_name: String,
    pub sender_email: String,
    pub message: String,
    pub voice_memo: Option<Upload>,
}

impl ContactNotification {
    /// The voice memo, if one with content was uploaded
    pub fn attached_memo(&self) -> Option<&Upload> {
        self.voice_memo.as_ref().filter(|m| !m.bytes.is_empty())
    }
}

/// Outbound transport seam
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, message: Message) -> Result<(), MailError>;
}

pub struct SmtpSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

#[async_trait]
impl MailSender for SmtpSender {
    async fn send(&self, message: Message) -> Result<(), MailError> {
        self.transport.send(message).await?;
        Ok(())
    }
}

/// Used when no SMTP host is configured; logs instead of sending
pub struct LogOnlySender;

#[async_trait]
impl MailSender for LogOnlySender {
    async fn send(&self, message: Message) -> Result<(), MailError> {
        tracing::info!(
            size = message.formatted().len(),
            "Mailer running in no-op mode; skipping actual send"
        );
        Ok(())
    }
}

/// File extension for a voice memo, picked from its declared content type
pub fn attachment_extension(content_type: &str) -> &'static str {
    let content_type = content_type.to_ascii_lowercase();
    ["webm", "mp4", "ogg", "wav"]
        .into_iter()
        .find(|ext| content_type.contains(ext))
        .unwrap_or("audio")
}

fn notification_body(name: &str, email: &str, message: &str) -> String {
    format!(
        "You have received a new message from your portfolio website!\n\n\
         From: {name}\n\
         Email: {email}\n\n\
         Message:\n\
         {message}\n\n\
         ---\n\
         This email was sent from your portfolio contact form.\n\
         Reply directly to this email to respond to {name}.\n"
    )
}

#[derive(Clone)]
pub struct Mailer {
    sender: Arc<dyn MailSender>,
    from: Mailbox,
    contact: Mailbox,
}

impl Mailer {
    pub fn new(sender: Arc<dyn MailSender>, from: Mailbox, contact: Mailbox) -> Self {
        Self {
            sender,
            from,
            contact,
        }
    }

    /// Build from configuration. An empty SMTP host yields a log-only mailer.
    pub fn from_config(config: &MailConfig) -> Result<Self, MailError> {
        let from: Mailbox = config.from.parse()?;
        let contact: Mailbox = config.contact_email.parse()?;

        if config.smtp_host.trim().is_empty() {
            tracing::warn!("SMTP host not configured; contact notifications will only be logged");
            return Ok(Self::new(Arc::new(LogOnlySender), from, contact));
        }

        let builder = if config.use_starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        }?
        .port(config.smtp_port);

        let builder = match (&config.smtp_username, &config.smtp_password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };

        let sender = SmtpSender {
            transport: builder.build(),
        };
        Ok(Self::new(Arc::new(sender), from, contact))
    }

    /// [`Mailer::from_config`], degrading to a log-only mailer when the
    /// configuration is unusable.
    pub fn from_config_or_log_only(config: &MailConfig) -> Self {
        match Self::from_config(config) {
            Ok(mailer) => mailer,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    from = %config.from,
                    contact = %config.contact_email,
                    "Invalid mail configuration: MAIL_FROM and CONTACT_EMAIL (default ADMIN_EMAIL) \
                     must be valid addresses. Contact notifications will only be logged"
                );
                Self::new(
                    Arc::new(LogOnlySender),
                    UNCONFIGURED.clone(),
                    UNCONFIGURED.clone(),
                )
            }
        }
    }

    /// Plain text without a voice memo, multipart/mixed with the recording attached otherwise.
    pub fn build_contact_message(
        &self,
        notification: &ContactNotification,
    ) -> Result<Message, MailError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(self.contact.clone());

        match notification.sender_email.parse::<Mailbox>() {
            Ok(reply_to) => builder = builder.reply_to(reply_to),
            Err(e) => tracing::warn!(error = %e, "sender email unusable as reply-to"),
        }

        let body = notification_body(
            &notification.sender_name,
            &notification.sender_email,
            &notification.message,
        );
        let subject = format!(
            "New Contact Form Submission from {}",
            notification.sender_name
        );

        let message = match notification.attached_memo() {
            None => builder
                .subject(subject)
                .header(ContentType::TEXT_PLAIN)
                .body(body)?,
            Some(memo) => {
                let content_type = ContentType::parse(&memo.content_type)
                    .or_else(|_| ContentType::parse("application/octet-stream"))?;
                let filename = format!("voice-memo.{}", attachment_extension(&memo.content_type));

                builder
                    .subject(format!("{subject} (Voice Memo Attached)"))
                    .multipart(
                        MultiPart::mixed()
                            .singlepart(
                                SinglePart::builder()
                                    .header(ContentType::TEXT_PLAIN)
                                    .body(body),
                            )
                            .singlepart(
                                Attachment::new(filename).body(memo.bytes.clone(), content_type),
                            ),
                    )?
            }
        };

        Ok(message)
    }

    /// Build and send one notification. Failures end here.
    pub async fn deliver(&self, notification: ContactNotification) {
        let has_attachment = notification.attached_memo().is_some();

        let message = match self.build_contact_message(&notification) {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(error = %e, "Failed to build contact notification email");
                return;
            }
        };

        match self.sender.send(message).await {
            Ok(()) => tracing::info!(
                to = %self.contact,
                has_attachment,
                "Contact notification email sent"
            ),
            Err(e) => tracing::error!(error = %e, "Failed to send contact notification email"),
        }
    }
}
