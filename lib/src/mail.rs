use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use lettre::message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::MailConfig;
use crate::error::Error;
use crate::render;
use crate::submission::Upload;

/// Name reported to callers for the fixed relay profile.
pub const PROVIDER: &str = "gmail";

const GMAIL_RELAY: &str = "smtp.gmail.com";

// Definition of future types for async use
pub type MailFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RelayError>> + Send + 'a>>;

/// Error reported by the relay itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayError {
    pub message: String,

    /// Relay-specific status code (an SMTP reply code for the lettre relay)
    pub code: Option<String>,
}

impl RelayError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl std::fmt::Display for RelayError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.code {
            Some(ref code) => write!(f, "{} ({})", self.message, code),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for RelayError {}

impl From<lettre::transport::smtp::Error> for RelayError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        Self {
            message: err.to_string(),
            code: err.status().map(|c| c.to_string()),
        }
    }
}

impl From<lettre::address::AddressError> for RelayError {
    fn from(err: lettre::address::AddressError) -> Self {
        Self::new(format!("Invalid address: {}", err))
    }
}

impl From<lettre::error::Error> for RelayError {
    fn from(err: lettre::error::Error) -> Self {
        Self::new(format!("Malformed message: {}", err))
    }
}

/// A binary part referenced from the HTML body via `cid:<content_id>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineAttachment {
    pub filename: String,
    pub content: Vec<u8>,
    pub content_id: String,
    pub content_type: String,
}

impl From<Upload> for InlineAttachment {
    fn from(upload: Upload) -> Self {
        // Trust the browser's type only when it claims an image
        let content_type = upload
            .content_type
            .filter(|c| c.starts_with("image/"))
            .unwrap_or_else(|| render::IMAGE_CONTENT_TYPE.to_string());

        Self {
            filename: render::IMAGE_FILENAME.to_string(),
            content: upload.data,
            content_id: render::IMAGE_CONTENT_ID.to_string(),
            content_type,
        }
    }
}

/// A fully rendered notification, ready for the relay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from_name: String,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub attachments: Vec<InlineAttachment>,
}

/// What the relay hands back for an accepted mail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub message_id: String,
    pub response: String,
}

/// An authenticated connection to a mail relay.
pub trait MailTransport: Send + Sync {
    /// Confirms the relay is reachable and accepts our credentials.
    fn verify(&self) -> MailFuture<'_, ()>;

    fn send(&self, mail: OutgoingMail) -> MailFuture<'_, Receipt>;
}

/// Builds a fresh transport for one request.
pub trait TransportFactory: Send + Sync {
    fn connect(&self, config: &MailConfig) -> Result<Box<dyn MailTransport>, Error>;
}

/// A mail session that has not been verified yet.
///
/// `verify` and `send` both consume the session, so a session is verified
/// at most once and sends at most one mail.
pub struct Session {
    transport: Box<dyn MailTransport>,
    timeout: Duration,
}

/// A session whose credentials the relay has accepted.
pub struct VerifiedSession {
    transport: Box<dyn MailTransport>,
    timeout: Duration,
}

impl Session {
    pub fn new(transport: Box<dyn MailTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    pub async fn verify(self) -> Result<VerifiedSession, Error> {
        let outcome = tokio::time::timeout(self.timeout, self.transport.verify()).await;

        match outcome {
            Ok(Ok(())) => {
                log::debug!("Relay verified");
                Ok(VerifiedSession {
                    transport: self.transport,
                    timeout: self.timeout,
                })
            }
            Ok(Err(e)) => Err(Error::Verification(e.message)),
            Err(_) => Err(Error::Verification(format!(
                "Relay did not respond within {}s",
                self.timeout.as_secs()
            ))),
        }
    }
}

impl VerifiedSession {
    pub async fn send(self, mail: OutgoingMail) -> Result<Receipt, Error> {
        let outcome = tokio::time::timeout(self.timeout, self.transport.send(mail)).await;

        let err = match outcome {
            Ok(Ok(receipt)) => return Ok(receipt),
            Ok(Err(e)) => e,
            Err(_) => RelayError::new(format!(
                "Relay did not accept the message within {}s",
                self.timeout.as_secs()
            )),
        };

        Err(Error::Send {
            message: err.message,
            code: err.code,
            env_present: None,
        })
    }
}

/// Connects to Gmail's SMTP relay over implicit TLS.
#[derive(Clone, Debug)]
pub struct SmtpTransportFactory {
    timeout: Option<Duration>,
}

impl SmtpTransportFactory {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

impl TransportFactory for SmtpTransportFactory {
    fn connect(&self, config: &MailConfig) -> Result<Box<dyn MailTransport>, Error> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(GMAIL_RELAY)
            .map_err(|e| Error::Verification(e.to_string()))?
            .credentials(Credentials::new(config.user.clone(), config.pass.clone()))
            .timeout(self.timeout)
            .build();

        Ok(Box::new(SmtpRelay { transport }))
    }
}

pub struct SmtpRelay {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

/// Message-IDs look like `<uuid@sender-domain>`.
fn new_message_id(from: &str) -> String {
    let domain = from
        .rsplit_once('@')
        .map(|(_, d)| d)
        .filter(|d| !d.is_empty())
        .unwrap_or("localhost");

    format!("<{}@{}>", uuid::Uuid::new_v4(), domain)
}

fn build_message(mail: OutgoingMail, message_id: &str) -> Result<Message, RelayError> {
    let from = Mailbox::new(Some(mail.from_name), mail.from.parse::<Address>()?);
    let to = Mailbox::new(None, mail.to.parse::<Address>()?);

    let builder = Message::builder()
        .from(from)
        .to(to)
        .subject(mail.subject)
        .message_id(Some(message_id.to_string()));

    let html = SinglePart::html(mail.html);

    if mail.attachments.is_empty() {
        return Ok(builder.singlepart(html)?);
    }

    let mut related = MultiPart::related().singlepart(html);
    for attachment in mail.attachments {
        let content_type = ContentType::parse(&attachment.content_type)
            .map_err(|e| RelayError::new(format!("Invalid attachment type: {}", e)))?;

        log::debug!(
            "Embedding {} ({} bytes) as cid:{}",
            attachment.filename,
            attachment.content.len(),
            attachment.content_id
        );

        related = related.singlepart(
            Attachment::new_inline(attachment.content_id).body(attachment.content, content_type),
        );
    }

    Ok(builder.multipart(related)?)
}

impl MailTransport for SmtpRelay {
    fn verify(&self) -> MailFuture<'_, ()> {
        Box::pin(async move {
            if self.transport.test_connection().await? {
                Ok(())
            } else {
                Err(RelayError::new("SMTP connection test failed"))
            }
        })
    }

    fn send(&self, mail: OutgoingMail) -> MailFuture<'_, Receipt> {
        Box::pin(async move {
            let message_id = new_message_id(&mail.from);
            let message = build_message(mail, &message_id)?;

            let response = self.transport.send(message).await?;
            let text = response
                .message()
                .map(|line| line.to_string())
                .collect::<Vec<_>>()
                .join(" ");

            Ok(Receipt {
                message_id,
                response: format!("{} {}", response.code(), text),
            })
        })
    }
}
