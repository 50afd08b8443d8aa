/**
 * Secondary Delivery Channel
 *
 * Email copy of a notification for recipients who opted in. Delivery is
 * best-effort: the dispatcher runs it in the background under a timeout,
 * logs failures and never retries.
 *
 * # Implementations
 *
 * - [`SmtpMailer`] - SMTP via `lettre`, configured from `SMTP_*`
 * - [`DisabledChannel`] - used when `SMTP_HOST` is not set
 */

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

/// One rendered email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub title: String,
    pub body_html: String,
}

/// Secondary-channel failures
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Invalid address '{address}': {message}")]
    Address { address: String, message: String },

    #[error("Could not build message: {0}")]
    Build(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Delivery timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait SecondaryChannel: Send + Sync {
    async fn send(&self, email: OutboundEmail) -> Result<(), DeliveryError>;

    /// Whether sending does anything at all
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Escape HTML and turn line breaks into `<br>`
pub fn body_to_html(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    for c in body.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\r' => {}
            '\n' => out.push_str("<br>"),
            other => out.push(other),
        }
    }
    out
}

/// Make a notification link absolute for use outside the portal
pub fn absolute_link(link: &str, public_base_url: Option<&str>) -> String {
    match public_base_url {
        Some(base) if link.starts_with('/') => format!("{}{}", base.trim_end_matches('/'), link),
        _ => link.to_string(),
    }
}

fn html_document(email: &OutboundEmail) -> String {
    format!(
        "<html><body><h2>{}</h2><p>{}</p></body></html>",
        body_to_html(&email.title),
        email.body_html
    )
}

/// SMTP settings
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

/// Email over SMTP
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self, DeliveryError> {
        let from: Mailbox = settings.from.parse().map_err(|e: lettre::address::AddressError| {
            DeliveryError::Address {
                address: settings.from.clone(),
                message: e.to_string(),
            }
        })?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
            .map_err(|e| DeliveryError::Transport(e.to_string()))?
            .port(settings.port);
        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        tracing::info!("[Mailer] SMTP relay {}:{} configured", settings.host, settings.port);
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl SecondaryChannel for SmtpMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), DeliveryError> {
        let to: Mailbox = email.to.parse().map_err(|e: lettre::address::AddressError| {
            DeliveryError::Address {
                address: email.to.clone(),
                message: e.to_string(),
            }
        })?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.clone())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(format!("{}\n\n{}", email.title, email.body_html.replace("<br>", "\n"))),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_document(&email)),
                    ),
            )
            .map_err(|e| DeliveryError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        tracing::debug!("[Mailer] Sent '{}' to {}", email.subject, email.to);
        Ok(())
    }
}

/// Channel used when no SMTP relay is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledChannel;

#[async_trait]
impl SecondaryChannel for DisabledChannel {
    async fn send(&self, email: OutboundEmail) -> Result<(), DeliveryError> {
        tracing::debug!("[Mailer] Email disabled, dropping '{}' for {}", email.subject, email.to);
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
