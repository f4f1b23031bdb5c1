//! SMTP delivery through `lettre`.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use spinandsell_core::error::DomainError;
use spinandsell_core::mail::{Mailer, OutboundEmail};

const PROVIDER: &str = "smtp";

/// Connection settings for the SMTP relay.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender, e.g. `SpinAndSell <ventas@spinandsell.com>`.
    pub from: String,
}

/// Sends mail over a pooled STARTTLS connection.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("from", &self.from.to_string())
            .finish_non_exhaustive()
    }
}

impl SmtpMailer {
    /// Builds the transport. No connection is opened until the first send.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ExternalProvider` for a bad relay host or sender
    /// address.
    pub fn new(settings: &SmtpSettings) -> Result<Self, DomainError> {
        let from = parse_mailbox(&settings.from)?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .map_err(|e| DomainError::provider(PROVIDER, e.to_string()))?
            .port(settings.port);

        if let (Some(user), Some(pass)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        } else {
            tracing::warn!(host = %settings.host, "SMTP configured without credentials");
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, DomainError> {
    address
        .parse()
        .map_err(|e| DomainError::provider(PROVIDER, format!("invalid address {address:?}: {e}")))
}

/// Builds the MIME message for `email`.
pub(crate) fn build_message(from: &Mailbox, email: &OutboundEmail) -> Result<Message, DomainError> {
    Message::builder()
        .from(from.clone())
        .to(parse_mailbox(&email.to)?)
        .subject(email.subject.as_str())
        .header(ContentType::TEXT_HTML)
        .body(email.html.clone())
        .map_err(|e| DomainError::provider(PROVIDER, e.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    #[tracing::instrument(skip_all, fields(to = %email.to))]
    async fn send(&self, email: &OutboundEmail) -> Result<(), DomainError> {
        let message = build_message(&self.from, email)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| DomainError::provider(PROVIDER, e.to_string()))?;
        tracing::debug!("e-mail delivered");
        Ok(())
    }
}
