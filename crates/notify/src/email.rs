use async_trait::async_trait;
use lettre::message::{Mailbox, Message, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tracing::info;
use vigil_core::notify::error::NotifyError;
use vigil_core::notify::port::Notifier;

/// # Summary
/// A notifier implementation that sends plain-text alert emails over SMTP with STARTTLS.
///
/// # Invariants
/// - Sender and recipient addresses are validated once, at construction.
/// - At least one recipient is configured.
/// - The `AsyncSmtpTransport` is reused for multiple notifications.
pub struct EmailNotifier {
    /// The asynchronous SMTP transport.
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    /// The sender's mailbox.
    from: Mailbox,
    /// Every mailbox that receives each alert.
    to: Vec<Mailbox>,
}

impl EmailNotifier {
    /// # Summary
    /// Creates a new `EmailNotifier`.
    ///
    /// # Logic
    /// 1. Parses the sender and every recipient address.
    /// 2. Configures a STARTTLS relay on the given port with authentication.
    ///
    /// # Arguments
    /// * `host` - The SMTP server host (e.g., "smtp.gmail.com").
    /// * `port` - The submission port, usually 587.
    /// * `user` - The SMTP username.
    /// * `pass` - The SMTP password or app-specific password.
    /// * `from` - The sender's email address.
    /// * `recipients` - The recipients' email addresses.
    ///
    /// # Returns
    /// * A new instance of `EmailNotifier`, or `NotifyError::Config` for bad addresses or host.
    pub fn new(
        host: &str,
        port: u16,
        user: &str,
        pass: &str,
        from: &str,
        recipients: &[String],
    ) -> Result<Self, NotifyError> {
        let from = parse_mailbox(from)?;
        let to = recipients
            .iter()
            .map(|r| parse_mailbox(r))
            .collect::<Result<Vec<_>, _>>()?;
        if to.is_empty() {
            return Err(NotifyError::Config("No email recipients configured".into()));
        }

        let creds = Credentials::new(user.to_string(), pass.to_string());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| NotifyError::Config(format!("Invalid SMTP host: {}", e)))?
            .port(port)
            .credentials(creds)
            .build();

        Ok(Self { mailer, from, to })
    }

    /// # Summary
    /// Opens a session against the SMTP server and authenticates, without sending mail.
    ///
    /// # Returns
    /// * `Ok(())` if the server accepted the connection.
    /// * `Err(NotifyError::Network)` otherwise.
    pub async fn test_connection(&self) -> Result<(), NotifyError> {
        let ok = self
            .mailer
            .test_connection()
            .await
            .map_err(|e| NotifyError::Network(format!("SMTP error: {}", e)))?;
        if !ok {
            return Err(NotifyError::Network("SMTP server rejected the connection".into()));
        }
        info!("SMTP connection verified");
        Ok(())
    }

    fn build_message(&self, subject: &str, content: &str) -> Result<Message, NotifyError> {
        self.to
            .iter()
            .fold(Message::builder().from(self.from.clone()), |builder, mailbox| {
                builder.to(mailbox.clone())
            })
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(content.to_string())
            .map_err(|e| NotifyError::Platform(format!("Failed to build email: {}", e)))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address
        .trim()
        .parse()
        .map_err(|e| NotifyError::Config(format!("Invalid address {}: {}", address, e)))
}

#[async_trait]
impl Notifier for EmailNotifier {
    /// # Summary
    /// Sends a notification email to every configured recipient.
    ///
    /// # Logic
    /// 1. Builds a plain-text message addressed to all recipients.
    /// 2. Sends it using the configured SMTP transport.
    ///
    /// # Returns
    /// * `Ok(())` if the email was successfully sent.
    /// * `Err(NotifyError)` if a build, network or SMTP error occurs.
    async fn notify(&self, subject: &str, content: &str) -> Result<(), NotifyError> {
        let email = self.build_message(subject, content)?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| NotifyError::Network(format!("SMTP error: {}", e)))?;

        info!("Email sent to {} recipient(s): {}", self.to.len(), subject);
        Ok(())
    }
}
