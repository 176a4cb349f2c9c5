//! Invitation delivery.
//!
//! Uses SMTP via lettre when configured; otherwise invitations are only
//! logged so a local setup can copy the link from the output.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Everything a recipient needs to accept an invitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvitationMessage {
    pub recipient: String,
    pub company_name: String,
    pub inviter_name: String,
    pub role: String,
    pub accept_url: String,
}

impl InvitationMessage {
    /// Subject line.
    #[must_use]
    pub fn subject(&self) -> String {
        format!("You're invited to join {} on Tally", self.company_name)
    }

    /// Plain-text body.
    #[must_use]
    pub fn body(&self) -> String {
        format!(
            "{inviter} has invited you to join {company} as {article} {role}.\n\n\
             Accept the invitation here:\n{url}\n\n\
             If you weren't expecting this, you can ignore this email.\n",
            inviter = self.inviter_name,
            company = self.company_name,
            article = if self.role.starts_with(['a', 'e', 'i', 'o', 'u']) { "an" } else { "a" },
            role = self.role,
            url = self.accept_url,
        )
    }
}

/// Delivers invitations to their recipients.
#[async_trait]
pub trait InviteNotifier: Send + Sync {
    /// Send one invitation.
    ///
    /// # Errors
    ///
    /// Returns error if delivery fails.
    async fn send_invitation(&self, message: &InvitationMessage) -> Result<(), EmailError>;
}

/// SMTP invitation sender.
#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpNotifier {
    /// Create a new sender from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl InviteNotifier for SmtpNotifier {
    async fn send_invitation(&self, message: &InvitationMessage) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(message
                .recipient
                .parse()
                .map_err(|_| EmailError::InvalidAddress(message.recipient.clone()))?)
            .subject(message.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body())?;

        self.mailer.send(email).await?;

        tracing::info!(to = %message.recipient, "Invitation email sent");
        Ok(())
    }
}

/// Notifier that only logs, used when SMTP is not configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl InviteNotifier for LogNotifier {
    async fn send_invitation(&self, message: &InvitationMessage) -> Result<(), EmailError> {
        tracing::info!(
            to = %message.recipient,
            company = %message.company_name,
            accept_url = %message.accept_url,
            "SMTP not configured; invitation not emailed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(role: &str) -> InvitationMessage {
        InvitationMessage {
            recipient: "new@acme.test".to_owned(),
            company_name: "Acme".to_owned(),
            inviter_name: "Grace Hopper".to_owned(),
            role: role.to_owned(),
            accept_url: "https://tally.test/accept-invite?token=abc".to_owned(),
        }
    }

    #[test]
    fn test_body_contains_link_and_role() {
        let body = message("manager").body();
        assert!(body.contains("Grace Hopper has invited you to join Acme as a manager."));
        assert!(body.contains("https://tally.test/accept-invite?token=abc"));
        assert!(message("employee").body().contains("as an employee"));
    }

    #[test]
    fn test_subject_names_company() {
        assert_eq!(message("employee").subject(), "You're invited to join Acme on Tally");
    }

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        assert!(LogNotifier.send_invitation(&message("employee")).await.is_ok());
    }
}
