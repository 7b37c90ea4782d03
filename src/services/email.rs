use crate::config::email::{frontend_url, EmailConfig};
use crate::models::UserModel;
use anyhow::Result;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

/// Outgoing mail for the account flows. Implementations receive the
/// plaintext token, which is never persisted.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_activation_email(&self, user: &UserModel, token: &str) -> Result<()>;

    async fn send_password_reset_email(&self, user: &UserModel, token: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct EmailService {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_address: Option<String>,
    frontend_url: String,
}

impl EmailService {
    /// Build from environment variables. If SMTP is not configured, email
    /// sending is silently skipped (graceful degradation).
    pub fn from_env() -> Self {
        match EmailConfig::from_env() {
            Some(cfg) => {
                let creds = Credentials::new(cfg.smtp_username.clone(), cfg.smtp_password.clone());
                let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host)
                    .map(|builder| builder.port(cfg.smtp_port).credentials(creds).build());

                match transport {
                    Ok(t) => Self {
                        transport: Some(t),
                        from_address: Some(cfg.from_address),
                        frontend_url: cfg.frontend_url,
                    },
                    Err(e) => {
                        tracing::warn!("Failed to build SMTP transport: {e}");
                        Self::disabled(cfg.frontend_url)
                    }
                }
            }
            None => Self::disabled(frontend_url()),
        }
    }

    /// A service that logs and drops every message.
    pub fn disabled(frontend_url: String) -> Self {
        Self {
            transport: None,
            from_address: None,
            frontend_url,
        }
    }

    /// Returns true if SMTP is configured and available.
    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    pub fn activation_link(&self, email: &str, token: &str) -> String {
        format!(
            "{}/account_activations/{}/edit?email={}",
            self.frontend_url,
            token,
            urlencoding::encode(email)
        )
    }

    pub fn password_reset_link(&self, email: &str, token: &str) -> String {
        format!(
            "{}/password_resets/{}/edit?email={}",
            self.frontend_url,
            token,
            urlencoding::encode(email)
        )
    }

    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let transport = match &self.transport {
            Some(t) => t,
            None => {
                tracing::debug!("SMTP not configured, skipping email to {to}");
                return Ok(());
            }
        };
        let from_address = match &self.from_address {
            Some(f) => f,
            None => return Ok(()),
        };

        let from_mailbox: Mailbox =
            from_address
                .parse()
                .map_err(|e: lettre::address::AddressError| {
                    anyhow::anyhow!("Invalid from address '{}': {}", from_address, e)
                })?;
        let to_mailbox: Mailbox = to.parse().map_err(|e: lettre::address::AddressError| {
            anyhow::anyhow!("Invalid to address '{}': {}", to, e)
        })?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        transport.send(email).await?;
        tracing::info!("Email sent to {to}: {subject}");
        Ok(())
    }
}

#[async_trait]
impl Mailer for EmailService {
    async fn send_activation_email(&self, user: &UserModel, token: &str) -> Result<()> {
        let link = self.activation_link(&user.email, token);
        let body = format!(
            "Hi {},\n\nWelcome! Click the link below to activate your account:\n\n{}",
            user.name, link
        );

        self.send_email(&user.email, "Account activation", &body)
            .await
    }

    async fn send_password_reset_email(&self, user: &UserModel, token: &str) -> Result<()> {
        let link = self.password_reset_link(&user.email, token);
        let body = format!(
            "To reset your password click the link below:\n\n{}\n\n\
             This link will expire in two hours. \
             If you did not request this, you can safely ignore this email.",
            link
        );

        self.send_email(&user.email, "Password reset", &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_encode_email() {
        let service = EmailService::disabled("https://example.com".to_string());
        assert_eq!(
            service.activation_link("a+b@example.com", "tok"),
            "https://example.com/account_activations/tok/edit?email=a%2Bb%40example.com"
        );
        assert_eq!(
            service.password_reset_link("c@example.com", "tok"),
            "https://example.com/password_resets/tok/edit?email=c%40example.com"
        );
    }

    #[test]
    fn disabled_service_is_not_configured() {
        assert!(!EmailService::disabled(String::new()).is_configured());
    }
}
