pub mod sendgrid;
pub mod templates;

use async_trait::async_trait;
use lettre::message::MultiPart;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::models::OtpChallenge;
use crate::providers::{ProviderError, Unconfigured};

pub use sendgrid::SendGridMailer;

/// Outbound mail delivery.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), ProviderError>;
}

/// Mail the verification code in `challenge` to `to`.
pub async fn send_otp(
    sender: &dyn EmailSender,
    to: &str,
    challenge: &OtpChallenge,
) -> Result<(), ProviderError> {
    let (text, html) = templates::render_email_otp(&challenge.code, challenge.expires_at);
    sender.send(to, templates::OTP_SUBJECT, &text, &html).await
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, String> {
        let creds = Credentials::new(config.user.clone(), config.pass.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| format!("SMTP error: {e}"))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl EmailSender for SmtpMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), ProviderError> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| ProviderError::Transport(format!("Invalid from address: {e}")))?,
            )
            .to(to
                .parse()
                .map_err(|e| ProviderError::Transport(format!("Invalid to address: {e}")))?)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(
                text_body.to_string(),
                html_body.to_string(),
            ))
            .map_err(|e| ProviderError::Transport(format!("Failed to build email: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| ProviderError::Transport(format!("Failed to send email: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl EmailSender for Unconfigured {
    async fn send(&self, _: &str, _: &str, _: &str, _: &str) -> Result<(), ProviderError> {
        Err(ProviderError::NotConfigured("Email provider"))
    }
}
