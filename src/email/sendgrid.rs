use async_trait::async_trait;
use serde_json::json;

use super::EmailSender;
use crate::config::SendGridConfig;
use crate::providers::ProviderError;

const SENDGRID_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// SendGrid v3 mail-send API.
pub struct SendGridMailer {
    client: reqwest::Client,
    url: String,
    api_key: String,
    from: String,
}

impl SendGridMailer {
    pub fn new(config: &SendGridConfig) -> Result<Self, String> {
        Self::with_url(config, SENDGRID_URL)
    }

    pub fn with_url(config: &SendGridConfig, url: &str) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .map_err(|e| format!("Failed to build SendGrid client: {e}"))?;

        Ok(Self {
            client,
            url: url.to_string(),
            api_key: config.api_key.clone(),
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl EmailSender for SendGridMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), ProviderError> {
        let payload = json!({
            "personalizations": [{ "to": [{ "email": to }] }],
            "from": { "email": self.from },
            "subject": subject,
            "content": [
                { "type": "text/plain", "value": text_body },
                { "type": "text/html", "value": html_body },
            ],
        });

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Rejected { status, body });
        }

        Ok(())
    }
}
