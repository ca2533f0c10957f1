use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{ChallengeHandle, CheckStatus, ProviderError, SmsVerifier};
use crate::config::TwilioConfig;

const VERIFY_BASE_URL: &str = "https://verify.twilio.com/v2";

#[derive(Debug, Deserialize)]
struct VerificationResponse {
    sid: String,
    status: String,
}

/// Twilio Verify v2 client.
pub struct TwilioVerify {
    client: reqwest::Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    service_sid: String,
}

impl TwilioVerify {
    pub fn new(config: &TwilioConfig) -> Result<Self, String> {
        Self::with_base_url(config, VERIFY_BASE_URL)
    }

    /// Point the client at another host, e.g. a local stub.
    pub fn with_base_url(config: &TwilioConfig, base_url: &str) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .map_err(|e| format!("Failed to build Twilio client: {e}"))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            service_sid: config.verify_service_sid.clone(),
        })
    }

    async fn post_form(
        &self,
        resource: &str,
        form: &[(&str, &str)],
    ) -> Result<reqwest::Response, ProviderError> {
        let url = format!("{}/Services/{}/{resource}", self.base_url, self.service_sid);

        self.client
            .post(url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(form)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))
    }
}

async fn rejected(response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ProviderError::Rejected { status, body }
}

#[async_trait]
impl SmsVerifier for TwilioVerify {
    async fn create_challenge(&self, phone_number: &str) -> Result<ChallengeHandle, ProviderError> {
        let response = self
            .post_form("Verifications", &[("To", phone_number), ("Channel", "sms")])
            .await?;

        if !response.status().is_success() {
            let err = rejected(response).await;
            tracing::warn!("Twilio refused to start verification: {err}");
            return Err(err);
        }

        let body: VerificationResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        Ok(ChallengeHandle {
            id: body.sid,
            status: body.status,
        })
    }

    async fn check_challenge(
        &self,
        phone_number: &str,
        code: &str,
    ) -> Result<CheckStatus, ProviderError> {
        let response = self
            .post_form("VerificationCheck", &[("To", phone_number), ("Code", code)])
            .await?;

        // Twilio answers 404 once the verification has expired, been used up or never existed.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(CheckStatus::Denied);
        }

        if !response.status().is_success() {
            let err = rejected(response).await;
            tracing::warn!("Twilio verification check failed: {err}");
            return Err(err);
        }

        let body: VerificationResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        if body.status == "approved" {
            Ok(CheckStatus::Approved)
        } else {
            Ok(CheckStatus::Denied)
        }
    }
}
