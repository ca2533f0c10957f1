pub mod twilio;

use async_trait::async_trait;
use thiserror::Error;

pub use twilio::TwilioVerify;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("provider returned {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

/// Outcome of checking a code with the SMS provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Approved,
    Denied,
}

/// Provider-side reference to a started verification.
#[derive(Debug, Clone)]
pub struct ChallengeHandle {
    pub id: String,
    pub status: String,
}

/// Out-of-band phone verification. The provider owns the code and its expiry.
#[async_trait]
pub trait SmsVerifier: Send + Sync {
    async fn create_challenge(&self, phone_number: &str) -> Result<ChallengeHandle, ProviderError>;

    async fn check_challenge(
        &self,
        phone_number: &str,
        code: &str,
    ) -> Result<CheckStatus, ProviderError>;
}

/// Stand-in for a provider missing from the environment; every call fails.
pub struct Unconfigured;

#[async_trait]
impl SmsVerifier for Unconfigured {
    async fn create_challenge(&self, _: &str) -> Result<ChallengeHandle, ProviderError> {
        Err(ProviderError::NotConfigured("SMS provider"))
    }

    async fn check_challenge(&self, _: &str, _: &str) -> Result<CheckStatus, ProviderError> {
        Err(ProviderError::NotConfigured("SMS provider"))
    }
}
