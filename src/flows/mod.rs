//! Registration, login, verification and bind use cases for both channels.
//!
//! Flows return typed `AuthError`s; the HTTP layer decides how much of each
//! one a client gets to see.

pub mod email;
pub mod phone;

use serde::Serialize;
use thiserror::Error;

use crate::auth::jwt::TokenError;
use crate::auth::otp::ChallengeFailure;
use crate::db::StoreError;
use crate::models::User;
use crate::providers::ProviderError;
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid or expired OTP")]
    InvalidOrExpiredOtp,
    #[error("verification provider failed: {0}")]
    Provider(#[from] ProviderError),
    #[error("phone number conflicted on insert but no user row exists")]
    InternalRace,
    #[error("a user with this email already exists")]
    EmailAlreadyExists,
    #[error("failed to send email OTP: {0}")]
    EmailDispatchFailed(ProviderError),
    #[error("user not found")]
    UserNotFound,
    #[error("no email verification code is pending")]
    OtpNotPending,
    #[error("email verification code has expired")]
    OtpExpired,
    #[error("invalid verification code")]
    InvalidCode,
    #[error("invalid password")]
    InvalidPassword,
    #[error("email already bound to another user")]
    EmailAlreadyBound,
    #[error("phone number already bound to another user")]
    PhoneAlreadyBound,
    #[error("storage failed: {0}")]
    Store(StoreError),
    #[error("token issue failed: {0}")]
    Token(#[from] TokenError),
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Inconsistent(_) => AuthError::InternalRace,
            other => AuthError::Store(other),
        }
    }
}

impl From<ChallengeFailure> for AuthError {
    fn from(failure: ChallengeFailure) -> Self {
        match failure {
            ChallengeFailure::NotPending => AuthError::OtpNotPending,
            ChallengeFailure::Expired => AuthError::OtpExpired,
            ChallengeFailure::Mismatch => AuthError::InvalidCode,
        }
    }
}

/// A freshly issued access token together with the user it names.
#[derive(Debug, Serialize)]
pub struct AuthSession {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: User,
}

impl AuthSession {
    fn issue(state: &AppState, user: User) -> Result<Self, AuthError> {
        let access_token = state.tokens.issue(user.external_id, None)?;
        Ok(Self {
            access_token,
            token_type: "Bearer",
            user,
        })
    }
}
