//! Phone channel. The SMS provider holds the code and its expiry; locally we
//! only record that a number has been verified.

use crate::db::{self, StoreError};
use crate::flows::{AuthError, AuthSession};
use crate::models::User;
use crate::providers::CheckStatus;
use crate::state::AppState;

/// Ask the SMS provider to text a code to `phone_number`. Touches no local state.
pub async fn request_otp(state: &AppState, phone_number: &str) -> Result<(), AuthError> {
    let handle = state.sms.create_challenge(phone_number).await?;
    tracing::info!(challenge = %handle.id, status = %handle.status, "Phone verification started");
    Ok(())
}

async fn check(state: &AppState, phone_number: &str, code: &str) -> Result<(), AuthError> {
    match state.sms.check_challenge(phone_number, code).await? {
        CheckStatus::Approved => Ok(()),
        CheckStatus::Denied => Err(AuthError::InvalidOrExpiredOtp),
    }
}

/// Log in or sign up with a provider-approved code. The first approval for an
/// unknown number creates the account.
pub async fn verify_otp(
    state: &AppState,
    phone_number: &str,
    code: &str,
) -> Result<AuthSession, AuthError> {
    check(state, phone_number, code).await?;

    let user = db::create_or_get_by_phone(state.store.as_ref(), phone_number).await?;
    tracing::info!(user = %user.external_id, "Phone verified");

    AuthSession::issue(state, user)
}

/// Start moving `current` onto `phone_number`, unless another account owns it.
pub async fn bind_start(
    state: &AppState,
    current: &User,
    phone_number: &str,
) -> Result<(), AuthError> {
    if let Some(owner) = state.store.find_by_phone(phone_number).await? {
        if owner.external_id != current.external_id {
            return Err(AuthError::PhoneAlreadyBound);
        }
    }

    request_otp(state, phone_number).await
}

/// Attach `phone_number` to `current` once the provider approves the code.
pub async fn bind_verify(
    state: &AppState,
    mut current: User,
    phone_number: &str,
    code: &str,
) -> Result<User, AuthError> {
    check(state, phone_number, code).await?;

    current.phone_number = Some(phone_number.to_string());
    current.is_phone_verified = true;

    let user = match state.store.update(&current).await {
        Ok(user) => user,
        Err(StoreError::AlreadyExists) => return Err(AuthError::PhoneAlreadyBound),
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user = %user.external_id, "Phone number bound");
    Ok(user)
}
