//! Email channel. The pending code lives on the user row and is cleared once used.

use chrono::Utc;

use crate::auth::{otp, password};
use crate::db::StoreError;
use crate::email;
use crate::flows::{AuthError, AuthSession};
use crate::models::{NewUser, OtpChallenge, User};
use crate::state::AppState;

async fn dispatch(state: &AppState, to: &str, challenge: &OtpChallenge) -> Result<(), AuthError> {
    email::send_otp(state.mailer.as_ref(), to, challenge)
        .await
        .map_err(|e| {
            tracing::error!("Failed to send email OTP: {e}");
            AuthError::EmailDispatchFailed(e)
        })
}

/// Create an unverified account and mail it a code.
///
/// The row is committed before the mail goes out and is kept if sending fails.
pub async fn register(state: &AppState, email: &str, password: &str) -> Result<User, AuthError> {
    if state.store.find_by_email(email).await?.is_some() {
        return Err(AuthError::EmailAlreadyExists);
    }

    let password_hash = password::hash(password).map_err(AuthError::Hashing)?;
    let challenge = otp::generate();

    let user = match state
        .store
        .insert(&NewUser::pending_email(email, password_hash, challenge.clone()))
        .await
    {
        Ok(user) => user,
        Err(StoreError::AlreadyExists) => return Err(AuthError::EmailAlreadyExists),
        Err(e) => return Err(e.into()),
    };
    tracing::info!(user = %user.external_id, "Registered email user");

    dispatch(state, email, &challenge).await?;
    Ok(user)
}

/// Consume the pending code for `user`. Nothing is written unless the code matches.
async fn consume_challenge(state: &AppState, mut user: User, code: &str) -> Result<User, AuthError> {
    otp::check(user.email_challenge().as_ref(), code, Utc::now())?;

    user.is_email_verified = true;
    user.clear_email_challenge();

    Ok(state.store.update(&user).await?)
}

/// Confirm a registration code and log the user in.
pub async fn verify_otp(state: &AppState, email: &str, code: &str) -> Result<AuthSession, AuthError> {
    let user = state
        .store
        .find_by_email(email)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    let user = consume_challenge(state, user, code).await?;
    tracing::info!(user = %user.external_id, "Email verified");

    AuthSession::issue(state, user)
}

/// Password login. Whether the email has been verified is not checked.
pub async fn login(state: &AppState, email: &str, password: &str) -> Result<AuthSession, AuthError> {
    let user = state
        .store
        .find_by_email(email)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    let valid = user
        .password_hash
        .as_deref()
        .is_some_and(|verifier| password::verify(password, verifier));
    if !valid {
        return Err(AuthError::InvalidPassword);
    }

    AuthSession::issue(state, user)
}

/// Replace the caller's email and password and mail a code to the new address.
/// The previous email is discarded.
pub async fn bind_start(
    state: &AppState,
    mut current: User,
    email: &str,
    password: &str,
) -> Result<User, AuthError> {
    if let Some(owner) = state.store.find_by_email(email).await? {
        if owner.external_id != current.external_id {
            return Err(AuthError::EmailAlreadyBound);
        }
    }

    let challenge = otp::generate();
    current.email = Some(email.to_string());
    current.password_hash = Some(password::hash(password).map_err(AuthError::Hashing)?);
    current.is_email_verified = false;
    current.set_email_challenge(challenge.clone());

    let user = match state.store.update(&current).await {
        Ok(user) => user,
        Err(StoreError::AlreadyExists) => return Err(AuthError::EmailAlreadyBound),
        Err(e) => return Err(e.into()),
    };

    dispatch(state, email, &challenge).await?;
    Ok(user)
}

/// Confirm the code sent by `bind_start`. No new token is issued.
pub async fn bind_verify(state: &AppState, current: User, code: &str) -> Result<User, AuthError> {
    let user = consume_challenge(state, current, code).await?;
    tracing::info!(user = %user.external_id, "Email bound");
    Ok(user)
}
