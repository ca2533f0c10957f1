use std::sync::LazyLock;

use axum::extract::State;
use axum::Json;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::auth::extractor::CurrentUser;
use crate::error::AppError;
use crate::flows::{self, AuthError, AuthSession};
use crate::models::User;
use crate::state::SharedState;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$")
        .unwrap()
});

#[derive(Deserialize)]
pub struct PhoneRequest {
    pub phone_number: String,
}

#[derive(Deserialize)]
pub struct PhoneVerifyRequest {
    pub phone_number: String,
    pub code: String,
}

#[derive(Deserialize)]
pub struct EmailPasswordRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct EmailVerifyRequest {
    pub email: String,
    pub code: String,
}

#[derive(Deserialize)]
pub struct CodeRequest {
    pub code: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct EmailAck {
    pub message: String,
    pub email: Option<String>,
}

#[derive(Serialize)]
pub struct PhoneAck {
    pub message: String,
    pub phone_number: Option<String>,
}

fn phone_number(raw: &str) -> Result<&str, AppError> {
    let phone = raw.trim();
    if !(5..=32).contains(&phone.chars().count()) {
        return Err(AppError::BadRequest(
            "Phone number must be 5 to 32 characters".to_string(),
        ));
    }
    Ok(phone)
}

fn code(raw: &str) -> Result<&str, AppError> {
    let code = raw.trim();
    if !(4..=10).contains(&code.chars().count()) {
        return Err(AppError::BadRequest(
            "Code must be 4 to 10 characters".to_string(),
        ));
    }
    Ok(code)
}

/// Validate an address and lowercase its domain. The local part keeps its case.
fn email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim();
    if email.len() > 255 || !EMAIL_RE.is_match(email) {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    let (local, domain) = email
        .rsplit_once('@')
        .ok_or_else(|| AppError::BadRequest("Invalid email address".to_string()))?;
    Ok(format!("{local}@{}", domain.to_ascii_lowercase()))
}

fn new_password(raw: &str) -> Result<&str, AppError> {
    if !(6..=128).contains(&raw.chars().count()) {
        return Err(AppError::BadRequest(
            "Password must be 6 to 128 characters".to_string(),
        ));
    }
    Ok(raw)
}

pub async fn phone_send_otp(
    State(state): State<SharedState>,
    Json(req): Json<PhoneRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let phone = phone_number(&req.phone_number)?;

    flows::phone::request_otp(&state, phone).await?;

    Ok(Json(MessageResponse {
        message: "OTP sent".to_string(),
    }))
}

pub async fn phone_verify_otp(
    State(state): State<SharedState>,
    Json(req): Json<PhoneVerifyRequest>,
) -> Result<Json<AuthSession>, AppError> {
    let phone = phone_number(&req.phone_number)?;
    let code = code(&req.code)?;

    let session = flows::phone::verify_otp(&state, phone, code).await?;
    Ok(Json(session))
}

pub async fn email_register(
    State(state): State<SharedState>,
    Json(req): Json<EmailPasswordRequest>,
) -> Result<Json<EmailAck>, AppError> {
    let email = email(&req.email)?;
    let password = new_password(&req.password)?;

    let user = flows::email::register(&state, &email, password).await?;

    Ok(Json(EmailAck {
        message: "Please check your email for the verification code".to_string(),
        email: user.email,
    }))
}

pub async fn email_verify_otp(
    State(state): State<SharedState>,
    Json(req): Json<EmailVerifyRequest>,
) -> Result<Json<AuthSession>, AppError> {
    let email = email(&req.email)?;
    let code = code(&req.code)?;

    let session = flows::email::verify_otp(&state, &email, code).await?;
    Ok(Json(session))
}

pub async fn email_login(
    State(state): State<SharedState>,
    Json(req): Json<EmailPasswordRequest>,
) -> Result<Json<AuthSession>, AppError> {
    let email = email(&req.email)?;

    match flows::email::login(&state, &email, &req.password).await {
        Ok(session) => Ok(Json(session)),
        Err(AuthError::UserNotFound | AuthError::InvalidPassword) => {
            Err(AppError::Unauthorized("Invalid credentials".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

pub async fn bind_email_start(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<EmailPasswordRequest>,
) -> Result<Json<EmailAck>, AppError> {
    let email = email(&req.email)?;
    let password = new_password(&req.password)?;

    let user = flows::email::bind_start(&state, user, &email, password).await?;

    Ok(Json(EmailAck {
        message: "Please check your email for the verification code".to_string(),
        email: user.email,
    }))
}

pub async fn bind_email_verify(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CodeRequest>,
) -> Result<Json<EmailAck>, AppError> {
    let code = code(&req.code)?;

    let user = flows::email::bind_verify(&state, user, code).await?;

    Ok(Json(EmailAck {
        message: "Email successfully verified and linked to your account".to_string(),
        email: user.email,
    }))
}

pub async fn bind_phone_start(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<PhoneRequest>,
) -> Result<Json<PhoneAck>, AppError> {
    let phone = phone_number(&req.phone_number)?;

    flows::phone::bind_start(&state, &user, phone).await?;

    Ok(Json(PhoneAck {
        message: "Please check your phone for the verification code".to_string(),
        phone_number: Some(phone.to_string()),
    }))
}

pub async fn bind_phone_verify(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<PhoneVerifyRequest>,
) -> Result<Json<PhoneAck>, AppError> {
    let phone = phone_number(&req.phone_number)?;
    let code = code(&req.code)?;

    let user = flows::phone::bind_verify(&state, user, phone, code).await?;

    Ok(Json(PhoneAck {
        message: "Phone number successfully verified and linked to your account".to_string(),
        phone_number: user.phone_number,
    }))
}
