use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::flows::AuthError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Bad Request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Bad Gateway: {0}")]
    BadGateway(String),
    #[error("Internal Error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = json!({ "error": message });
        let mut response = (status, axum::Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidOrExpiredOtp => AppError::BadRequest("Invalid or expired OTP".to_string()),
            AuthError::Provider(e) => {
                tracing::error!("Verification provider error: {e}");
                AppError::BadGateway("Verification provider unavailable".to_string())
            }
            AuthError::EmailDispatchFailed(_) => {
                AppError::BadGateway("Failed to send verification email".to_string())
            }
            AuthError::EmailAlreadyExists => AppError::Conflict("User already exists".to_string()),
            AuthError::EmailAlreadyBound => {
                AppError::Conflict("Email already bound to another user".to_string())
            }
            AuthError::PhoneAlreadyBound => {
                AppError::Conflict("Phone number already bound to another user".to_string())
            }
            AuthError::UserNotFound => AppError::NotFound("User not found".to_string()),
            AuthError::InvalidPassword => AppError::Unauthorized("Invalid credentials".to_string()),
            AuthError::OtpNotPending => {
                AppError::BadRequest("No email verification code pending".to_string())
            }
            AuthError::OtpExpired => AppError::BadRequest("Email OTP expired".to_string()),
            AuthError::InvalidCode => AppError::BadRequest("Invalid verification code".to_string()),
            e @ (AuthError::InternalRace
            | AuthError::Store(_)
            | AuthError::Token(_)
            | AuthError::Hashing(_)) => {
                AppError::Internal(e.to_string())
            }
        }
    }
}
