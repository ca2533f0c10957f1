pub mod auth;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Phone
        .route("/api/v1/auth/phone/send-otp", post(auth::phone_send_otp))
        .route("/api/v1/auth/phone/verify-otp", post(auth::phone_verify_otp))
        // Email
        .route("/api/v1/auth/email/register", post(auth::email_register))
        .route("/api/v1/auth/email/verify-otp", post(auth::email_verify_otp))
        .route("/api/v1/auth/email/login", post(auth::email_login))
        // Current user
        .route("/api/v1/auth/me", get(auth::me))
        .route("/api/v1/auth/me/bind-email-start", post(auth::bind_email_start))
        .route("/api/v1/auth/me/bind-email-verify", post(auth::bind_email_verify))
        .route("/api/v1/auth/me/bind-phone-start", post(auth::bind_phone_start))
        .route("/api/v1/auth/me/bind-phone-verify", post(auth::bind_phone_verify))
}

pub fn health_routes() -> Router<SharedState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/db", get(health_db))
}

async fn health() -> &'static str {
    "ok"
}

async fn health_db(State(state): State<SharedState>) -> Result<Json<Value>, AppError> {
    state
        .store
        .ping()
        .await
        .map_err(|e| AppError::Internal(format!("Database health check failed: {e}")))?;
    Ok(Json(json!({ "status": "ok" })))
}
