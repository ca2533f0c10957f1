pub mod auth;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod flows;
pub mod models;
pub mod providers;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::{Config, MailConfig};
use crate::email::{EmailSender, SendGridMailer, SmtpMailer};
use crate::providers::{SmsVerifier, TwilioVerify, Unconfigured};
use crate::state::SharedState;

/// SMS verifier for the configured provider, or `Unconfigured` when there is none.
pub fn sms_from_config(config: &Config) -> Arc<dyn SmsVerifier> {
    let Some(twilio) = &config.twilio else {
        tracing::warn!("Twilio not configured; phone verification is unavailable");
        return Arc::new(Unconfigured);
    };

    match TwilioVerify::new(twilio) {
        Ok(client) => {
            tracing::info!("Twilio Verify configured");
            Arc::new(client)
        }
        Err(e) => {
            tracing::warn!("Twilio Verify not available: {e}");
            Arc::new(Unconfigured)
        }
    }
}

/// Email sender for the configured provider, or `Unconfigured` when there is none.
pub fn mailer_from_config(config: &Config) -> Arc<dyn EmailSender> {
    let built = match &config.mail {
        Some(MailConfig::SendGrid(sendgrid)) => {
            SendGridMailer::new(sendgrid).map(|m| Arc::new(m) as Arc<dyn EmailSender>)
        }
        Some(MailConfig::Smtp(smtp)) => {
            SmtpMailer::new(smtp).map(|m| Arc::new(m) as Arc<dyn EmailSender>)
        }
        None => Err("no SENDGRID_* or SMTP_* settings".to_string()),
    };

    match built {
        Ok(mailer) => {
            tracing::info!("Email delivery configured");
            mailer
        }
        Err(e) => {
            tracing::warn!("Email delivery not available: {e}");
            Arc::new(Unconfigured)
        }
    }
}

pub fn build_app(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::api_routes())
        .merge(routes::health_routes())
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("cache-control"),
            HeaderValue::from_static("no-store"),
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
