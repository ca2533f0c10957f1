use std::net::IpAddr;

use jsonwebtoken::Algorithm;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt: JwtConfig,
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub twilio: Option<TwilioConfig>,
    pub mail: Option<MailConfig>,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub verify_service_sid: String,
}

#[derive(Debug, Clone)]
pub enum MailConfig {
    SendGrid(SendGridConfig),
    Smtp(SmtpConfig),
}

#[derive(Debug, Clone)]
pub struct SendGridConfig {
    pub api_key: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;

        let database_max_connections: u32 = env_or("DATABASE_MAX_CONNECTIONS", "10")
            .parse()
            .map_err(|e| format!("Invalid DATABASE_MAX_CONNECTIONS: {e}"))?;

        let jwt = JwtConfig {
            secret: env_required("JWT_SECRET")?,
            algorithm: parse_algorithm(&env_or("JWT_ALGORITHM", "HS256"))?,
            ttl_minutes: parse_ttl(&env_or("JWT_ACCESS_TOKEN_EXPIRE_MINUTES", "30"))?,
        };

        let host: IpAddr = env_or("APP_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid APP_HOST: {e}"))?;

        let port: u16 = env_or("APP_PORT", "8000")
            .parse()
            .map_err(|e| format!("Invalid APP_PORT: {e}"))?;

        let log_level = env_or("APP_LOG_LEVEL", "info");

        let twilio = twilio_settings(&env_optional)?;
        let mail = mail_settings(&env_optional)?;

        Ok(Config {
            database_url,
            database_max_connections,
            jwt,
            host,
            port,
            log_level,
            twilio,
            mail,
        })
    }
}

fn twilio_settings(get: &impl Fn(&str) -> Option<String>) -> Result<Option<TwilioConfig>, String> {
    match (
        get("TWILIO_ACCOUNT_SID"),
        get("TWILIO_AUTH_TOKEN"),
        get("TWILIO_VERIFY_SERVICE_SID"),
    ) {
        (Some(account_sid), Some(auth_token), Some(verify_service_sid)) => Ok(Some(TwilioConfig {
            account_sid,
            auth_token,
            verify_service_sid,
        })),
        (None, None, None) => Ok(None),
        _ => Err(
            "TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN and TWILIO_VERIFY_SERVICE_SID must be set together"
                .to_string(),
        ),
    }
}

/// SendGrid wins when both mail providers are configured. A partial SMTP
/// block is a startup error rather than a silently missing provider.
fn mail_settings(get: &impl Fn(&str) -> Option<String>) -> Result<Option<MailConfig>, String> {
    let sendgrid = match (get("SENDGRID_API_KEY"), get("EMAIL_FROM")) {
        (Some(api_key), Some(from)) => Some(SendGridConfig { api_key, from }),
        (Some(_), None) => return Err("SENDGRID_API_KEY requires EMAIL_FROM".to_string()),
        _ => None,
    };

    let smtp = match (
        get("SMTP_HOST"),
        get("SMTP_PORT"),
        get("SMTP_USER"),
        get("SMTP_PASS"),
        get("SMTP_FROM"),
    ) {
        (Some(host), Some(port), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
            host,
            port: port
                .parse()
                .map_err(|e| format!("Invalid SMTP_PORT: {e}"))?,
            user,
            pass,
            from,
        }),
        (None, None, None, None, None) => None,
        _ => {
            return Err(
                "SMTP_HOST, SMTP_PORT, SMTP_USER, SMTP_PASS and SMTP_FROM must be set together"
                    .to_string(),
            );
        }
    };

    Ok(sendgrid.map(MailConfig::SendGrid).or(smtp.map(MailConfig::Smtp)))
}

/// Only HMAC algorithms are accepted: tokens are signed with a shared secret.
pub fn parse_algorithm(value: &str) -> Result<Algorithm, String> {
    match value.trim().to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(format!("Unsupported JWT_ALGORITHM '{other}' (expected HS256, HS384 or HS512)")),
    }
}

fn parse_ttl(value: &str) -> Result<i64, String> {
    let minutes: i64 = value
        .parse()
        .map_err(|e| format!("Invalid JWT_ACCESS_TOKEN_EXPIRE_MINUTES: {e}"))?;
    if minutes <= 0 {
        return Err("JWT_ACCESS_TOKEN_EXPIRE_MINUTES must be positive".to_string());
    }
    Ok(minutes)
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
