use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum UserRole {
    User,
    Tailor,
    Admin,
}

/// Channel through which the account was first created. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "auth_provider", rename_all = "lowercase")]
pub enum AuthProvider {
    Local,
    Phone,
    Email,
}

/// An outstanding email verification code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpChallenge {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct User {
    pub id: i64,
    #[serde(rename = "uuid")]
    pub external_id: Uuid,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub auth_provider: AuthProvider,
    pub is_active: bool,
    pub is_phone_verified: bool,
    pub is_email_verified: bool,
    pub role: UserRole,
    #[serde(skip_serializing)]
    pub email_otp_code: Option<String>,
    #[serde(skip_serializing)]
    pub email_otp_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The pending email challenge, if both halves are present.
    pub fn email_challenge(&self) -> Option<OtpChallenge> {
        match (&self.email_otp_code, self.email_otp_expires_at) {
            (Some(code), Some(expires_at)) => Some(OtpChallenge {
                code: code.clone(),
                expires_at,
            }),
            _ => None,
        }
    }

    pub fn set_email_challenge(&mut self, challenge: OtpChallenge) {
        self.email_otp_code = Some(challenge.code);
        self.email_otp_expires_at = Some(challenge.expires_at);
    }

    pub fn clear_email_challenge(&mut self) {
        self.email_otp_code = None;
        self.email_otp_expires_at = None;
    }
}

/// Column values for a row about to be inserted. The store assigns `id`
/// and the timestamps.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub external_id: Uuid,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub password_hash: Option<String>,
    pub auth_provider: AuthProvider,
    pub is_phone_verified: bool,
    pub is_email_verified: bool,
    pub role: UserRole,
    pub email_challenge: Option<OtpChallenge>,
}

impl NewUser {
    /// A user whose phone number was just approved by the SMS provider.
    pub fn verified_phone(phone_number: &str) -> Self {
        Self {
            external_id: Uuid::new_v4(),
            email: None,
            phone_number: Some(phone_number.to_string()),
            password_hash: None,
            auth_provider: AuthProvider::Phone,
            is_phone_verified: true,
            is_email_verified: false,
            role: UserRole::User,
            email_challenge: None,
        }
    }

    /// A user registered by email, awaiting the code in `challenge`.
    pub fn pending_email(email: &str, password_hash: String, challenge: OtpChallenge) -> Self {
        Self {
            external_id: Uuid::new_v4(),
            email: Some(email.to_string()),
            phone_number: None,
            password_hash: Some(password_hash),
            auth_provider: AuthProvider::Email,
            is_phone_verified: false,
            is_email_verified: false,
            role: UserRole::User,
            email_challenge: Some(challenge),
        }
    }
}
