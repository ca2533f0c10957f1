use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::JwtConfig;

/// Why a bearer token was refused. Callers outside this crate only ever see
/// one generic message; the variants exist for logs and tests.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature does not validate")]
    BadSignature,
    #[error("token has expired")]
    Expired,
    #[error("token carries no subject")]
    MissingSubject,
    #[error("token subject does not match any user")]
    UnknownSubject,
    #[error("token encode failed: {0}")]
    Encode(String),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// Mints and checks the HMAC-signed access tokens. Built once at startup.
#[derive(Clone)]
pub struct TokenService {
    algorithm: Algorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
    default_ttl: Duration,
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            algorithm: config.algorithm,
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            default_ttl: Duration::minutes(config.ttl_minutes),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Issue a token for `subject`, valid for `ttl` or the configured default.
    pub fn issue(&self, subject: Uuid, ttl: Option<Duration>) -> Result<String, TokenError> {
        self.issue_at(subject, ttl, Utc::now())
    }

    pub fn issue_at(
        &self,
        subject: Uuid,
        ttl: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: Some(subject.to_string()),
            iat: now.timestamp(),
            exp: (now + ttl.unwrap_or(self.default_ttl)).timestamp(),
        };
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    /// Check signature, expiry and subject, returning the subject's external id.
    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// As `verify`, judging expiry against `now`. A token is dead from its
    /// `exp` second onwards.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_required_spec_claims(&["exp"]);
        validation.validate_exp = false;

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::BadSignature
                }
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })?;

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        let subject = claims
            .sub
            .filter(|s| !s.is_empty())
            .ok_or(TokenError::MissingSubject)?;

        Uuid::parse_str(&subject).map_err(|_| TokenError::UnknownSubject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str, algorithm: Algorithm) -> TokenService {
        TokenService::new(&JwtConfig {
            secret: secret.to_string(),
            algorithm,
            ttl_minutes: 30,
        })
    }

    #[test]
    fn issued_token_yields_subject() {
        let tokens = service("test-secret", Algorithm::HS256);
        let id = Uuid::new_v4();

        let token = tokens.issue(id, None).unwrap();

        assert_eq!(tokens.verify(&token).unwrap(), id);
    }

    #[test]
    fn default_ttl_comes_from_config() {
        let tokens = service("test-secret", Algorithm::HS256);
        let now = Utc::now();
        let id = Uuid::new_v4();
        let token = tokens.issue_at(id, None, now).unwrap();

        let just_before = now + Duration::minutes(30) - Duration::seconds(1);
        assert_eq!(tokens.verify_at(&token, just_before).unwrap(), id);
        assert_eq!(
            tokens.verify_at(&token, now + Duration::minutes(30)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn explicit_ttl_overrides_default() {
        let tokens = service("test-secret", Algorithm::HS256);
        let now = Utc::now();
        let token = tokens
            .issue_at(Uuid::new_v4(), Some(Duration::minutes(5)), now)
            .unwrap();

        assert!(tokens.verify_at(&token, now + Duration::minutes(4)).is_ok());
        assert_eq!(
            tokens.verify_at(&token, now + Duration::minutes(6)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn already_expired_token_is_refused() {
        let tokens = service("test-secret", Algorithm::HS256);
        let token = tokens
            .issue(Uuid::new_v4(), Some(Duration::seconds(-10)))
            .unwrap();

        assert_eq!(tokens.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn foreign_secret_fails_signature() {
        let ours = service("test-secret", Algorithm::HS256);
        let theirs = service("other-secret", Algorithm::HS256);
        let token = theirs.issue(Uuid::new_v4(), None).unwrap();

        assert_eq!(ours.verify(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn algorithm_mismatch_is_refused() {
        let hs256 = service("test-secret", Algorithm::HS256);
        let hs512 = service("test-secret", Algorithm::HS512);
        let token = hs512.issue(Uuid::new_v4(), None).unwrap();

        assert_eq!(hs256.verify(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn garbage_is_malformed() {
        let tokens = service("test-secret", Algorithm::HS256);
        assert_eq!(tokens.verify("not.a.token"), Err(TokenError::Malformed));
        assert_eq!(tokens.verify(""), Err(TokenError::Malformed));
    }

    #[test]
    fn missing_subject_is_refused() {
        let tokens = service("test-secret", Algorithm::HS256);
        let now = Utc::now().timestamp();
        let token = tokens
            .sign(&Claims {
                sub: None,
                iat: now,
                exp: now + 600,
            })
            .unwrap();

        assert_eq!(tokens.verify(&token), Err(TokenError::MissingSubject));
    }

    #[test]
    fn non_uuid_subject_is_unknown() {
        let tokens = service("test-secret", Algorithm::HS256);
        let now = Utc::now().timestamp();
        let token = tokens
            .sign(&Claims {
                sub: Some("a@x.com".to_string()),
                iat: now,
                exp: now + 600,
            })
            .unwrap();

        assert_eq!(tokens.verify(&token), Err(TokenError::UnknownSubject));
    }
}
