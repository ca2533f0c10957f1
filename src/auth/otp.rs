use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use subtle::ConstantTimeEq;

use crate::models::OtpChallenge;

pub const CODE_LENGTH: usize = 6;
pub const VALIDITY_MINUTES: i64 = 10;

/// Why a submitted email code was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeFailure {
    NotPending,
    Expired,
    Mismatch,
}

/// A fresh 6-digit code expiring ten minutes from now.
pub fn generate() -> OtpChallenge {
    generate_at(Utc::now())
}

pub fn generate_at(now: DateTime<Utc>) -> OtpChallenge {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    OtpChallenge {
        code: format!("{n:0width$}", width = CODE_LENGTH),
        expires_at: now + Duration::minutes(VALIDITY_MINUTES),
    }
}

/// Check `submitted` against the pending challenge. Expiry is judged before
/// the code, so a correct but late code still reports `Expired`.
pub fn check(
    pending: Option<&OtpChallenge>,
    submitted: &str,
    now: DateTime<Utc>,
) -> Result<(), ChallengeFailure> {
    let challenge = pending.ok_or(ChallengeFailure::NotPending)?;

    if now > challenge.expires_at {
        return Err(ChallengeFailure::Expired);
    }

    if bool::from(challenge.code.as_bytes().ct_eq(submitted.as_bytes())) {
        Ok(())
    } else {
        Err(ChallengeFailure::Mismatch)
    }
}
