use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use sha2::{Digest, Sha256};

/// Collapse a plaintext of any length to the 64-char hex SHA-256 digest that
/// is actually fed to Argon2, so the slow hash always sees a bounded input.
fn prehash(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

fn argon2() -> Result<Argon2<'static>, String> {
    let params = Params::new(19 * 1024, 2, 1, None).map_err(|e| format!("Invalid params: {e}"))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password using SHA-256 then Argon2id (19MB memory, 2 iterations, parallelism 1).
///
/// The returned PHC string carries its own salt and cost parameters.
pub fn hash(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);

    argon2()?
        .hash_password(prehash(password).as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| format!("Hashing failed: {e}"))
}

/// Verify a password against a stored verifier. A verifier that does not parse
/// counts as a mismatch.
pub fn verify(password: &str, verifier: &str) -> bool {
    let parsed = match PasswordHash::new(verifier) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("Stored password verifier is malformed: {e}");
            return false;
        }
    };

    Argon2::default()
        .verify_password(prehash(password).as_bytes(), &parsed)
        .is_ok()
}
