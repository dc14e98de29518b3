use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use blake2::{Blake2b512, Digest};
use rand::RngCore;

use crate::auth::AuthError;
use crate::models::{MAX_PASSWORD_LEN, MIN_PASSWORD_LEN};

/// Generates a fresh salt and the Argon2 hash of `plain_password + salt`.
///
/// The salt is the hex digest of a Blake2b-512 hash of 60 random bytes.
/// Argon2's own internal salt (embedded in the returned PHC string) is
/// separate from this one; this salt exists only as an extra input to the
/// password material, folded in before Argon2 ever sees it.
pub fn generate_salt_and_hashed_password(plain_password: &str) -> Result<(String, String), AuthError> {
    let mut random_bytes = [0u8; 60];
    rand::thread_rng().fill_bytes(&mut random_bytes);

    let mut hasher = Blake2b512::new();
    hasher.update(random_bytes);
    let salt = hex::encode(hasher.finalize());

    let salted = format!("{plain_password}{salt}");
    let phc_salt = SaltString::generate(&mut OsRng);
    let hashed_password = Argon2::default()
        .hash_password(salted.as_bytes(), &phc_salt)
        .map_err(|_| AuthError::Hashing)?
        .to_string();

    Ok((salt, hashed_password))
}

/// Verifies `plain_password` against a stored `(salt, hashed_password)`
/// pair. A mismatch is `Ok(false)`, not an error — only a malformed stored
/// hash is an error.
pub fn verify_password(salt: &str, hashed_password: &str, plain_password: &str) -> Result<bool, AuthError> {
    let salted = format!("{plain_password}{salt}");
    let parsed_hash = PasswordHash::new(hashed_password).map_err(|_| AuthError::Hashing)?;
    Ok(Argon2::default().verify_password(salted.as_bytes(), &parsed_hash).is_ok())
}

/// `10-64` chars, at least one digit, one lowercase, one uppercase letter.
pub fn validate_password_policy(password: &str) -> bool {
    if password.len() < MIN_PASSWORD_LEN || password.len() > MAX_PASSWORD_LEN {
        return false;
    }
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    has_digit && has_lower && has_upper
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_hash_and_verify() {
        let (salt, hash) = generate_salt_and_hashed_password("Correcthorse1").unwrap();
        assert!(verify_password(&salt, &hash, "Correcthorse1").unwrap());
        assert!(!verify_password(&salt, &hash, "wrong").unwrap());
    }

    #[test]
    fn policy_requires_mixed_case_and_digit() {
        assert!(validate_password_policy("Correcthorse1"));
        assert!(!validate_password_policy("alllowercase1"));
        assert!(!validate_password_policy("ALLUPPERCASE1"));
        assert!(!validate_password_policy("NoDigitsHere"));
        assert!(!validate_password_policy("Short1"));
    }
}
