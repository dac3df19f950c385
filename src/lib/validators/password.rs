use crate::error::ValidationError;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

const ORIGIN: &str = "validate_password";
const MIN_LENGTH: usize = 6;

/// Checks length and confirmation, then returns the salted hash of the password.
pub fn validate_password(password: &str, confirm: &str) -> Result<String, ValidationError> {
    if password.chars().count() < MIN_LENGTH {
        return Err(ValidationError::new(
            ORIGIN,
            format!("Password must be at least {} characters", MIN_LENGTH),
        ));
    }
    if password != confirm {
        return Err(ValidationError::new(
            ORIGIN,
            "Confirm password must equal password",
        ));
    }

    hash_password(password)
}

/// Argon2id with a random salt, encoded as a PHC string.
pub fn hash_password(password: &str) -> Result<String, ValidationError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ValidationError::new(ORIGIN, format!("Could not hash password: {}", e)))
}

/// False for a wrong password and for anything that is not a PHC hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
