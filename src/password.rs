//! Password hashing and verification.
//!
//! One-way bcrypt hashing; the plaintext is never stored and the stored
//! hash is never reversible. Comparison timing is owned by the bcrypt
//! primitive.

use crate::error::{AuthError, AuthResult};

/// Default bcrypt cost factor.
pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

/// Hash a password with the default cost.
///
/// # Errors
///
/// Returns [`AuthError::Hashing`] if the hashing primitive fails. This is
/// fatal to the request; it must never be degraded to a weaker scheme.
pub fn hash_password(password: &str) -> AuthResult<String> {
    hash_password_with_cost(password, DEFAULT_COST)
}

/// Hash a password with an explicit bcrypt cost.
///
/// Lower costs are for tests; production callers should stay at
/// [`DEFAULT_COST`] or above.
pub fn hash_password_with_cost(password: &str, cost: u32) -> AuthResult<String> {
    bcrypt::hash(password, cost).map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Verify a password against a stored hash.
///
/// A mismatch is [`AuthError::CredentialMismatch`]; callers collapse it
/// together with unknown-email lookups into one generic unauthorized
/// outcome, so nothing reveals which check failed. A stored hash that does
/// not parse is an internal fault, not a mismatch.
pub fn verify_password(hashed: &str, password: &str) -> AuthResult<()> {
    match bcrypt::verify(password, hashed) {
        Ok(true) => Ok(()),
        Ok(false) => Err(AuthError::CredentialMismatch),
        Err(e) => Err(AuthError::Hashing(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // minimum bcrypt cost, keeps the test suite fast
    const TEST_COST: u32 = 4;

    #[test]
    fn test_hash_verify_round_trip() {
        let hash = hash_password_with_cost("correct horse battery staple", TEST_COST).unwrap();
        assert!(verify_password(&hash, "correct horse battery staple").is_ok());
    }

    #[test]
    fn test_wrong_password_rejected() {
        let hash = hash_password_with_cost("hunter2", TEST_COST).unwrap();
        assert!(matches!(
            verify_password(&hash, "hunter3"),
            Err(AuthError::CredentialMismatch)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password_with_cost("same-password", TEST_COST).unwrap();
        let b = hash_password_with_cost("same-password", TEST_COST).unwrap();
        assert_ne!(a, b);
        assert!(verify_password(&a, "same-password").is_ok());
        assert!(verify_password(&b, "same-password").is_ok());
    }

    #[test]
    fn test_garbage_hash_is_internal_fault() {
        assert!(matches!(
            verify_password("not-a-bcrypt-hash", "whatever"),
            Err(AuthError::Hashing(_))
        ));
    }
}
