//! Opaque refresh tokens.
//!
//! A refresh token is nothing but entropy: 256 bytes from the OS CSPRNG,
//! hex-encoded. Nothing is signed; once issued, validity is decided
//! entirely by store lookup (exists, not expired, not revoked).

use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};
use crate::REFRESH_TOKEN_BYTES;

/// Generate a new opaque refresh token: 512 hex characters.
///
/// # Errors
///
/// Returns [`AuthError::Entropy`] if the OS random source cannot be read.
/// This is fatal; there is no weaker fallback.
pub fn generate() -> AuthResult<String> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AuthError::Entropy(e.to_string()))?;
    Ok(hex::encode(bytes))
}

/// Validity of a stored refresh token, derived at read time.
///
/// `Revoked` and `Expired` are terminal; there is no transition out of
/// either. No sweep process exists, the state is recomputed on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// Usable: not revoked, not past its expiry
    Active,
    /// `revoked_at` is set; wins over expiry when both hold
    Revoked,
    /// `expires_at` has passed without an explicit revocation
    Expired,
}

/// A refresh token as persisted by the store.
///
/// Revocation is logical: `revoked_at` is set, the row stays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    /// The opaque token string (512 hex characters)
    pub token: String,

    /// Owning user
    pub user_id: Uuid,

    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,

    /// Set at revocation time, never cleared
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRecord {
    /// Compute the token's state as of `now`.
    pub fn state(&self, now: DateTime<Utc>) -> TokenState {
        if self.revoked_at.is_some() {
            TokenState::Revoked
        } else if self.expires_at <= now {
            TokenState::Expired
        } else {
            TokenState::Active
        }
    }

    /// Check if the token is usable as of `now`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.state(now) == TokenState::Active
    }
}
