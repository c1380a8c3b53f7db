//! Store trait and persisted record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthResult;
use crate::refresh::RefreshTokenRecord;

/// A user as persisted by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// User id, the subject of every token issued for this user
    pub id: Uuid,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Login email, unique per user
    pub email: String,

    /// Opaque bcrypt hash; never serialized into outward-facing values
    #[serde(skip_serializing, default)]
    pub hashed_password: String,
}

/// Trait for the keyed record store backing the session flows.
///
/// This is the orchestrator's entire view of persistence. Implement it to
/// plug in any backend; consistency (atomic revocation, unique token
/// lookup) is the implementation's responsibility, not the caller's.
/// Lookups return `Ok(None)` for absent rows; `Err` is reserved for store
/// faults.
///
/// # Example
///
/// ```rust,ignore
/// use chirpauth::{AuthStore, UserRecord};
/// use chirpauth::error::AuthResult;
///
/// struct MyStore {
///     // Your storage implementation
/// }
///
/// impl AuthStore for MyStore {
///     fn find_user_by_email(&self, email: &str) -> AuthResult<Option<UserRecord>> {
///         // Look up the user
///         Ok(None)
///     }
///     // ... implement other methods
/// }
/// ```
pub trait AuthStore: Send + Sync {
    /// Look up a user by login email.
    fn find_user_by_email(&self, email: &str) -> AuthResult<Option<UserRecord>>;

    /// Look up a user by id.
    fn find_user_by_id(&self, id: Uuid) -> AuthResult<Option<UserRecord>>;

    /// Create a user with an already-hashed password.
    fn create_user(&self, email: &str, hashed_password: &str) -> AuthResult<UserRecord>;

    /// Replace a user's email and password hash.
    fn update_user(&self, id: Uuid, email: &str, hashed_password: &str)
        -> AuthResult<UserRecord>;

    /// Persist a freshly issued refresh token.
    fn create_refresh_token(&self, record: &RefreshTokenRecord) -> AuthResult<()>;

    /// Look up a refresh token by its opaque string.
    fn find_refresh_token(&self, token: &str) -> AuthResult<Option<RefreshTokenRecord>>;

    /// Mark a refresh token revoked as of `revoked_at`.
    ///
    /// Must either fully apply or fail; no partial state. Revoking an
    /// unknown or already-revoked token is not an error, and an earlier
    /// revocation timestamp is kept.
    fn revoke_refresh_token(&self, token: &str, revoked_at: DateTime<Utc>) -> AuthResult<()>;

    /// Look up the user owning a refresh token.
    fn find_user_by_refresh_token(&self, token: &str) -> AuthResult<Option<UserRecord>>;
}
