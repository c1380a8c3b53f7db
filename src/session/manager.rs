//! Session flow composition: login, refresh, revoke, write gating.

use chrono::{Duration, Utc};
use http::HeaderMap;
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};
use crate::header;
use crate::password;
use crate::refresh::{self, RefreshTokenRecord, TokenState};
use crate::session::store::{AuthStore, UserRecord};
use crate::token::AccessTokenCodec;

/// Configuration for a [`SessionManager`].
///
/// Everything the flows need is explicit here; nothing is read from
/// ambient global state. Both TTLs are configuration, not constants.
#[derive(Clone)]
pub struct SessionConfig {
    /// Symmetric signing secret for access tokens (minimum 32 bytes)
    pub secret: Vec<u8>,

    /// Access token lifetime (default: 10 minutes). Used at login and at
    /// refresh; access tokens are not revocable, they only expire.
    pub access_ttl: Duration,

    /// Refresh token lifetime (default: 1 hour; short for the genre, kept
    /// from the original deployment and adjustable here)
    pub refresh_ttl: Duration,

    /// bcrypt cost for newly hashed passwords (default:
    /// [`password::DEFAULT_COST`])
    pub bcrypt_cost: u32,
}

impl SessionConfig {
    /// Create a configuration with the given signing secret and defaults
    /// for everything else.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            access_ttl: Duration::minutes(10),
            refresh_ttl: Duration::hours(1),
            bcrypt_cost: password::DEFAULT_COST,
        }
    }

    /// Set the access token lifetime.
    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    /// Set the refresh token lifetime.
    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    /// Set the bcrypt cost for newly hashed passwords.
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }
}

/// A successful login: the user plus both credentials.
#[derive(Debug, Clone)]
pub struct Login {
    /// The authenticated user
    pub user: UserRecord,

    /// Short-lived signed access token
    pub access_token: String,

    /// Long-lived opaque refresh token, persisted against the user
    pub refresh_token: String,
}

/// Composes hasher, codec, extractor and issuer into the session flows.
///
/// Owns no mutable state; the store is the only shared resource, and its
/// consistency is its own responsibility. Safe to share across requests.
///
/// # Example
///
/// ```rust,ignore
/// use chirpauth::{SessionConfig, SessionManager, SqliteAuthStore};
///
/// let store = SqliteAuthStore::in_memory()?;
/// let manager = SessionManager::new(store, SessionConfig::new(secret))?;
///
/// let login = manager.login("alice@example.com", "password")?;
/// // hand login.access_token and login.refresh_token to the client
/// ```
pub struct SessionManager<S: AuthStore> {
    store: S,
    codec: AccessTokenCodec,
    access_ttl: Duration,
    refresh_ttl: Duration,
    bcrypt_cost: u32,
}

impl<S: AuthStore> SessionManager<S> {
    /// Create a manager over a store.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidSecret`] if the configured secret is
    /// unusable; the misconfiguration surfaces at startup, not per
    /// request.
    pub fn new(store: S, config: SessionConfig) -> AuthResult<Self> {
        let codec = AccessTokenCodec::new(&config.secret)?;
        Ok(Self {
            store,
            codec,
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
            bcrypt_cost: config.bcrypt_cost,
        })
    }

    /// Register a new user.
    ///
    /// The password is hashed here; the plaintext never reaches the store.
    pub fn register(&self, email: &str, password_plain: &str) -> AuthResult<UserRecord> {
        let hashed = password::hash_password_with_cost(password_plain, self.bcrypt_cost)?;
        self.store.create_user(email, &hashed)
    }

    /// Log a user in: verify the credential, mint both tokens.
    ///
    /// Unknown email and wrong password both surface as
    /// [`AuthError::CredentialMismatch`]; nothing distinguishes which
    /// check failed.
    pub fn login(&self, email: &str, password_plain: &str) -> AuthResult<Login> {
        let user = self
            .store
            .find_user_by_email(email)?
            .ok_or(AuthError::CredentialMismatch)?;

        password::verify_password(&user.hashed_password, password_plain).inspect_err(|_| {
            tracing::debug!(email, "login rejected");
        })?;

        let access_token = self.codec.issue(user.id, self.access_ttl)?;

        let refresh_token = refresh::generate()?;
        let record = RefreshTokenRecord {
            token: refresh_token.clone(),
            user_id: user.id,
            expires_at: Utc::now() + self.refresh_ttl,
            revoked_at: None,
        };
        self.store.create_refresh_token(&record)?;

        Ok(Login {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Swap a valid refresh token for a new access token.
    ///
    /// The refresh token itself is not rotated; it stays valid until its
    /// own expiry or an explicit revoke. Internally the failure is
    /// [`AuthError::TokenNotFound`] / [`AuthError::TokenRevoked`] /
    /// [`AuthError::TokenExpired`]; all three collapse to the same
    /// outward response.
    pub fn refresh(&self, headers: &HeaderMap) -> AuthResult<String> {
        let token = header::bearer_token(headers)?;

        let record = self
            .store
            .find_refresh_token(&token)?
            .ok_or(AuthError::TokenNotFound)?;

        match record.state(Utc::now()) {
            TokenState::Revoked => Err(AuthError::TokenRevoked),
            TokenState::Expired => Err(AuthError::TokenExpired),
            TokenState::Active => {
                let user = self
                    .store
                    .find_user_by_refresh_token(&token)?
                    .ok_or(AuthError::TokenNotFound)?;
                self.codec.issue(user.id, self.access_ttl)
            }
        }
    }

    /// Revoke the refresh token presented in the header.
    ///
    /// Revoking an already-revoked token succeeds quietly. The store
    /// mutation either fully applies or the call reports failure.
    pub fn revoke(&self, headers: &HeaderMap) -> AuthResult<()> {
        let token = header::bearer_token(headers)?;
        self.store.revoke_refresh_token(&token, Utc::now())?;
        tracing::debug!("refresh token revoked");
        Ok(())
    }

    /// Authenticate a request: extract and validate the access token,
    /// returning the subject user id.
    pub fn authenticate(&self, headers: &HeaderMap) -> AuthResult<Uuid> {
        let token = header::bearer_token(headers)?;
        self.codec.validate(&token)
    }

    /// Gate a write on resource ownership.
    ///
    /// The authenticated subject must equal `owner`; a mismatch is
    /// [`AuthError::OwnershipMismatch`], deliberately distinct from the
    /// unauthenticated failures (403 vs 401), without revealing who the
    /// owner is.
    pub fn authorize_owner(&self, headers: &HeaderMap, owner: Uuid) -> AuthResult<Uuid> {
        let subject = self.authenticate(headers)?;
        if subject != owner {
            tracing::warn!(%subject, "write rejected: subject does not own resource");
            return Err(AuthError::OwnershipMismatch);
        }
        Ok(subject)
    }

    /// Self-service credential update: the authenticated subject replaces
    /// its own email and password.
    pub fn update_credentials(
        &self,
        headers: &HeaderMap,
        email: &str,
        password_plain: &str,
    ) -> AuthResult<UserRecord> {
        let subject = self.authenticate(headers)?;
        let hashed = password::hash_password_with_cost(password_plain, self.bcrypt_cost)?;
        self.store.update_user(subject, email, &hashed)
    }

    /// Access the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(all(test, feature = "store-sqlite"))]
mod tests {
    use super::*;
    use crate::session::sqlite::SqliteAuthStore;
    use http::header::AUTHORIZATION;
    use http::HeaderValue;

    const TEST_SECRET: &[u8; 32] = b"test-secret-key-32bytes-long!!!!";

    fn manager() -> SessionManager<SqliteAuthStore> {
        let store = SqliteAuthStore::in_memory().unwrap();
        let config = SessionConfig::new(&TEST_SECRET[..]).with_bcrypt_cost(4);
        SessionManager::new(store, config).unwrap()
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn test_login_issues_both_tokens() {
        let manager = manager();
        let user = manager.register("alice@example.com", "s3cret").unwrap();

        let login = manager.login("alice@example.com", "s3cret").unwrap();
        assert_eq!(login.user.id, user.id);
        assert_eq!(login.refresh_token.len(), 512);

        let subject = manager.authenticate(&bearer(&login.access_token)).unwrap();
        assert_eq!(subject, user.id);
    }

    #[test]
    fn test_login_failures_collapse() {
        let manager = manager();
        manager.register("bob@example.com", "right-password").unwrap();

        // unknown email and wrong password are indistinguishable
        let unknown = manager.login("nobody@example.com", "whatever");
        let wrong = manager.login("bob@example.com", "wrong-password");
        assert!(matches!(unknown, Err(AuthError::CredentialMismatch)));
        assert!(matches!(wrong, Err(AuthError::CredentialMismatch)));
    }

    #[test]
    fn test_refresh_returns_same_subject() {
        let manager = manager();
        let user = manager.register("carol@example.com", "pw").unwrap();
        let login = manager.login("carol@example.com", "pw").unwrap();

        let new_access = manager.refresh(&bearer(&login.refresh_token)).unwrap();
        let subject = manager.authenticate(&bearer(&new_access)).unwrap();
        assert_eq!(subject, user.id);
    }

    #[test]
    fn test_refresh_token_is_not_rotated() {
        let manager = manager();
        manager.register("dave@example.com", "pw").unwrap();
        let login = manager.login("dave@example.com", "pw").unwrap();

        // the same opaque token keeps working until revoked or expired
        manager.refresh(&bearer(&login.refresh_token)).unwrap();
        manager.refresh(&bearer(&login.refresh_token)).unwrap();
    }

    #[test]
    fn test_revoked_token_fails_as_revoked() {
        let manager = manager();
        manager.register("erin@example.com", "pw").unwrap();
        let login = manager.login("erin@example.com", "pw").unwrap();
        let headers = bearer(&login.refresh_token);

        manager.revoke(&headers).unwrap();

        // revoked, not not-found: the row is kept
        assert!(matches!(
            manager.refresh(&headers),
            Err(AuthError::TokenRevoked)
        ));

        // a second revoke is not an error
        manager.revoke(&headers).unwrap();
    }

    #[test]
    fn test_unknown_refresh_token_fails_as_not_found() {
        let manager = manager();
        let headers = bearer(&"0".repeat(512));
        assert!(matches!(
            manager.refresh(&headers),
            Err(AuthError::TokenNotFound)
        ));
    }

    #[test]
    fn test_expired_refresh_token_rejected() {
        let manager = manager();
        let user = manager.register("frank@example.com", "pw").unwrap();

        let token = refresh::generate().unwrap();
        let record = RefreshTokenRecord {
            token: token.clone(),
            user_id: user.id,
            expires_at: Utc::now() - Duration::seconds(1),
            revoked_at: None,
        };
        manager.store().create_refresh_token(&record).unwrap();

        assert!(matches!(
            manager.refresh(&bearer(&token)),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_ownership_gate() {
        let manager = manager();
        let owner = manager.register("grace@example.com", "pw").unwrap();
        let intruder = manager.register("mallory@example.com", "pw").unwrap();
        let login = manager.login("mallory@example.com", "pw").unwrap();
        let headers = bearer(&login.access_token);

        // valid token, foreign resource: ownership mismatch, not invalid-token
        let denied = manager.authorize_owner(&headers, owner.id).unwrap_err();
        assert_eq!(denied.http_status_code(), 403);
        assert!(matches!(denied, AuthError::OwnershipMismatch));

        // own resource passes
        let granted = manager.authorize_owner(&headers, intruder.id).unwrap();
        assert_eq!(granted, intruder.id);
    }

    #[test]
    fn test_unauthenticated_is_distinct_from_ownership() {
        let manager = manager();
        let owner = manager.register("heidi@example.com", "pw").unwrap();

        let headers = bearer("not-a-real-token");
        let err = manager.authorize_owner(&headers, owner.id).unwrap_err();
        assert_eq!(err.http_status_code(), 401);
    }

    #[test]
    fn test_update_credentials_rehashes() {
        let manager = manager();
        manager.register("ivan@example.com", "old-password").unwrap();
        let login = manager.login("ivan@example.com", "old-password").unwrap();

        let updated = manager
            .update_credentials(
                &bearer(&login.access_token),
                "ivan@example.com",
                "new-password",
            )
            .unwrap();
        assert_eq!(updated.email, "ivan@example.com");

        assert!(manager.login("ivan@example.com", "old-password").is_err());
        assert!(manager.login("ivan@example.com", "new-password").is_ok());
    }
}
