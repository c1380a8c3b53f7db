//! # chirpauth - Session Authentication for Chirpy
//!
//! The session-authentication core of the Chirpy social posting service:
//! short-lived signed access tokens, long-lived opaque refresh tokens, and
//! password-credential verification, composed into login / refresh /
//! revoke flows.
//!
//! ## Features
//!
//! - **Access Tokens**: HMAC-SHA256 signed, expiring, subject-bearing
//!   tokens with constant-time verification; stateless, no session table
//! - **Refresh Tokens**: 256 bytes of OS entropy, hex-encoded; validity
//!   decided by store lookup with logical (flag-based) revocation
//! - **Credential Hashing**: salted bcrypt hashing and verification
//! - **Session Flows**: trait-based store with an optional SQLite backend;
//!   login, refresh, revoke, and ownership-gated writes
//!
//! ## Quick Start
//!
//! ```rust
//! use chirpauth::AccessTokenCodec;
//! use chrono::Duration;
//! use uuid::Uuid;
//!
//! // Create a codec with the server's signing secret
//! let codec = AccessTokenCodec::new(b"an-hmac-secret-of-at-least-32-bytes!").unwrap();
//!
//! // Mint a short-lived token for a user
//! let user_id = Uuid::new_v4();
//! let token = codec.issue(user_id, Duration::minutes(10)).unwrap();
//!
//! // Later: validate it and recover the subject
//! match codec.validate(&token) {
//!     Ok(subject) => assert_eq!(subject, user_id),
//!     Err(e) => eprintln!("rejected: {}", e),
//! }
//! ```
//!
//! ## With a Session Store
//!
//! ```rust,ignore
//! use chirpauth::{SessionConfig, SessionManager, SqliteAuthStore};
//!
//! let store = SqliteAuthStore::new("auth.db")?;
//! let manager = SessionManager::new(store, SessionConfig::new(secret))?;
//!
//! let login = manager.login("alice@example.com", "password")?;
//! // login.access_token proves identity for ~10 minutes;
//! // login.refresh_token mints replacements until revoked or expired
//! ```

pub mod error;
pub mod header;
pub mod password;
pub mod refresh;
pub mod session;
pub mod token;

// Re-exports for convenience
pub use error::{AuthError, AuthResult};
pub use header::{api_key, bearer_token};
pub use password::{hash_password, hash_password_with_cost, verify_password};
pub use refresh::{RefreshTokenRecord, TokenState};
pub use session::{AuthStore, Login, SessionConfig, SessionManager, UserRecord};
pub use token::{AccessTokenCodec, Claims};

#[cfg(feature = "store-sqlite")]
pub use session::SqliteAuthStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Issuer identity stamped into every access token
pub const TOKEN_ISSUER: &str = "chirpy";

/// Maximum token length (prevents DoS via large tokens)
pub const MAX_TOKEN_LENGTH: usize = 2048;

/// Minimum signing secret length (32 bytes = 256 bits for HMAC-SHA256 security)
pub const MIN_SECRET_LENGTH: usize = 32;

/// Entropy drawn for each refresh token (hex-encoded to twice this length)
pub const REFRESH_TOKEN_BYTES: usize = 256;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{AuthError, AuthResult};
    pub use crate::header::{api_key, bearer_token};
    pub use crate::password::{hash_password, verify_password};
    pub use crate::refresh::{RefreshTokenRecord, TokenState};
    pub use crate::session::{AuthStore, Login, SessionConfig, SessionManager, UserRecord};
    pub use crate::token::{AccessTokenCodec, Claims};

    #[cfg(feature = "store-sqlite")]
    pub use crate::session::SqliteAuthStore;
}
