//! Error types for the chirpauth library.

use thiserror::Error;

/// Result type alias for chirpauth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication and authorization errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email/password pair did not verify (covers unknown email too)
    #[error("Incorrect email or password")]
    CredentialMismatch,

    /// Password hashing primitive failed internally (fatal)
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    /// Token structure is invalid (wrong part count, bad encoding, bad claims)
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// Token signature verification failed
    #[error("Invalid token signature")]
    SignatureInvalid,

    /// Token has expired
    #[error("Token has expired")]
    TokenExpired,

    /// Token subject is not a valid user identifier
    #[error("Token subject is not a valid user id: {0}")]
    UnknownSubject(String),

    /// Authorization header is absent or carries no token
    #[error("Authorization header missing or empty")]
    MissingAuthHeader,

    /// Authorization header carries a scheme other than the expected one
    #[error("Unexpected authorization scheme: {0:?}")]
    WrongAuthScheme(String),

    /// The system random source could not be read (fatal)
    #[error("Entropy source failure: {0}")]
    Entropy(String),

    /// Refresh token has been revoked
    #[error("Refresh token has been revoked")]
    TokenRevoked,

    /// Refresh token is not known to the store
    #[error("Refresh token not found")]
    TokenNotFound,

    /// Authenticated subject does not own the target resource
    #[error("Subject does not own the resource")]
    OwnershipMismatch,

    /// Signing secret rejected at construction (empty or too short)
    #[error("Unusable signing secret: {0}")]
    InvalidSecret(String),

    /// External store error
    #[error("Store error: {0}")]
    Store(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Returns true if this error should surface as a generic unauthorized
    /// outcome (credential and token failures are never distinguished
    /// outward).
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            AuthError::CredentialMismatch
                | AuthError::MalformedToken(_)
                | AuthError::SignatureInvalid
                | AuthError::TokenExpired
                | AuthError::UnknownSubject(_)
                | AuthError::MissingAuthHeader
                | AuthError::WrongAuthScheme(_)
                | AuthError::TokenRevoked
                | AuthError::TokenNotFound
        )
    }

    /// Returns true if this error is an internal fault that must be logged
    /// server-side and reported only generically.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AuthError::Hashing(_)
                | AuthError::Entropy(_)
                | AuthError::InvalidSecret(_)
                | AuthError::Store(_)
                | AuthError::Internal(_)
        )
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn http_status_code(&self) -> u16 {
        match self {
            AuthError::CredentialMismatch => 401,
            AuthError::MalformedToken(_) => 401,
            AuthError::SignatureInvalid => 401,
            AuthError::TokenExpired => 401,
            AuthError::UnknownSubject(_) => 401,
            AuthError::MissingAuthHeader => 401,
            AuthError::WrongAuthScheme(_) => 401,
            AuthError::TokenRevoked => 401,
            AuthError::TokenNotFound => 401,
            AuthError::OwnershipMismatch => 403,
            AuthError::Hashing(_) => 500,
            AuthError::Entropy(_) => 500,
            AuthError::InvalidSecret(_) => 500,
            AuthError::Store(_) => 500,
            AuthError::Internal(_) => 500,
        }
    }

    /// The message that may cross the service boundary.
    ///
    /// Which check failed (email vs password, expired vs revoked vs unknown)
    /// is never revealed; `Display` keeps the detail for server-side logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::CredentialMismatch => "Incorrect email or password",
            AuthError::OwnershipMismatch => "Forbidden",
            e if e.is_unauthorized() => "Unauthorized",
            _ => "Internal Server Error",
        }
    }
}

#[cfg(feature = "store-sqlite")]
impl From<rusqlite::Error> for AuthError {
    fn from(err: rusqlite::Error) -> Self {
        AuthError::Store(err.to_string())
    }
}

#[cfg(feature = "store-sqlite")]
impl From<r2d2::Error> for AuthError {
    fn from(err: r2d2::Error) -> Self {
        AuthError::Store(err.to_string())
    }
}
