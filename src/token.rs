//! Access token issuance and validation.
//!
//! Tokens are signed with HMAC-SHA256 and verified with constant-time
//! comparison to prevent timing attacks. The two-part wire format carries
//! no algorithm field, so the signing algorithm is pinned by construction
//! and an attacker has nothing like a `none` header to downgrade to.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Duration;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};
use crate::{MAX_TOKEN_LENGTH, MIN_SECRET_LENGTH, TOKEN_ISSUER};

type HmacSha256 = Hmac<Sha256>;

/// Claims carried by an access token.
///
/// Self-contained and stateless: the server keeps no session table for
/// access tokens, expiry is decided entirely by the embedded timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer identity, always `"chirpy"`
    pub iss: String,

    /// Subject: the user id the token asserts, as a UUID string
    pub sub: String,

    /// Issued-at timestamp (Unix seconds)
    pub iat: i64,

    /// Expiration timestamp (Unix seconds)
    pub exp: i64,
}

impl Claims {
    /// Check if the claims have expired
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        now >= self.exp
    }

    /// Get the remaining validity time in seconds
    pub fn remaining_seconds(&self) -> i64 {
        let now = chrono::Utc::now().timestamp();
        (self.exp - now).max(0)
    }
}

/// Codec for Chirpy access tokens.
///
/// Stateless: a pure function of the symmetric secret and the claims.
/// Wire format: `base64url(JSON_claims).base64url(HMAC_SHA256)`.
///
/// # Example
///
/// ```rust
/// use chirpauth::AccessTokenCodec;
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// let codec = AccessTokenCodec::new(b"test-secret-key-32bytes-long!!!!").unwrap();
///
/// let user_id = Uuid::new_v4();
/// let token = codec.issue(user_id, Duration::minutes(10)).unwrap();
/// assert_eq!(codec.validate(&token).unwrap(), user_id);
/// ```
#[derive(Clone)]
pub struct AccessTokenCodec {
    secret: Vec<u8>,
}

impl AccessTokenCodec {
    /// Create a codec with the given symmetric secret.
    ///
    /// The secret must be at least 32 bytes (256 bits). An empty or short
    /// secret is a configuration error and is rejected here, at startup,
    /// so per-call signing cannot fail on it later.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidSecret`] if the secret is shorter than
    /// 32 bytes.
    pub fn new(secret: &[u8]) -> AuthResult<Self> {
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(AuthError::InvalidSecret(format!(
                "signing secret must be at least {} bytes, got {}",
                MIN_SECRET_LENGTH,
                secret.len()
            )));
        }
        Ok(Self {
            secret: secret.to_vec(),
        })
    }

    /// Create a codec without checking secret length.
    ///
    /// **Warning**: this bypasses the minimum key length check. Only use
    /// this for testing or when you have validated the key yourself.
    pub fn new_unchecked(secret: &[u8]) -> Self {
        Self {
            secret: secret.to_vec(),
        }
    }

    /// Issue a signed access token asserting `subject` for `ttl`.
    ///
    /// Claims are `{iss: "chirpy", sub: subject, iat: now, exp: now + ttl}`.
    /// A negative `ttl` produces a token that is already expired.
    pub fn issue(&self, subject: Uuid, ttl: Duration) -> AuthResult<String> {
        let now = chrono::Utc::now();
        let claims = Claims {
            iss: TOKEN_ISSUER.to_string(),
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        self.sign(&claims)
    }

    /// Sign an explicit claims set.
    ///
    /// [`issue`](Self::issue) is the normal entry point; this exists for
    /// callers that need full control over the timestamps.
    pub fn sign(&self, claims: &Claims) -> AuthResult<String> {
        let claims_json = serde_json::to_string(claims)
            .map_err(|e| AuthError::Internal(format!("failed to serialize claims: {e}")))?;

        let payload_b64 = URL_SAFE_NO_PAD.encode(claims_json.as_bytes());
        let signature = self.compute_signature(&payload_b64);
        let signature_b64 = URL_SAFE_NO_PAD.encode(&signature);

        Ok(format!("{}.{}", payload_b64, signature_b64))
    }

    /// Validate a token and return the subject user id.
    ///
    /// The signature is re-derived from scratch with this codec's secret;
    /// nothing inside the token influences how it is verified.
    ///
    /// # Errors
    ///
    /// - [`AuthError::MalformedToken`]: wrong structure or encoding
    /// - [`AuthError::SignatureInvalid`]: signature mismatch
    /// - [`AuthError::TokenExpired`]: `exp` is not in the future
    /// - [`AuthError::UnknownSubject`]: `sub` does not parse as a UUID
    pub fn validate(&self, token: &str) -> AuthResult<Uuid> {
        // Length check to prevent DoS
        if token.len() > MAX_TOKEN_LENGTH {
            return Err(AuthError::MalformedToken(format!(
                "token exceeds maximum length of {} bytes",
                MAX_TOKEN_LENGTH
            )));
        }

        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 2 {
            return Err(AuthError::MalformedToken(
                "token must have format: payload.signature".to_string(),
            ));
        }

        let payload_b64 = parts[0];
        let signature_b64 = parts[1];

        // Signature first: nothing in the payload is trusted before this
        self.verify_signature(payload_b64, signature_b64)?;

        let claims = decode_claims(payload_b64)?;

        if claims.iss != TOKEN_ISSUER {
            return Err(AuthError::MalformedToken(format!(
                "unexpected issuer: {:?}",
                claims.iss
            )));
        }

        let now = chrono::Utc::now().timestamp();
        if now >= claims.exp {
            return Err(AuthError::TokenExpired);
        }

        Uuid::parse_str(&claims.sub).map_err(|_| AuthError::UnknownSubject(claims.sub.clone()))
    }

    /// Decode claims without checking expiry.
    ///
    /// The signature is still verified. Useful for inspecting expired
    /// tokens or debugging.
    pub fn peek(&self, token: &str) -> AuthResult<Claims> {
        if token.len() > MAX_TOKEN_LENGTH {
            return Err(AuthError::MalformedToken(
                "token exceeds maximum length".to_string(),
            ));
        }

        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 2 {
            return Err(AuthError::MalformedToken(
                "token must have format: payload.signature".to_string(),
            ));
        }

        self.verify_signature(parts[0], parts[1])?;
        decode_claims(parts[0])
    }

    /// Compute HMAC-SHA256 signature for a payload.
    fn compute_signature(&self, payload_b64: &str) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(payload_b64.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }

    /// Verify signature using constant-time comparison.
    fn verify_signature(&self, payload_b64: &str, signature_b64: &str) -> AuthResult<()> {
        let provided_sig = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| AuthError::MalformedToken("invalid signature encoding".to_string()))?;

        let expected_sig = self.compute_signature(payload_b64);

        if provided_sig.ct_eq(&expected_sig).into() {
            Ok(())
        } else {
            Err(AuthError::SignatureInvalid)
        }
    }
}

/// Decode and parse the claims JSON.
fn decode_claims(payload_b64: &str) -> AuthResult<Claims> {
    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AuthError::MalformedToken("invalid payload encoding".to_string()))?;

    let payload_str = String::from_utf8(payload_bytes)
        .map_err(|_| AuthError::MalformedToken("payload is not valid UTF-8".to_string()))?;

    serde_json::from_str(&payload_str)
        .map_err(|e| AuthError::MalformedToken(format!("claims parse error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test secret that meets the 32-byte minimum requirement
    const TEST_SECRET: &[u8; 32] = b"test-secret-key-32bytes-long!!!!";
    const TEST_SECRET_2: &[u8; 32] = b"another-secret-32-bytes-long!!!!";

    #[test]
    fn test_issue_and_validate_round_trip() {
        // a few independent subject/secret pairs, like the service sees
        for secret in [&TEST_SECRET[..], &TEST_SECRET_2[..]] {
            let codec = AccessTokenCodec::new(secret).unwrap();
            let subject = Uuid::new_v4();

            let token = codec.issue(subject, Duration::minutes(10)).unwrap();
            assert_eq!(codec.validate(&token).unwrap(), subject);
        }
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let codec = AccessTokenCodec::new(TEST_SECRET).unwrap();
        let other = AccessTokenCodec::new(TEST_SECRET_2).unwrap();

        let token = codec.issue(Uuid::new_v4(), Duration::minutes(10)).unwrap();

        assert!(matches!(
            other.validate(&token),
            Err(AuthError::SignatureInvalid)
        ));
    }

    #[test]
    fn test_negative_ttl_is_already_expired() {
        let codec = AccessTokenCodec::new(TEST_SECRET).unwrap();
        let token = codec.issue(Uuid::new_v4(), Duration::seconds(-1)).unwrap();

        assert!(matches!(
            codec.validate(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_expired_claims_rejected() {
        let codec = AccessTokenCodec::new(TEST_SECRET).unwrap();
        let now = chrono::Utc::now().timestamp();

        let claims = Claims {
            iss: TOKEN_ISSUER.to_string(),
            sub: Uuid::new_v4().to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };

        let token = codec.sign(&claims).unwrap();
        assert!(matches!(
            codec.validate(&token),
            Err(AuthError::TokenExpired)
        ));

        // peek still works on expired-but-genuine tokens
        let peeked = codec.peek(&token).unwrap();
        assert!(peeked.is_expired());
        assert_eq!(peeked.remaining_seconds(), 0);
    }

    #[test]
    fn test_foreign_issuer_rejected() {
        let codec = AccessTokenCodec::new(TEST_SECRET).unwrap();
        let now = chrono::Utc::now().timestamp();

        let claims = Claims {
            iss: "somebody-else".to_string(),
            sub: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + 600,
        };

        let token = codec.sign(&claims).unwrap();
        assert!(matches!(
            codec.validate(&token),
            Err(AuthError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_bad_subject_rejected() {
        let codec = AccessTokenCodec::new(TEST_SECRET).unwrap();
        let now = chrono::Utc::now().timestamp();

        let claims = Claims {
            iss: TOKEN_ISSUER.to_string(),
            sub: "not-a-uuid".to_string(),
            iat: now,
            exp: now + 600,
        };

        let token = codec.sign(&claims).unwrap();
        assert!(matches!(
            codec.validate(&token),
            Err(AuthError::UnknownSubject(_))
        ));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let codec = AccessTokenCodec::new(TEST_SECRET).unwrap();

        // No separator
        assert!(matches!(
            codec.validate("invalidtoken"),
            Err(AuthError::MalformedToken(_))
        ));

        // Too many parts
        assert!(matches!(
            codec.validate("a.b.c"),
            Err(AuthError::MalformedToken(_))
        ));

        // Invalid base64 in the signature
        assert!(matches!(
            codec.validate("payload.!!!"),
            Err(AuthError::MalformedToken(_))
        ));

        // Over the length cap
        let long_token = "a".repeat(MAX_TOKEN_LENGTH + 1);
        assert!(matches!(
            codec.validate(&long_token),
            Err(AuthError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_tampered_payload_fails_signature() {
        let codec = AccessTokenCodec::new(TEST_SECRET).unwrap();
        let token = codec.issue(Uuid::new_v4(), Duration::minutes(10)).unwrap();

        let (_, signature) = token.split_once('.').unwrap();
        let other = codec.issue(Uuid::new_v4(), Duration::minutes(10)).unwrap();
        let (other_payload, _) = other.split_once('.').unwrap();

        // claims from one token, signature from another
        let spliced = format!("{}.{}", other_payload, signature);
        assert!(matches!(
            codec.validate(&spliced),
            Err(AuthError::SignatureInvalid)
        ));
    }

    #[test]
    fn test_secret_too_short() {
        assert!(AccessTokenCodec::new(b"").is_err());
        assert!(AccessTokenCodec::new(b"short").is_err());
        assert!(AccessTokenCodec::new(b"31-bytes-secret-not-long-enuff!").is_err());
        assert!(AccessTokenCodec::new(TEST_SECRET).is_ok());
    }
}
