//! Authorization header parsing.
//!
//! Pulls raw token strings out of an `Authorization` header. The same
//! extractor serves both token kinds: which one the string turns out to
//! be (access or refresh) depends on the endpoint, not on the header.

use http::header::AUTHORIZATION;
use http::HeaderMap;

use crate::error::{AuthError, AuthResult};

/// Required prefix for bearer credentials, case-sensitive, single space.
const BEARER_PREFIX: &str = "Bearer ";

/// Scheme token for API-key style credentials.
const API_KEY_SCHEME: &str = "ApiKey";

/// Extract a bearer token from the `Authorization` header.
///
/// Requires the literal prefix `"Bearer "`, strips it and trims
/// surrounding whitespace. A header that is absent, carries no token, or
/// trims down to nothing is [`AuthError::MissingAuthHeader`]; a different
/// scheme is [`AuthError::WrongAuthScheme`].
///
/// # Example
///
/// ```rust
/// use chirpauth::bearer_token;
/// use http::{header::AUTHORIZATION, HeaderMap, HeaderValue};
///
/// let mut headers = HeaderMap::new();
/// headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
/// assert_eq!(bearer_token(&headers).unwrap(), "abc123");
/// ```
pub fn bearer_token(headers: &HeaderMap) -> AuthResult<String> {
    let value = authorization_value(headers)?;

    let token = match value.strip_prefix(BEARER_PREFIX) {
        Some(rest) => rest.trim(),
        None => {
            // bare "Bearer" carries the right scheme but no token
            if value.trim() == "Bearer" {
                return Err(AuthError::MissingAuthHeader);
            }
            let scheme = value.split_whitespace().next().unwrap_or_default();
            return Err(AuthError::WrongAuthScheme(scheme.to_string()));
        }
    };

    if token.is_empty() {
        return Err(AuthError::MissingAuthHeader);
    }

    Ok(token.to_string())
}

/// Extract an API key from the `Authorization` header.
///
/// The first whitespace-separated segment must be exactly `"ApiKey"`; the
/// second segment is the key. A missing key segment is an error, not a
/// panic.
pub fn api_key(headers: &HeaderMap) -> AuthResult<String> {
    let value = authorization_value(headers)?;

    let mut segments = value.split_whitespace();
    let scheme = segments.next().ok_or(AuthError::MissingAuthHeader)?;
    if scheme != API_KEY_SCHEME {
        return Err(AuthError::WrongAuthScheme(scheme.to_string()));
    }

    segments
        .next()
        .map(str::to_string)
        .ok_or(AuthError::MissingAuthHeader)
}

fn authorization_value(headers: &HeaderMap) -> AuthResult<&str> {
    headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::MissingAuthHeader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extracted() {
        let headers = headers_with("Bearer abc123");
        assert_eq!(bearer_token(&headers).unwrap(), "abc123");
    }

    #[test]
    fn test_bearer_surrounding_whitespace_trimmed() {
        let headers = headers_with("Bearer   abc123  ");
        assert_eq!(bearer_token(&headers).unwrap(), "abc123");
    }

    #[test]
    fn test_missing_header_rejected() {
        let headers = HeaderMap::new();
        assert!(matches!(
            bearer_token(&headers),
            Err(AuthError::MissingAuthHeader)
        ));
    }

    #[test]
    fn test_wrong_scheme_rejected() {
        let headers = headers_with("Basic xyz");
        assert!(matches!(
            bearer_token(&headers),
            Err(AuthError::WrongAuthScheme(s)) if s == "Basic"
        ));

        // case-sensitive: lowercase bearer is a different scheme
        let headers = headers_with("bearer abc123");
        assert!(matches!(
            bearer_token(&headers),
            Err(AuthError::WrongAuthScheme(_))
        ));
    }

    #[test]
    fn test_empty_bearer_token_rejected() {
        // shorter than the prefix itself
        assert!(matches!(
            bearer_token(&headers_with("Bearer")),
            Err(AuthError::MissingAuthHeader)
        ));
        // prefix present but nothing after trimming
        assert!(matches!(
            bearer_token(&headers_with("Bearer    ")),
            Err(AuthError::MissingAuthHeader)
        ));
    }

    #[test]
    fn test_api_key_extracted() {
        let headers = headers_with("ApiKey f271c81ff7084fac");
        assert_eq!(api_key(&headers).unwrap(), "f271c81ff7084fac");
    }

    #[test]
    fn test_api_key_wrong_scheme_rejected() {
        let headers = headers_with("Bearer f271c81ff7084fac");
        assert!(matches!(
            api_key(&headers),
            Err(AuthError::WrongAuthScheme(s)) if s == "Bearer"
        ));
    }

    #[test]
    fn test_api_key_missing_segment_rejected() {
        let headers = headers_with("ApiKey");
        assert!(matches!(api_key(&headers), Err(AuthError::MissingAuthHeader)));
    }
}
