//! Basic token example
//!
//! This example demonstrates issuing and validating access tokens and
//! pulling them back out of an Authorization header.
//!
//! Run with: cargo run --example basic_tokens

use chirpauth::{bearer_token, AccessTokenCodec, AuthError};
use chrono::Duration;
use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderValue};
use uuid::Uuid;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // The server's signing secret (at least 32 bytes)
    let secret = b"an-hmac-secret-of-at-least-32-bytes!";
    let codec = AccessTokenCodec::new(secret)?;

    // Mint a token at "login"
    let user_id = Uuid::new_v4();
    let token = codec.issue(user_id, Duration::minutes(10))?;

    println!("Issued token: {}...", &token[..40]);
    println!();

    // A later request presents it as a bearer credential
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}"))?,
    );

    let presented = bearer_token(&headers)?;
    match codec.validate(&presented) {
        Ok(subject) => {
            println!("[OK] Token validated");
            println!("  Subject: {}", subject);
            assert_eq!(subject, user_id);
        }
        Err(e) => {
            println!("[FAIL] Validation failed: {}", e);
            println!("  HTTP status: {}", e.http_status_code());
        }
    }

    println!();
    println!("--- Testing Error Cases ---");
    println!();

    // Wrong secret
    let foreign = AccessTokenCodec::new(b"a-different-secret-32-bytes-long!!!!")?;
    match foreign.validate(&token) {
        Err(AuthError::SignatureInvalid) => {
            println!("[OK] Correctly rejected foreign signature");
        }
        outcome => println!("[WARN] Unexpected outcome: {:?}", outcome.err()),
    }

    // Already expired
    let expired = codec.issue(user_id, Duration::seconds(-1))?;
    match codec.validate(&expired) {
        Err(AuthError::TokenExpired) => {
            println!("[OK] Correctly rejected expired token");
        }
        outcome => println!("[WARN] Unexpected outcome: {:?}", outcome.err()),
    }

    // Wrong header scheme
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
    match bearer_token(&headers) {
        Err(AuthError::WrongAuthScheme(scheme)) => {
            println!("[OK] Correctly rejected scheme {:?}", scheme);
        }
        outcome => println!("[WARN] Unexpected outcome: {:?}", outcome.err()),
    }

    Ok(())
}
