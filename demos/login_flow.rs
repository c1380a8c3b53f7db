//! Login flow example
//!
//! This example walks the full session lifecycle against the SQLite
//! store: register, login, authenticated write, refresh, revoke.
//!
//! Run with: cargo run --example login_flow

use chirpauth::{SessionConfig, SessionManager, SqliteAuthStore};
use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderValue};

fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).expect("token is ascii"),
    );
    headers
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let secret = b"an-hmac-secret-of-at-least-32-bytes!";

    // In-memory store (use a file path for persistence)
    let store = SqliteAuthStore::in_memory()?;
    let manager = SessionManager::new(store, SessionConfig::new(&secret[..]))?;

    println!("=== Session Flow Example ===\n");

    println!("1. Register");
    let user = manager.register("alice@example.com", "correct-password")?;
    println!("   [OK] User created: {}", user.email);

    println!();
    println!("2. Login");
    let login = manager.login("alice@example.com", "correct-password")?;
    println!("   [OK] Access token:  {}...", &login.access_token[..32]);
    println!("   [OK] Refresh token: {}...", &login.refresh_token[..32]);

    // A wrong password reads exactly like an unknown email
    let failed = manager.login("alice@example.com", "wrong-password");
    if let Err(e) = failed {
        println!("   [OK] Bad login rejected: {}", e.public_message());
    }

    println!();
    println!("3. Authenticated Write");
    let subject = manager.authorize_owner(&bearer(&login.access_token), user.id)?;
    println!("   [OK] Write authorized for {}", subject);

    println!();
    println!("4. Refresh");
    let new_access = manager.refresh(&bearer(&login.refresh_token))?;
    let subject = manager.authenticate(&bearer(&new_access))?;
    println!("   [OK] New access token validates to {}", subject);

    println!();
    println!("5. Revoke");
    manager.revoke(&bearer(&login.refresh_token))?;
    println!("   [OK] Refresh token revoked");

    match manager.refresh(&bearer(&login.refresh_token)) {
        Err(e) => println!(
            "   [OK] Further refresh rejected ({} outward, {:?} in the log)",
            e.public_message(),
            e
        ),
        Ok(_) => println!("   [FAIL] Revoked token still refreshed!"),
    }

    println!();
    println!("=== Example Complete ===");

    Ok(())
}
