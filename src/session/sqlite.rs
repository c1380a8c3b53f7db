//! SQLite store implementation.

use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use uuid::Uuid;

use super::store::{AuthStore, UserRecord};
use crate::error::{AuthError, AuthResult};
use crate::refresh::RefreshTokenRecord;

/// SQLite-backed auth store.
///
/// UUIDs are stored as text, timestamps as Unix seconds. Revocation is a
/// single guarded `UPDATE`, so it is atomic and an earlier revocation
/// timestamp is never overwritten.
///
/// # Example
///
/// ```rust,ignore
/// use chirpauth::SqliteAuthStore;
///
/// // In-memory database
/// let store = SqliteAuthStore::in_memory()?;
///
/// // File-based database
/// let store = SqliteAuthStore::new("auth.db")?;
/// ```
pub struct SqliteAuthStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAuthStore {
    /// Create a new SQLite auth store with the given database path.
    pub fn new(path: &str) -> AuthResult<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::new(manager)?;

        let store = Self { pool };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory SQLite auth store.
    pub fn in_memory() -> AuthResult<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::new(manager)?;

        let store = Self { pool };
        store.init_schema()?;
        Ok(store)
    }

    /// Create from an existing r2d2 pool.
    pub fn from_pool(pool: Pool<SqliteConnectionManager>) -> AuthResult<Self> {
        let store = Self { pool };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> AuthResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                email TEXT NOT NULL UNIQUE,
                hashed_password TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS refresh_tokens (
                token TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id),
                expires_at INTEGER NOT NULL,
                revoked_at INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_refresh_tokens_user_id ON refresh_tokens(user_id);
            "#,
        )?;
        Ok(())
    }

    /// Get a connection from the pool.
    fn conn(&self) -> AuthResult<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| AuthError::Store(e.to_string()))
    }
}

const USER_COLUMNS: &str = "id, created_at, updated_at, email, hashed_password";

/// Raw user row before uuid/timestamp conversion.
type UserRow = (String, i64, i64, String, String);

fn read_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

fn user_from_row(row: UserRow) -> AuthResult<UserRecord> {
    let (id, created_at, updated_at, email, hashed_password) = row;
    Ok(UserRecord {
        id: parse_uuid(&id)?,
        created_at: timestamp(created_at)?,
        updated_at: timestamp(updated_at)?,
        email,
        hashed_password,
    })
}

fn parse_uuid(text: &str) -> AuthResult<Uuid> {
    Uuid::parse_str(text).map_err(|e| AuthError::Store(format!("invalid uuid in store: {e}")))
}

fn timestamp(secs: i64) -> AuthResult<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| AuthError::Store(format!("invalid timestamp in store: {secs}")))
}

impl AuthStore for SqliteAuthStore {
    fn find_user_by_email(&self, email: &str) -> AuthResult<Option<UserRecord>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"))?;

        match stmt.query_row(params![email], read_user_row) {
            Ok(row) => Ok(Some(user_from_row(row)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AuthError::Store(e.to_string())),
        }
    }

    fn find_user_by_id(&self, id: Uuid) -> AuthResult<Option<UserRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))?;

        match stmt.query_row(params![id.to_string()], read_user_row) {
            Ok(row) => Ok(Some(user_from_row(row)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AuthError::Store(e.to_string())),
        }
    }

    fn create_user(&self, email: &str, hashed_password: &str) -> AuthResult<UserRecord> {
        let conn = self.conn()?;
        let now = Utc::now();
        let user = UserRecord {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
        };

        conn.execute(
            "INSERT INTO users (id, created_at, updated_at, email, hashed_password)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id.to_string(),
                user.created_at.timestamp(),
                user.updated_at.timestamp(),
                user.email,
                user.hashed_password,
            ],
        )?;
        Ok(user)
    }

    fn update_user(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> AuthResult<UserRecord> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE users SET updated_at = ?1, email = ?2, hashed_password = ?3 WHERE id = ?4",
            params![
                Utc::now().timestamp(),
                email,
                hashed_password,
                id.to_string()
            ],
        )?;
        if rows == 0 {
            return Err(AuthError::Store(format!("no user with id {id}")));
        }

        self.find_user_by_id(id)?
            .ok_or_else(|| AuthError::Store(format!("no user with id {id}")))
    }

    fn create_refresh_token(&self, record: &RefreshTokenRecord) -> AuthResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO refresh_tokens (token, user_id, expires_at, revoked_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.token,
                record.user_id.to_string(),
                record.expires_at.timestamp(),
                record.revoked_at.map(|t| t.timestamp()),
            ],
        )?;
        Ok(())
    }

    fn find_refresh_token(&self, token: &str) -> AuthResult<Option<RefreshTokenRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT token, user_id, expires_at, revoked_at FROM refresh_tokens WHERE token = ?1",
        )?;

        let result = stmt.query_row(params![token], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, Option<i64>>(3)?,
            ))
        });

        match result {
            Ok((token, user_id, expires_at, revoked_at)) => Ok(Some(RefreshTokenRecord {
                token,
                user_id: parse_uuid(&user_id)?,
                expires_at: timestamp(expires_at)?,
                revoked_at: revoked_at.map(timestamp).transpose()?,
            })),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AuthError::Store(e.to_string())),
        }
    }

    fn revoke_refresh_token(&self, token: &str, revoked_at: DateTime<Utc>) -> AuthResult<()> {
        let conn = self.conn()?;
        // guarded update: atomic, keeps the first revocation timestamp
        conn.execute(
            "UPDATE refresh_tokens SET revoked_at = ?1 WHERE token = ?2 AND revoked_at IS NULL",
            params![revoked_at.timestamp(), token],
        )?;
        Ok(())
    }

    fn find_user_by_refresh_token(&self, token: &str) -> AuthResult<Option<UserRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT u.id, u.created_at, u.updated_at, u.email, u.hashed_password
             FROM users u JOIN refresh_tokens r ON u.id = r.user_id
             WHERE r.token = ?1",
        )?;

        match stmt.query_row(params![token], read_user_row) {
            Ok(row) => Ok(Some(user_from_row(row)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AuthError::Store(e.to_string())),
        }
    }
}
