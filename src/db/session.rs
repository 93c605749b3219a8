//! Refresh-session storage.
//!
//! One row per authenticated device. The opaque token value is the lookup
//! key; a session is live only while `expires_at > now` and the row still
//! exists. Rotation replaces the row atomically so a rotated-away token can
//! never be presented again. Absence of a live row is the only externally
//! observable signal; callers cannot tell "expired" from "never existed".

use base64::Engine;
use rand::RngCore;
use sqlx::sqlite::SqlitePool;
use std::time::{SystemTime, UNIX_EPOCH};

/// A refresh-session record.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: i64,
    pub token: String,
    pub account_id: i64,
    pub device: String,
    pub expires_at: i64,
    pub created_at: i64,
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: i64,
    token: String,
    account_id: i64,
    device: String,
    expires_at: i64,
    created_at: i64,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Self {
            id: row.id,
            token: row.token,
            account_id: row.account_id,
            device: row.device,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}

/// Current unix time in seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Generate an opaque session token: 32 random bytes, base64url no-pad.
/// Not sequential and not derived from any account attribute.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Store for refresh sessions.
pub struct SessionStore {
    pool: SqlitePool,
}

const SELECT_SESSION: &str =
    "SELECT id, token, account_id, device, expires_at, created_at FROM sessions";

impl SessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new session with a freshly generated token.
    pub async fn create(
        &self,
        account_id: i64,
        device: &str,
        ttl_secs: u64,
    ) -> Result<Session, sqlx::Error> {
        let token = generate_token();
        let now = unix_now();
        let expires_at = now + ttl_secs as i64;

        let result = sqlx::query(
            "INSERT INTO sessions (token, account_id, device, expires_at, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&token)
        .bind(account_id)
        .bind(device)
        .bind(expires_at)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Session {
            id: result.last_insert_rowid(),
            token,
            account_id,
            device: device.to_string(),
            expires_at,
            created_at: now,
        })
    }

    /// Look up a live session by token. An expired-but-present row is
    /// treated identically to an absent one.
    pub async fn find_live(&self, token: &str) -> Result<Option<Session>, sqlx::Error> {
        let row: Option<SessionRow> =
            sqlx::query_as(&format!("{} WHERE token = ? AND expires_at > ?", SELECT_SESSION))
                .bind(token)
                .bind(unix_now())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Session::from))
    }

    /// Atomically replace a live session with a new one for the same
    /// account and device. Returns None if the old token does not resolve
    /// to a live row — a stale or already-rotated token never produces a
    /// new session, and of two concurrent rotations exactly one wins.
    pub async fn rotate(&self, old_token: &str, ttl_secs: u64) -> Result<Option<Session>, sqlx::Error> {
        let now = unix_now();
        let mut tx = self.pool.begin().await?;

        let deleted: Option<(i64, String)> = sqlx::query_as(
            "DELETE FROM sessions WHERE token = ? AND expires_at > ? RETURNING account_id, device",
        )
        .bind(old_token)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((account_id, device)) = deleted else {
            tx.rollback().await.ok();
            return Ok(None);
        };

        let token = generate_token();
        let expires_at = now + ttl_secs as i64;
        let result = sqlx::query(
            "INSERT INTO sessions (token, account_id, device, expires_at, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&token)
        .bind(account_id)
        .bind(&device)
        .bind(expires_at)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(Session {
            id: result.last_insert_rowid(),
            token,
            account_id,
            device,
            expires_at,
            created_at: now,
        }))
    }

    /// Delete a single session. No-op (not an error) if already absent.
    pub async fn revoke(&self, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every session for an account (log out everywhere).
    pub async fn revoke_all(&self, account_id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE account_id = ?")
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Device descriptors of all currently-live sessions for an account,
    /// oldest first.
    pub async fn list_live_devices(&self, account_id: i64) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT device FROM sessions WHERE account_id = ? AND expires_at > ? \
             ORDER BY created_at, id",
        )
        .bind(account_id)
        .bind(unix_now())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(device,)| device).collect())
    }

    /// Delete all expired session rows (cleanup sweep).
    pub async fn delete_expired(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(unix_now())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
