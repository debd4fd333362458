//! User accounts and bearer-token sessions.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use jotter_core::{
    Error, IssuedSession, Result, Session, SessionRepository, User, UserRepository,
};

/// Prefix on every issued token, so leaked tokens are easy to grep for.
pub const TOKEN_PREFIX: &str = "jt_";

const TOKEN_SECRET_LEN: usize = 48;

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        created_at: row.get("created_at"),
    }
}

/// PostgreSQL implementation of UserRepository.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn upsert_by_email(&self, email: &str, name: Option<&str>) -> Result<User> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(Error::InvalidInput(format!("Invalid email: {}", email)));
        }

        let row = sqlx::query(
            r#"
            INSERT INTO users (id, email, name)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE SET name = COALESCE(EXCLUDED.name, users.name)
            RETURNING id, email, name, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&email)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(user_from_row(&row))
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, email, name, created_at FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.as_ref().map(user_from_row))
    }
}

/// PostgreSQL implementation of SessionRepository.
///
/// Only the SHA-256 of a token is stored; the raw value is handed out once
/// by [`SessionRepository::issue`].
#[derive(Clone)]
pub struct PgSessionRepository {
    pool: Pool<Postgres>,
}

impl PgSessionRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Generate a random alphanumeric secret.
    fn generate_secret(length: usize) -> String {
        const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
        let mut rng = rand::thread_rng();
        (0..length)
            .map(|_| {
                let idx = rng.gen_range(0..CHARSET.len());
                CHARSET[idx] as char
            })
            .collect()
    }

    /// Hash a token using SHA256.
    pub(crate) fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Delete expired sessions. Returns the number removed.
    pub async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn issue(&self, user_id: Uuid, ttl: Duration) -> Result<IssuedSession> {
        if ttl <= Duration::zero() {
            return Err(Error::InvalidInput("Session TTL must be positive".into()));
        }

        let token = format!("{}{}", TOKEN_PREFIX, Self::generate_secret(TOKEN_SECRET_LEN));
        let id = Uuid::now_v7();
        let expires_at = Utc::now() + ttl;

        sqlx::query(
            "INSERT INTO sessions (id, user_id, token_hash, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(user_id)
        .bind(Self::hash_token(&token))
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(subsystem = "db", component = "sessions", op = "issue", user_id = %user_id, "Session issued");

        Ok(IssuedSession {
            token,
            session: Session {
                id,
                user_id,
                expires_at,
            },
        })
    }

    async fn validate(&self, token: &str) -> Result<Option<Session>> {
        if !token.starts_with(TOKEN_PREFIX) {
            return Ok(None);
        }

        let row = sqlx::query(
            r#"
            SELECT id, user_id, expires_at FROM sessions
            WHERE token_hash = $1 AND expires_at > now()
            "#,
        )
        .bind(Self::hash_token(token))
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Session {
            id: r.get("id"),
            user_id: r.get("user_id"),
            expires_at: r.get("expires_at"),
        }))
    }

    async fn revoke(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(Self::hash_token(token))
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}
