use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};

use super::{StoreResult, UserField, UserFilter, UserStore};
use crate::models::{
    auth::TokenPair,
    user::{NewUser, User, UserRow},
};

const SELECT_USER: &str = "SELECT u.user_id, u.email, u.phone, u.password_hash, u.first_name,
        u.last_name, u.role, t.token, t.refresh_token, u.created_at, u.updated_at
     FROM users u LEFT JOIN user_tokens t ON t.user_id = u.user_id";

pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Create the tables if they do not exist yet (idempotent, safe to call on every startup).
pub async fn provision_schema(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::raw_sql(
        r#"CREATE TABLE IF NOT EXISTS users (
            user_id       TEXT PRIMARY KEY,
            email         VARCHAR(255) NOT NULL,
            phone         VARCHAR(64) NOT NULL,
            password_hash TEXT NOT NULL,
            first_name    VARCHAR(100) NOT NULL,
            last_name     VARCHAR(100) NOT NULL,
            role          TEXT NOT NULL CHECK (role IN ('ADMIN', 'USER')),
            created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT users_email_key UNIQUE (email),
            CONSTRAINT users_phone_key UNIQUE (phone)
        )"#,
    )
    .execute(pool)
    .await?;

    // One live pair per identity; older tokens stay verifiable until they expire.
    sqlx::raw_sql(
        r#"CREATE TABLE IF NOT EXISTS user_tokens (
            user_id       TEXT PRIMARY KEY REFERENCES users(user_id) ON DELETE CASCADE,
            token         TEXT NOT NULL,
            refresh_token TEXT NOT NULL,
            updated_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )"#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn count_matching(&self, field: UserField, value: &str) -> StoreResult<u64> {
        // Column names come from a closed enum, never from input.
        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM users WHERE {} = $1",
            field.column()
        ))
        .bind(value)
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u64)
    }

    async fn insert_one(&self, user: NewUser) -> StoreResult<String> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO users (user_id, email, phone, password_hash, first_name, last_name,
                                role, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)",
        )
        .bind(&user.user_id)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.to_string())
        .bind(user.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO user_tokens (user_id, token, refresh_token, updated_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&user.user_id)
        .bind(&user.token)
        .bind(&user.refresh_token)
        .bind(user.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user.user_id)
    }

    async fn find_one(&self, filter: &UserFilter) -> StoreResult<Option<User>> {
        let (clause, value) = match filter {
            UserFilter::ById(id) => ("u.user_id = $1", id),
            UserFilter::ByEmail(email) => ("u.email = $1", email),
        };
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE {clause}"))
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::try_from).transpose()?)
    }

    async fn update_tokens(
        &self,
        user_id: &str,
        tokens: &TokenPair,
        updated_at: DateTime<Utc>,
        upsert: bool,
    ) -> StoreResult<()> {
        // Single statement so the token pair and the identity timestamp move together.
        let write = if upsert {
            "INSERT INTO user_tokens (user_id, token, refresh_token, updated_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id) DO UPDATE
                SET token = EXCLUDED.token,
                    refresh_token = EXCLUDED.refresh_token,
                    updated_at = EXCLUDED.updated_at
             RETURNING user_id"
        } else {
            "UPDATE user_tokens SET token = $2, refresh_token = $3, updated_at = $4
             WHERE user_id = $1
             RETURNING user_id"
        };
        sqlx::query(&format!(
            "WITH t AS ({write}) UPDATE users SET updated_at = $4
             WHERE user_id IN (SELECT user_id FROM t)"
        ))
        .bind(user_id)
        .bind(&tokens.access_token)
        .bind(&tokens.refresh_token)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list(&self, offset: u64, limit: u64) -> StoreResult<(u64, Vec<User>)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "{SELECT_USER} ORDER BY u.created_at, u.user_id LIMIT $1 OFFSET $2"
        ))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        let users = rows
            .into_iter()
            .map(User::try_from)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok((total as u64, users))
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
