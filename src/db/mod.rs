//! The document-store contract the account directory is written against,
//! plus its Postgres and in-memory backends.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{
    auth::TokenPair,
    user::{NewUser, User},
};

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

/// Fields with a uniqueness constraint that can be counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Email,
    Phone,
}

impl UserField {
    pub fn column(&self) -> &'static str {
        match self {
            UserField::Email => "email",
            UserField::Phone => "phone",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFilter {
    ById(String),
    ByEmail(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("{0} already exists")]
    Conflict(&'static str),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                let what = match db.constraint() {
                    Some(c) if c.contains("phone") => "phone",
                    Some(c) if c.contains("email") => "email",
                    _ => "user",
                };
                return StoreError::Conflict(what);
            }
        }
        StoreError::Backend(e.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Every write is a single atomic operation scoped to one subject id.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn count_matching(&self, field: UserField, value: &str) -> StoreResult<u64>;

    /// Inserts the identity and its first token pair together; returns the subject id.
    async fn insert_one(&self, user: NewUser) -> StoreResult<String>;

    async fn find_one(&self, filter: &UserFilter) -> StoreResult<Option<User>>;

    /// Replaces the tracked token pair for `user_id` and bumps `updated_at`.
    /// With `upsert` the token record is created when missing; without it a
    /// missing record is left alone.
    async fn update_tokens(
        &self,
        user_id: &str,
        tokens: &TokenPair,
        updated_at: DateTime<Utc>,
        upsert: bool,
    ) -> StoreResult<()>;

    /// Total number of identities and one page of them, oldest first.
    async fn list(&self, offset: u64, limit: u64) -> StoreResult<(u64, Vec<User>)>;

    async fn ping(&self) -> StoreResult<()>;
}
