use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Admin,
    User,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UserRole::Admin => "ADMIN",
            UserRole::User => "USER",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(UserRole::Admin),
            "USER" => Ok(UserRole::User),
            _ => Err(anyhow::anyhow!("Unknown role: {s}")),
        }
    }
}

/// DB row struct. `role` is stored as TEXT and parsed on the way out.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub user_id: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stored identity together with its most recently issued token pair.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub user_id: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            role: row.role.parse()?,
            user_id: row.user_id,
            email: row.email,
            phone: row.phone,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            token: row.token,
            refresh_token: row.refresh_token,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Everything needed to insert an identity and its first token pair in one write.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub token: String,
    pub refresh_token: String,
    pub created_at: DateTime<Utc>,
}

// Request/Response DTOs
#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    #[serde(default, alias = "user_type")]
    pub role: Option<UserRole>,
}

impl SignupRequest {
    /// Structural checks only; uniqueness is the directory's job.
    pub fn validate(&self) -> Result<(), String> {
        let first = self.first_name.trim().chars().count();
        if !(2..=100).contains(&first) {
            return Err("first_name must be between 2 and 100 characters".into());
        }
        let last = self.last_name.trim().chars().count();
        if !(2..=100).contains(&last) {
            return Err("last_name must be between 2 and 100 characters".into());
        }
        if !is_plausible_email(self.email.trim()) {
            return Err("email is not a valid address".into());
        }
        if self.phone.trim().is_empty() {
            return Err("phone is required".into());
        }
        if self.password.chars().count() < 6 {
            return Err("password must be at least 6 characters".into());
        }
        if self.password.len() > MAX_PASSWORD_BYTES {
            return Err(format!("password must be at most {MAX_PASSWORD_BYTES} bytes"));
        }
        Ok(())
    }
}

fn is_plausible_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !s.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub inserted_id: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserProfile,
}

/// Public view of a [`User`]. Never carries the password hash or token strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub user_id: String,
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(u: User) -> Self {
        Self {
            user_id: u.user_id,
            email: u.email,
            phone: u.phone,
            first_name: u.first_name,
            last_name: u.last_name,
            role: u.role,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserPage {
    pub total_count: u64,
    pub user_items: Vec<UserProfile>,
}

pub const MAX_PAGE_SIZE: u64 = 100;

/// bcrypt only looks at the first 72 bytes of its input.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Pagination query for GET /users. Field names follow the public API.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersQuery {
    pub record_per_page: Option<u64>,
    pub page: Option<u64>,
    pub start_index: Option<u64>,
}

impl ListUsersQuery {
    /// Resolves to `(offset, limit)`; zero or missing values fall back to page 1 of 10.
    /// The limit is capped at [`MAX_PAGE_SIZE`] and the offset at `i64::MAX`.
    pub fn window(&self) -> (u64, u64) {
        let limit = self
            .record_per_page
            .filter(|n| *n >= 1)
            .unwrap_or(10)
            .min(MAX_PAGE_SIZE);
        let page = self.page.filter(|n| *n >= 1).unwrap_or(1);
        let offset = self
            .start_index
            .unwrap_or_else(|| (page - 1).saturating_mul(limit))
            .min(i64::MAX as u64);
        (offset, limit)
    }
}
