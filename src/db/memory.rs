use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{StoreError, StoreResult, UserField, UserFilter, UserStore};
use crate::models::{
    auth::TokenPair,
    user::{NewUser, User},
};

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    by_id: HashMap<String, usize>,
}

/// Process-local store used for development and tests. Each method takes the
/// lock once, so every operation is atomic with respect to the others.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: RwLock<Inner>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn field_of<'a>(user: &'a User, field: UserField) -> &'a str {
    match field {
        UserField::Email => &user.email,
        UserField::Phone => &user.phone,
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn count_matching(&self, field: UserField, value: &str) -> StoreResult<u64> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().filter(|u| field_of(u, field) == value).count() as u64)
    }

    async fn insert_one(&self, user: NewUser) -> StoreResult<String> {
        let mut inner = self.inner.write().await;
        if inner.by_id.contains_key(&user.user_id) {
            return Err(StoreError::Conflict("user"));
        }
        for (field, value, label) in [
            (UserField::Email, &user.email, "email"),
            (UserField::Phone, &user.phone, "phone"),
        ] {
            if inner.users.iter().any(|u| field_of(u, field) == value.as_str()) {
                return Err(StoreError::Conflict(label));
            }
        }

        let id = user.user_id.clone();
        let idx = inner.users.len();
        inner.users.push(User {
            user_id: user.user_id,
            email: user.email,
            phone: user.phone,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            token: Some(user.token),
            refresh_token: Some(user.refresh_token),
            created_at: user.created_at,
            updated_at: user.created_at,
        });
        inner.by_id.insert(id.clone(), idx);
        Ok(id)
    }

    async fn find_one(&self, filter: &UserFilter) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        let found = match filter {
            UserFilter::ById(id) => inner.by_id.get(id).map(|&i| &inner.users[i]),
            UserFilter::ByEmail(email) => inner.users.iter().find(|u| &u.email == email),
        };
        Ok(found.cloned())
    }

    async fn update_tokens(
        &self,
        user_id: &str,
        tokens: &TokenPair,
        updated_at: DateTime<Utc>,
        upsert: bool,
    ) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let Some(&idx) = inner.by_id.get(user_id) else {
            return Err(anyhow::anyhow!("no identity with user_id {user_id}").into());
        };
        let user = &mut inner.users[idx];
        // An absent pair here is what a missing `user_tokens` row is in Postgres.
        if user.token.is_none() && !upsert {
            return Ok(());
        }
        user.token = Some(tokens.access_token.clone());
        user.refresh_token = Some(tokens.refresh_token.clone());
        user.updated_at = updated_at;
        Ok(())
    }

    async fn list(&self, offset: u64, limit: u64) -> StoreResult<(u64, Vec<User>)> {
        let inner = self.inner.read().await;
        let page = inner
            .users
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok((inner.users.len() as u64, page))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
