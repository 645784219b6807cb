use std::{future::Future, sync::Arc, time::Duration};

use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::{StoreError, UserField, UserFilter, UserStore},
    error::ApiError,
    models::{
        auth::{AuthenticatedUser, ClaimsInput, TokenPair},
        user::{LoginResponse, NewUser, SignupRequest, User, UserPage, UserRole},
    },
    services::{
        access::{self, ELEVATED_ROLE},
        metrics::STORE_TIMEOUTS_COUNTER,
        password::PasswordVault,
        tokens::TokenIssuer,
    },
};

/// Signup, login and lookup of identities. Holds no mutable state of its own;
/// clones share the store handle.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn UserStore>,
    vault: PasswordVault,
    issuer: TokenIssuer,
    store_timeout: Duration,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn UserStore>,
        vault: PasswordVault,
        issuer: TokenIssuer,
        store_timeout: Duration,
    ) -> Self {
        Self { store, vault, issuer, store_timeout }
    }

    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    /// Runs one store call under the timeout. The in-flight call is dropped
    /// when the deadline passes; it is not retried.
    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(StoreError::Conflict(what))) => {
                Err(ApiError::Duplicate(format!("this {what} already exists")))
            }
            Ok(Err(StoreError::Backend(e))) => {
                Err(ApiError::Internal(e.context(format!("store {operation} failed"))))
            }
            Err(_) => {
                STORE_TIMEOUTS_COUNTER.with_label_values(&[operation]).inc();
                Err(ApiError::Internal(anyhow::anyhow!(
                    "store {operation} timed out after {:?}",
                    self.store_timeout
                )))
            }
        }
    }

    /// Creates a USER identity from a public signup. Elevated roles cannot be self-assigned.
    pub async fn signup(&self, candidate: SignupRequest) -> Result<User, ApiError> {
        if candidate.role.is_some_and(|r| r != UserRole::User) {
            return Err(ApiError::Validation("signup can only create USER accounts".into()));
        }
        self.create(candidate, UserRole::User).await
    }

    /// Creates an identity with an explicit role. Reserved for operator tooling.
    pub async fn create(&self, candidate: SignupRequest, role: UserRole) -> Result<User, ApiError> {
        candidate.validate().map_err(ApiError::Validation)?;

        let email = candidate.email.trim().to_lowercase();
        let phone = candidate.phone.trim().to_string();

        // Both checks always run, even when the first already found a match.
        let email_count = self
            .bounded("count_email", self.store.count_matching(UserField::Email, &email))
            .await?;
        let phone_count = self
            .bounded("count_phone", self.store.count_matching(UserField::Phone, &phone))
            .await?;
        if email_count > 0 || phone_count > 0 {
            tracing::debug!(email_count, phone_count, "signup rejected as duplicate");
            return Err(ApiError::Duplicate("this email or phone number already exists".into()));
        }

        let password_hash = self.vault.hash(&candidate.password)?;
        let now = Utc::now();
        let user_id = Uuid::new_v4().to_string();
        let input = ClaimsInput {
            subject_id: user_id.clone(),
            email: email.clone(),
            first_name: candidate.first_name.trim().to_string(),
            last_name: candidate.last_name.trim().to_string(),
            role,
        };
        let tokens = self.issuer.issue_at(&input, now)?;

        let new_user = NewUser {
            user_id,
            email,
            phone,
            password_hash,
            first_name: input.first_name,
            last_name: input.last_name,
            role,
            token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            created_at: now,
        };
        let user = User {
            user_id: new_user.user_id.clone(),
            email: new_user.email.clone(),
            phone: new_user.phone.clone(),
            password_hash: new_user.password_hash.clone(),
            first_name: new_user.first_name.clone(),
            last_name: new_user.last_name.clone(),
            role,
            token: Some(new_user.token.clone()),
            refresh_token: Some(new_user.refresh_token.clone()),
            created_at: now,
            updated_at: now,
        };

        self.bounded("insert_one", self.store.insert_one(new_user)).await?;
        tracing::info!(user_id = %user.user_id, role = %role, "identity created");
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let email = email.trim().to_lowercase();
        let user = self
            .bounded("find_by_email", self.store.find_one(&UserFilter::ByEmail(email)))
            .await?
            .ok_or_else(|| ApiError::NotFound("user not found".into()))?;

        if !self.vault.verify(&user.password_hash, password)? {
            tracing::warn!(user_id = %user.user_id, "login rejected: bad password");
            return Err(ApiError::Auth("email or password is incorrect".into()));
        }

        let tokens = self.issuer.issue(&ClaimsInput::from(&user))?;
        self.persist_token_pair(&user.user_id, &tokens).await?;

        // Re-read so the response reflects what is stored.
        let user = self
            .bounded("find_by_id", self.store.find_one(&UserFilter::ById(user.user_id)))
            .await?
            .ok_or_else(|| ApiError::NotFound("user not found".into()))?;

        tracing::info!(user_id = %user.user_id, "login succeeded");
        Ok(LoginResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user: user.into(),
        })
    }

    /// Upserts the latest pair against the identity; earlier pairs are not revoked.
    pub async fn persist_token_pair(&self, user_id: &str, tokens: &TokenPair) -> Result<(), ApiError> {
        self.bounded(
            "update_tokens",
            self.store.update_tokens(user_id, tokens, tokens.issued_at, true),
        )
        .await
    }

    pub async fn get_by_id(
        &self,
        user_id: &str,
        caller: &AuthenticatedUser,
    ) -> Result<User, ApiError> {
        access::check_owner_or_role(caller, user_id, ELEVATED_ROLE)?;
        self.bounded("find_by_id", self.store.find_one(&UserFilter::ById(user_id.to_string())))
            .await?
            .ok_or_else(|| ApiError::NotFound("user not found".into()))
    }

    pub async fn list(
        &self,
        caller: &AuthenticatedUser,
        offset: u64,
        limit: u64,
    ) -> Result<UserPage, ApiError> {
        access::check_role(caller, UserRole::Admin)?;
        let (total_count, users) = self.bounded("list", self.store.list(offset, limit)).await?;
        Ok(UserPage {
            total_count,
            user_items: users.into_iter().map(Into::into).collect(),
        })
    }
}
