pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::{sync::Arc, time::Duration};

use config::Config;
use db::UserStore;
use services::{
    accounts::AccountService,
    password::PasswordVault,
    tokens::{TokenIssuer, TokenKeys, TokenValidator},
};

/// Application state shared across all handlers. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub accounts: AccountService,
    pub validator: TokenValidator,
}

impl AppState {
    /// Wires every component from the loaded config and an open store.
    pub fn new(config: Arc<Config>, store: Arc<dyn UserStore>) -> Self {
        let keys = Arc::new(TokenKeys::from_secret(&config.secret_key));
        let issuer = TokenIssuer::new(
            keys.clone(),
            chrono::Duration::hours(config.access_token_ttl_hours as i64),
            chrono::Duration::days(config.refresh_token_ttl_days as i64),
        );
        let accounts = AccountService::new(
            store,
            PasswordVault::new(config.bcrypt_cost),
            issuer,
            Duration::from_secs(config.store_timeout_secs),
        );
        Self {
            config,
            accounts,
            validator: TokenValidator::new(keys),
        }
    }
}
