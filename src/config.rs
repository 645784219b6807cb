use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    /// When absent the service falls back to the in-memory store.
    pub database_url: Option<String>,
    pub secret_key: String,
    pub access_token_ttl_hours: u64,
    pub refresh_token_ttl_days: u64,
    pub store_timeout_secs: u64,
    pub bcrypt_cost: u32,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let secret_key = required("SECRET_KEY")?;
        if secret_key.trim().is_empty() {
            anyhow::bail!("SECRET_KEY must not be empty");
        }

        let bcrypt_cost: u32 = env::var("BCRYPT_COST")
            .unwrap_or_else(|_| bcrypt::DEFAULT_COST.to_string())
            .parse()?;
        if !(4..=31).contains(&bcrypt_cost) {
            anyhow::bail!("BCRYPT_COST must be between 4 and 31, got {bcrypt_cost}");
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            secret_key,
            access_token_ttl_hours: env::var("ACCESS_TOKEN_TTL_HOURS")
                .unwrap_or_else(|_| "24".into())
                .parse()?,
            refresh_token_ttl_days: env::var("REFRESH_TOKEN_TTL_DAYS")
                .unwrap_or_else(|_| "7".into())
                .parse()?,
            store_timeout_secs: env::var("STORE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "100".into())
                .parse()?,
            bcrypt_cost,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".into())
                .parse()?,
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing required env var: {}", key))
}
