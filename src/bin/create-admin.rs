/// Provision an ADMIN identity. Public signup only ever creates USER accounts,
/// so the first administrator has to come from here.
///
/// Usage: create-admin --email EMAIL --phone PHONE --first-name NAME --last-name NAME
///   The password is read from ADMIN_PASSWORD.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use account_api::{
    config::Config,
    db::{postgres, PgUserStore},
    models::user::{SignupRequest, UserRole},
    AppState,
};

#[derive(Parser)]
#[command(name = "create-admin", about = "Create an ADMIN account in the user store")]
struct Args {
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let password = std::env::var("ADMIN_PASSWORD").context("ADMIN_PASSWORD required")?;

    let config = Arc::new(Config::from_env()?);
    let database_url = config
        .database_url
        .clone()
        .context("DATABASE_URL required: an in-memory admin would vanish on exit")?;

    let pool = postgres::create_pool(&database_url).await?;
    postgres::provision_schema(&pool).await?;

    let state = AppState::new(config, Arc::new(PgUserStore::new(pool)));
    let candidate = SignupRequest {
        first_name: args.first_name,
        last_name: args.last_name,
        email: args.email,
        phone: args.phone,
        password,
        role: Some(UserRole::Admin),
    };

    let user = state
        .accounts
        .create(candidate, UserRole::Admin)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create admin: {e}"))?;

    tracing::info!("Created ADMIN {} ({})", user.email, user.user_id);
    Ok(())
}
