use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use account_api::{
    config::Config,
    db::{self, MemoryUserStore, PgUserStore, UserStore},
    routes, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);

    let store: Arc<dyn UserStore> = match &config.database_url {
        Some(url) => {
            let pool = db::postgres::create_pool(url).await?;
            db::postgres::provision_schema(&pool).await?;
            info!("Database connected and schema provisioned");
            Arc::new(PgUserStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set: using the in-memory store, data is lost on exit");
            Arc::new(MemoryUserStore::new())
        }
    };

    let state = AppState::new(config.clone(), store);
    let app = routes::router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("account API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
