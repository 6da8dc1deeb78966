//! OpenSASE Warehouse - Self-hosted warehouse and inventory service

use anyhow::Result;
use opensase_warehouse::api::{self, AppState, Authenticator};
use opensase_warehouse::config::Config;
use opensase_warehouse::publisher::EventPublisher;
use opensase_warehouse::services::Services;
use opensase_warehouse::store::PgStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = Config::from_env()?;

    let store = PgStore::connect(&config.database_url, config.db_max_connections, config.db_acquire_timeout).await?;
    sqlx::migrate!("./migrations").run(store.pool()).await?;
    let events = EventPublisher::connect(config.nats_url.as_deref()).await;

    let state = AppState::new(Services::new(store, events));
    let app = api::router(state, Authenticator::new(config.jwt_secret.as_bytes()));

    tracing::info!("OpenSASE Warehouse listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?, app).await?;
    Ok(())
}
