//! Process configuration, read from the environment (and `.env` when present).

use std::time::Duration;

use anyhow::{Context, Result};

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub jwt_secret: String,
    pub nats_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = get("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt_secret = get("JWT_SECRET").filter(|s| !s.is_empty()).context("JWT_SECRET must be set")?;
        let port = parse_or(&get, "PORT", 8083)?;
        let db_max_connections = parse_or(&get, "DB_MAX_CONNECTIONS", 10)?;
        let acquire_secs = parse_or(&get, "DB_ACQUIRE_TIMEOUT_SECS", 30)?;
        Ok(Self {
            database_url,
            port,
            db_max_connections,
            db_acquire_timeout: Duration::from_secs(acquire_secs),
            jwt_secret,
            nats_url: get("NATS_URL").filter(|s| !s.is_empty()),
        })
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw.trim().parse().with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
