use std::env;

use anyhow::Context;
use tracing::info;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .context("DATABASE_URL must be set to the office hours Postgres instance")?;

        let max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(value) => value
                .parse()
                .with_context(|| format!("invalid DATABASE_MAX_CONNECTIONS value '{value}'"))?,
            Err(_) => {
                info!("DATABASE_MAX_CONNECTIONS not set, using default: {DEFAULT_MAX_CONNECTIONS}");
                DEFAULT_MAX_CONNECTIONS
            }
        };

        Ok(Self {
            database_url,
            max_connections,
        })
    }
}
