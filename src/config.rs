//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listen address (default: 0.0.0.0:3000).
    pub bind_addr: SocketAddr,

    /// Database connection URL (`postgres://...` or `sqlite://...`).
    pub database_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Per-request deadline (default: 30s). In-flight queries are dropped with the request.
    pub request_timeout: Duration,

    /// Base URL of the recommendation service. Recommendation routes are
    /// unavailable when unset.
    pub recommender_url: Option<String>,

    /// HS256 secret for bearer tokens. Mutation endpoints reject every
    /// request when unset.
    pub jwt_secret: Option<String>,

    /// Apply pending migrations at startup (default: true).
    pub run_migrations: bool,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Fails when `DATABASE_URL` is missing or a value does not parse.
    pub fn from_env() -> Result<Self> {
        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()
            .context("BIND_ADDR must be a socket address such as 0.0.0.0:3000")?;

        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let request_timeout = env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map(Duration::from_secs)
            .context("REQUEST_TIMEOUT_SECS must be a whole number of seconds")?;

        let recommender_url = non_empty(env::var("RECOMMENDER_URL").ok());
        let jwt_secret = non_empty(env::var("JWT_SECRET").ok());

        let run_migrations = env::var("RUN_MIGRATIONS")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .context("RUN_MIGRATIONS must be true or false")?;

        Ok(Self {
            bind_addr,
            database_url,
            database_max_connections,
            request_timeout,
            recommender_url,
            jwt_secret,
            run_migrations,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
