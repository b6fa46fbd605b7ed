use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use service_catalog::{
    AppConfig, AppState, Catalog, DenyAll, HttpRecommender, JwtVerifier, Migrator, SharedRecommender,
    SharedVerifier, router,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env().context("failed to load configuration")?;
    info!(addr = %config.bind_addr, "Configuration loaded");

    let mut options = ConnectOptions::new(config.database_url.clone());
    options
        .max_connections(config.database_max_connections)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .context("failed to connect to database")?;

    if config.run_migrations {
        Migrator::up(&db, None)
            .await
            .context("failed to run migrations")?;
        info!("Migrations applied");
    }

    let verifier: SharedVerifier = match &config.jwt_secret {
        Some(secret) => Arc::new(JwtVerifier::new(secret)),
        None => {
            warn!("JWT_SECRET not set; status endpoints will reject every request");
            Arc::new(DenyAll)
        }
    };

    let recommender: Option<SharedRecommender> = match config.recommender_url.as_deref() {
        Some(url) => {
            let client = HttpRecommender::new(url, Duration::from_secs(10))
                .context("failed to build recommendation client")?;
            Some(Arc::new(client) as SharedRecommender)
        }
        None => None,
    };
    if recommender.is_none() {
        warn!("RECOMMENDER_URL not set; recommendation endpoints are disabled");
    }

    let state = AppState {
        catalog: Catalog::new(db),
        verifier,
        recommender,
    };
    let app = router(state, config.request_timeout);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .context("failed to bind to address")?;
    info!(addr = %config.bind_addr, "API listening, docs at /docs");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
    }
    info!("Shutting down");
}
