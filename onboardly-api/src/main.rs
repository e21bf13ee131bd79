//! # Onboardly API Server
//!
//! Serves the REST API under `/api`, the health probe, and in production the
//! front-end build.
//!
//! ## Usage
//!
//! ```bash
//! ONBOARDLY__SESSION__SECRET=... cargo run -p onboardly-api
//! ```
//!
//! Set `ONBOARDLY__DATABASE__URL=memory://` to run without PostgreSQL.

use std::time::Duration;

use anyhow::Context;
use onboardly_api::{
    app::{build_router, AppState},
    config::Config,
    reaper::SessionReaper,
};
use onboardly_shared::auth::strategy;
use onboardly_shared::db::{migrations, pool};
use onboardly_shared::store::Stores;
use tokio::{net::TcpListener, signal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    let json = config.log.json;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "onboardly_api=debug,onboardly_shared=debug,tower_http=info".into()
            }),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();

    tracing::info!(
        version = onboardly_shared::VERSION,
        environment = config.environment.as_str(),
        "Onboardly API server starting"
    );

    let stores = connect_stores(&config).await?;
    tracing::info!(backend = stores.kind().as_str(), "Stores ready");

    strategy::warm_up().await;

    let reap_interval = Duration::from_secs(config.session.reap_interval_seconds);
    let addr = config.bind_address();

    let state = AppState::new(config, stores.clone()).context("Invalid session configuration")?;
    let app = build_router(state);

    let (reaper_token, reaper) = SessionReaper::new(stores.sessions.clone(), reap_interval).spawn();

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    reaper_token.cancel();
    if let Err(e) = reaper.await {
        tracing::warn!(error = %e, "Session reaper did not stop cleanly");
    }
    stores.close().await;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Memory stores for `memory://`, otherwise a migrated PostgreSQL pool
async fn connect_stores(config: &Config) -> anyhow::Result<Stores> {
    if config.database.is_memory() {
        tracing::warn!("Using in-memory stores; data is lost on exit");
        return Ok(Stores::in_memory());
    }

    if !config.environment.is_production() {
        migrations::ensure_database_exists(&config.database.url)
            .await
            .context("Failed to create database")?;
    }

    let pool = pool::create_pool(config.database.pool_config())
        .await
        .context("Failed to connect to database")?;
    migrations::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    Ok(Stores::postgres(pool))
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, draining requests"),
        _ = terminate => tracing::info!("Received SIGTERM, draining requests"),
    }
}
