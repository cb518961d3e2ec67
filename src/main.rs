use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use studio_api::auth::FirebaseAuth;
use studio_api::config::AppConfig;
use studio_api::database::DatabaseManager;
use studio_api::{app, AppState};

#[tokio::main]
async fn main() {
    // Load .env (and app.env outside production) so cargo run picks up MONGODB_URI, etc.
    studio_api::config::load_env_files();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    if let Err(err) = run().await {
        tracing::error!("{:#}", err);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!("Starting Studio API in {:?} mode", config.environment);

    let database = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to MongoDB")?;
    let identity = Arc::new(FirebaseAuth::new(&config.auth));
    let state = AppState::new(database.store(), identity);

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Studio API listening on http://{}", bind_addr);

    axum::serve(listener, app(state, &config))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    database.close().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
