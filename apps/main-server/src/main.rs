//! Travel social backend server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use auth::{KratosClient, KratosConfig};
use main_server::{config::Config, create_app, create_state, init_tracing};
use profile_store::PgProfileStore;
use tokio::{net::TcpListener, signal};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    init_tracing(&config.log_level);

    info!(
        app_env = %config.app_env,
        kratos_public_url = %config.kratos_public_url,
        "Starting travel social backend"
    );

    // Database
    let store = PgProfileStore::connect(&config.database_url(), config.db_max_connections).await?;
    store.init().await?;
    info!(
        host = %config.db_host,
        database = %config.db_name,
        "Connected to PostgreSQL"
    );

    // Identity provider
    let kratos = KratosClient::new(
        KratosConfig::new(&config.kratos_public_url, &config.kratos_admin_url)
            .with_timeout(config.request_timeout),
    )?;

    let state = create_state(config.clone(), Arc::new(store), Arc::new(kratos));
    let app = create_app(state);

    let addr: SocketAddr = config.server_addr().parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");
    if !config.is_production() {
        info!("GraphQL playground at http://{addr}/playground");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}
