//! flightctl API server entry point.

use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use flightctl_gateway::{build_router, AppState, GatewayConfig};
use flightctl_store::{Db, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,flightctl=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GatewayConfig::from_env();
    tracing::info!(
        listen_addr = %config.listen_addr,
        database_path = %config.database_path,
        "Starting flightctl API server"
    );

    let db = if config.database_path == ":memory:" {
        Db::open_in_memory()?
    } else {
        Db::open(&config.database_path)?
    };
    let store = Arc::new(Store::new(&db));
    store.initial_migration()?;
    tracing::info!("Store migrated");

    let state = AppState::new(store);
    let app = build_router(state, &config)?;

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
