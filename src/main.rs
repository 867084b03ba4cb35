//! Nimbus server binary.
//!
//! Resolves configuration from the environment, selects the storage
//! adapter through the registry and serves the REST API.
//!
//! # Environment Variables
//! - `NIMBUS_ADDR`: listen address (default: "0.0.0.0:3000")
//! - `NIMBUS_BASE_URI`: URI prefix stripped before routing (default: "/")
//! - `NIMBUS_ADAPTER`: storage adapter identifier (default: "memory")
//! - `NIMBUS_SEARCH_MODE`: default cross-dimension search mode, AND or OR
//!   (default: OR)
//! - `NIMBUS_DATE_COLUMN`: date column compared by date criteria, created
//!   or modified (default: created)

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use nimbus_core::{combine_mode_from_env_value, date_column_from_env_value, ServiceConfig};
use nimbus_storage::{AdapterRegistry, StorageFacade};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nimbus=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("NIMBUS_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let base_uri = std::env::var("NIMBUS_BASE_URI").unwrap_or_else(|_| "/".into());
    let adapter_name = std::env::var("NIMBUS_ADAPTER").unwrap_or_else(|_| "memory".into());
    let search_mode = combine_mode_from_env_value(std::env::var("NIMBUS_SEARCH_MODE").ok())?;
    let date_column = date_column_from_env_value(std::env::var("NIMBUS_DATE_COLUMN").ok())?;

    let config = Arc::new(ServiceConfig::new(
        base_uri,
        adapter_name,
        search_mode,
        date_column,
    )?);

    // Adapter selection happens exactly once; the choice is immutable for
    // the process lifetime.
    let registry = AdapterRegistry::with_builtins();
    let adapter = registry.build(config.adapter())?;
    let facade = Arc::new(StorageFacade::new(adapter));

    tracing::info!(
        "-- Starting Nimbus file store on {} (adapter: {})",
        addr,
        config.adapter()
    );

    let app = api_rest::app(AppState { config, facade });
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
