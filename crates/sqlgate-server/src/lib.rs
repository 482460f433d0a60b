//! HTTP facade for the sqlgate database gateway.
//!
//! Serves the operator surface around the policy kernel:
//! - session login against the configured users provider
//! - target listing and per-target query forms
//! - query execution (policy check first, always) with HTML and JSON output
//! - query history backed by the internal storage database

pub mod auth;
pub mod error;
pub mod handlers;
pub mod query;
pub mod routes;
pub mod state;
pub mod storage;
pub mod templates;

pub use error::FacadeError;
pub use state::AppState;

use sqlgate_core::config::Config;

/// Validate configuration, connect storage, and serve the facade until the
/// process is stopped.
pub async fn serve(config: Config) -> Result<(), FacadeError> {
    let port = config.facade.port;
    let state = AppState::init(config).await?;

    let address = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "facade listening");

    axum::serve(listener, routes::router(state)).await?;
    Ok(())
}
