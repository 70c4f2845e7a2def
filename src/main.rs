//! `confighost`: a development key-value host for configuration forms.
//!
//! Serves the global table over a websocket at `/ws` using the binary frame
//! protocol from the `frames` crate.

mod config;
mod routes;
mod state;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{HostConfig, HostError};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), HostError> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("confighost: ignoring .env: {e}");
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = HostConfig::from_env()?;
    let state = match &config.data_path {
        Some(path) => AppState::from_snapshot(path.clone()).await?,
        None => AppState::default(),
    };

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await.map_err(HostError::Bind)?;

    info!(port = config.port, snapshot = ?config.data_path, "confighost listening");
    axum::serve(listener, app).await.map_err(HostError::Serve)
}
