//! `api` crate — HTTP REST API layer.
//!
//! Exposes:
//!   POST   /api/v1/workflows
//!   GET    /api/v1/workflows
//!   GET    /api/v1/workflows/{id}
//!   POST   /api/v1/workflows/{id}/runs
//!   GET    /api/v1/runs/{id}
//!   POST   /api/v1/runs/{id}/cancel

pub mod handlers;

pub use handlers::{router, AppState};

use std::net::SocketAddr;

use tracing::info;

/// Bind and serve the API until the process is stopped.
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
