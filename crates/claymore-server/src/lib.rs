//! Liveness endpoint for the Claymore stats agent.
//!
//! `GET /healthz` always answers `200 OK`. It reports that the process is up,
//! not whether the last poll cycle succeeded.

use axum::{Router, http::StatusCode, routing::get};
use tokio::net::TcpListener;

use claymore_core::{AgentError, Result};

/// Liveness route.
pub const HEALTH_PATH: &str = "/healthz";

async fn handle_healthz() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

/// Build the axum router.
pub fn build_router() -> Router {
    Router::new().route(HEALTH_PATH, get(handle_healthz))
}

/// Bind the health listener. Failure here is fatal at startup.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener> {
    let addr = format!("{host}:{port}");
    TcpListener::bind(&addr)
        .await
        .map_err(|source| AgentError::Bind { addr, source })
}

/// Serve the health route on an already-bound listener until the server stops.
pub async fn serve(listener: TcpListener) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        log::info!("health endpoint listening on http://{addr}{HEALTH_PATH}");
    }
    axum::serve(listener, build_router()).await
}

/// Bind and serve in one step.
pub async fn run_server(host: &str, port: u16) -> Result<()> {
    let listener = bind(host, port).await?;
    serve(listener).await.map_err(|source| AgentError::Io {
        addr: format!("{host}:{port}"),
        source,
    })
}
