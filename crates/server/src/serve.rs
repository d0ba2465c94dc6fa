use std::net::SocketAddr;

use tracelab_core::{Result, TracelabError};

use crate::routes;
use crate::state::AppState;

/// Binds the configured address and serves the scenario routes until the
/// listener fails. Shutdown (ctrl-c) is handled by the caller.
pub async fn run_server(state: AppState) -> Result<()> {
    let addr: SocketAddr = state
        .cfg
        .listen_addr
        .parse()
        .map_err(|e| TracelabError::Config(format!("bad listen_addr: {e}")))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| TracelabError::Http(format!("bind {addr}: {e}")))?;

    tracing::info!(%addr, "tracelab backend listening");
    axum::serve(listener, routes::router(state))
        .await
        .map_err(|e| TracelabError::Http(format!("server failed: {e}")))
}
