pub mod bootstrap;
pub mod config;
mod routes;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

use std::sync::Arc;

use anyhow::Result;
use medvault_service::LocalService;
use tokio::net::TcpListener;

pub use routes::{build_router, AppState, InnerAppState};

pub async fn serve(listener: TcpListener, service: LocalService) -> Result<()> {
    let state = Arc::new(InnerAppState { service });
    let app = build_router(state);
    axum::serve(listener, app).await?;
    Ok(())
}
