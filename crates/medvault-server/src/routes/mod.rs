pub mod documents;
pub mod health;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use medvault_core::upload::MAX_UPLOAD_BYTES;
use medvault_service::LocalService;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Transport cap on request bodies. Well above the upload cap so an
/// oversize PDF still reaches validation and gets the size message.
pub const BODY_LIMIT_BYTES: usize = MAX_UPLOAD_BYTES * 4;

pub struct InnerAppState {
    pub service: LocalService,
}

pub type AppState = Arc<InnerAppState>;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(documents::routes())
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
