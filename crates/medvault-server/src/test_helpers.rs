use std::sync::Arc;

use axum::Router;
use medvault_core::upload::UploadPolicy;
use medvault_service::LocalService;
use medvault_store::StoreConfig;
use tokio::net::TcpListener;

use crate::routes::{build_router, InnerAppState};

/// Build a test router with in-memory SQLite and a temp local store.
pub async fn test_router() -> Router {
    test_router_with_policy(UploadPolicy::default()).await
}

pub async fn test_router_with_policy(policy: UploadPolicy) -> Router {
    let db = Arc::new(medvault_db::SqliteDatabase::open_in_memory().unwrap());
    let blob_dir = tempfile::tempdir().unwrap().keep();
    let store = medvault_store::create_store(&StoreConfig::local(blob_dir.to_string_lossy())).unwrap();
    let service = LocalService::new(db, store).with_policy(policy);
    build_router(Arc::new(InnerAppState { service }))
}

/// A running test server with base_url and background task handle.
pub struct TestServer {
    pub base_url: String,
    _handle: tokio::task::JoinHandle<()>,
}

/// Spawn an axum test server on a random port. Returns the TestServer
/// with the `base_url` (e.g. "http://127.0.0.1:12345").
pub async fn spawn_test_server() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{addr}");
    let app = test_router().await;
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer {
        base_url,
        _handle: handle,
    }
}
