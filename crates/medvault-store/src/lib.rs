mod local;
#[cfg(feature = "s3")]
mod s3;

pub use local::LocalStore;
#[cfg(feature = "s3")]
pub use s3::S3Store;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("store error: {0}")]
    Internal(String),
}

/// A store for opaque blobs keyed by string paths.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write (create or overwrite) an object.
    async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError>;

    /// Read an object. Returns `StoreError::NotFound` if absent.
    async fn get(&self, key: &str) -> Result<Bytes, StoreError>;

    /// Delete an object. No-op if absent.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// List object keys under a prefix.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Check if an object exists.
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        match self.get(key).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

// -- Key helpers --

pub const DOCUMENTS_PREFIX: &str = "documents";

/// Blob keys carry no client input. The original filename lives only in
/// the metadata record.
pub fn document_blob_key(blob_id: &str) -> String {
    format!("{DOCUMENTS_PREFIX}/{blob_id}.pdf")
}

// -- Configuration --

/// Configuration for the object store backend.
pub struct StoreConfig {
    /// S3-compatible endpoint URL (e.g., "http://127.0.0.1:9000").
    /// When `None`, use local filesystem.
    pub endpoint_url: Option<String>,
    /// S3 region (e.g., "garage", "us-east-1").
    pub region: Option<String>,
    /// S3 bucket name.
    pub bucket: Option<String>,
    /// AWS access key ID.
    pub access_key_id: Option<String>,
    /// AWS secret access key.
    pub secret_access_key: Option<String>,
    /// Local filesystem base directory (used when S3 is not configured).
    pub local_data_dir: Option<String>,
}

impl StoreConfig {
    /// Build from environment variables.
    /// If `MEDVAULT_S3_ENDPOINT` (or `AWS_ENDPOINT_URL`) is set along with
    /// credentials and a bucket name, use S3. Otherwise, fall back to local filesystem.
    pub fn from_env() -> Self {
        Self {
            endpoint_url: std::env::var("MEDVAULT_S3_ENDPOINT")
                .or_else(|_| std::env::var("AWS_ENDPOINT_URL"))
                .ok(),
            region: std::env::var("MEDVAULT_S3_REGION")
                .or_else(|_| std::env::var("AWS_REGION"))
                .ok(),
            bucket: std::env::var("MEDVAULT_S3_BUCKET").ok(),
            access_key_id: std::env::var("MEDVAULT_S3_ACCESS_KEY_ID")
                .or_else(|_| std::env::var("AWS_ACCESS_KEY_ID"))
                .ok(),
            secret_access_key: std::env::var("MEDVAULT_S3_SECRET_ACCESS_KEY")
                .or_else(|_| std::env::var("AWS_SECRET_ACCESS_KEY"))
                .ok(),
            local_data_dir: None,
        }
    }

    /// Local-only configuration rooted at `dir`.
    pub fn local(dir: impl Into<String>) -> Self {
        Self {
            endpoint_url: None,
            region: None,
            bucket: None,
            access_key_id: None,
            secret_access_key: None,
            local_data_dir: Some(dir.into()),
        }
    }

    pub fn is_s3(&self) -> bool {
        self.endpoint_url.is_some()
            && self.access_key_id.is_some()
            && self.secret_access_key.is_some()
            && self.bucket.is_some()
    }
}

// -- Factory --

/// Create an `ObjectStore` from configuration.
pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn ObjectStore>, StoreError> {
    if config.is_s3() {
        #[cfg(feature = "s3")]
        {
            tracing::info!(
                bucket = config.bucket.as_deref().unwrap_or_default(),
                "using s3 object store"
            );
            Ok(Arc::new(S3Store::new(config)?))
        }
        #[cfg(not(feature = "s3"))]
        {
            Err(StoreError::Internal(
                "S3 configuration detected but the 's3' feature is not enabled".into(),
            ))
        }
    } else {
        let store = LocalStore::new(config);
        tracing::info!(base_dir = %store.base_dir().display(), "using local object store");
        Ok(Arc::new(store))
    }
}
