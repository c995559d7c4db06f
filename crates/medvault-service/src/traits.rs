use async_trait::async_trait;
use bytes::Bytes;
use medvault_core::document::Document;
use medvault_core::upload::UploadError;
use thiserror::Error;

/// Failures surfaced to callers of a [`DocumentService`].
///
/// `Display` is what clients see. `NotFound` and `Storage` keep a diagnostic
/// payload for logs that never reaches the wire.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input rejected before anything was written.
    #[error("{0}")]
    Validation(String),

    /// The id is unknown or its content is gone.
    #[error("Document not found.")]
    NotFound(String),

    /// A backing store failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<UploadError> for ServiceError {
    fn from(e: UploadError) -> Self {
        ServiceError::Validation(e.to_string())
    }
}

impl From<medvault_db::DbError> for ServiceError {
    fn from(e: medvault_db::DbError) -> Self {
        match e {
            medvault_db::DbError::NotFound(msg) => ServiceError::NotFound(msg),
            other => ServiceError::Storage(other.to_string()),
        }
    }
}

impl From<medvault_store::StoreError> for ServiceError {
    fn from(e: medvault_store::StoreError) -> Self {
        match e {
            medvault_store::StoreError::NotFound(key) => {
                ServiceError::NotFound(format!("blob {key}"))
            }
            other => ServiceError::Storage(other.to_string()),
        }
    }
}

/// A client upload as it arrives from the boundary.
#[derive(Debug, Clone, Default)]
pub struct UploadDocument {
    pub filename: String,
    /// Content type declared by the client, if any.
    pub content_type: Option<String>,
    pub patient_id: String,
    pub content: Bytes,
}

/// Stored bytes plus the name to save them under.
#[derive(Debug, Clone)]
pub struct DocumentDownload {
    pub filename: String,
    pub content: Bytes,
}

/// Document operations.
///
/// `LocalService` talks to the stores directly; `HttpService` talks to a
/// running medvault-server.
#[async_trait]
pub trait DocumentService: Send + Sync {
    async fn upload(&self, input: UploadDocument) -> Result<Document, ServiceError>;
    async fn list_documents(&self) -> Result<Vec<Document>, ServiceError>;
    async fn get_document(&self, id: &str) -> Result<Document, ServiceError>;
    async fn download(&self, id: &str) -> Result<DocumentDownload, ServiceError>;
    async fn delete_document(&self, id: &str) -> Result<(), ServiceError>;
}
