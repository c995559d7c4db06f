use std::sync::Arc;

use async_trait::async_trait;
use medvault_core::document::{Document, NewDocument};
use medvault_core::upload::UploadPolicy;
use medvault_db::Database;
use medvault_store::{ObjectStore, StoreError};
use tracing::{error, info, warn};

use crate::{DocumentDownload, DocumentService, ServiceError, UploadDocument};

/// Business rules over a metadata database and an object store.
///
/// Holds only shared handles, so one instance serves concurrent requests.
#[derive(Clone)]
pub struct LocalService {
    db: Arc<dyn Database>,
    store: Arc<dyn ObjectStore>,
    policy: UploadPolicy,
}

impl LocalService {
    pub fn new(db: Arc<dyn Database>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            db,
            store,
            policy: UploadPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: UploadPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> UploadPolicy {
        self.policy
    }
}

/// Write the blob, then the record. If the record cannot be written the blob
/// is deleted again so no content outlives a failed upload.
async fn store_document(
    db: Arc<dyn Database>,
    store: Arc<dyn ObjectStore>,
    input: UploadDocument,
) -> Result<Document, ServiceError> {
    let blob_id = uuid::Uuid::new_v4().to_string();
    let blob_key = medvault_store::document_blob_key(&blob_id);
    let file_size = input.content.len() as i64;

    store.put(&blob_key, input.content).await.map_err(|e| {
        error!(blob_key = %blob_key, error = %e, "blob write failed");
        ServiceError::Storage(format!("write blob: {e}"))
    })?;

    let new = NewDocument {
        filename: input.filename,
        patient_id: input.patient_id,
        blob_key: blob_key.clone(),
        file_size,
    };

    match db.insert_document(&new).await {
        Ok(doc) => {
            info!(id = %doc.id, file_size, "document uploaded");
            Ok(doc)
        }
        Err(insert_err) => {
            warn!(blob_key = %blob_key, error = %insert_err, "metadata insert failed, removing blob");
            if let Err(cleanup_err) = store.delete(&blob_key).await {
                error!(
                    blob_key = %blob_key,
                    error = %cleanup_err,
                    "compensating blob delete failed, content may be orphaned"
                );
                return Err(ServiceError::Storage(format!(
                    "insert metadata: {insert_err}; blob {blob_key} may be orphaned: {cleanup_err}"
                )));
            }
            Err(ServiceError::Storage(format!("insert metadata: {insert_err}")))
        }
    }
}

#[async_trait]
impl DocumentService for LocalService {
    async fn upload(&self, input: UploadDocument) -> Result<Document, ServiceError> {
        self.policy.validate(
            &input.filename,
            input.content_type.as_deref(),
            &input.patient_id,
            &input.content,
        )?;

        // Spawned so a caller that goes away cannot stop the saga between
        // the blob write and the insert (or its compensation).
        let task = tokio::spawn(store_document(self.db.clone(), self.store.clone(), input));
        task.await
            .map_err(|e| ServiceError::Storage(format!("upload task: {e}")))?
    }

    async fn list_documents(&self) -> Result<Vec<Document>, ServiceError> {
        Ok(self.db.list_documents().await?)
    }

    async fn get_document(&self, id: &str) -> Result<Document, ServiceError> {
        Ok(self.db.get_document(id).await?)
    }

    async fn download(&self, id: &str) -> Result<DocumentDownload, ServiceError> {
        let doc = self.db.get_document(id).await?;

        if !self.store.exists(&doc.blob_key).await? {
            warn!(id, blob_key = %doc.blob_key, "record has no blob");
            return Err(ServiceError::NotFound(format!("blob for document {id}")));
        }

        // A delete racing this read removes the blob first; that shows up
        // here as NotFound, same as a missing record.
        let content = match self.store.get(&doc.blob_key).await {
            Ok(content) => content,
            Err(StoreError::NotFound(_)) => {
                warn!(id, blob_key = %doc.blob_key, "blob vanished before read");
                return Err(ServiceError::NotFound(format!("blob for document {id}")));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(DocumentDownload {
            filename: doc.filename,
            content,
        })
    }

    async fn delete_document(&self, id: &str) -> Result<(), ServiceError> {
        let doc = self.db.get_document(id).await?;

        // Blob first. Its failure must not keep the record alive.
        if let Err(e) = self.store.delete(&doc.blob_key).await {
            warn!(id, blob_key = %doc.blob_key, error = %e, "blob delete failed, removing record anyway");
        }

        self.db.delete_document(id).await?;
        info!(id, "document deleted");
        Ok(())
    }
}
