use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored PDF and the patient it belongs to.
///
/// `blob_key` locates the content in the object store and goes over the wire
/// as `file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub filename: String,
    #[serde(rename = "file")]
    pub blob_key: String,
    pub patient_id: String,
    pub uploaded_at: DateTime<Utc>,
    pub file_size: i64,
}

/// Metadata for a document whose blob has already been written.
/// The store assigns `id` and `uploaded_at` on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
    pub filename: String,
    pub patient_id: String,
    pub blob_key: String,
    pub file_size: i64,
}
