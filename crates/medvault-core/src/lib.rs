pub mod admin;
pub mod disposition;
pub mod document;
pub mod upload;

pub use admin::{AdminCredentials, AdminUser, NewAdmin};
pub use document::{Document, NewDocument};
pub use upload::{UploadError, UploadPolicy, MAX_UPLOAD_BYTES, PDF_CONTENT_TYPE};
