use async_trait::async_trait;
use medvault_core::disposition;
use medvault_core::document::Document;
use medvault_core::upload::UploadError;
use reqwest::multipart::{Form, Part};
use reqwest::{header, Client, StatusCode};

use crate::{DocumentDownload, DocumentService, ServiceError, UploadDocument};

/// Async HTTP client implementation of DocumentService.
/// Connects to a running medvault-server.
pub struct HttpService {
    base_url: String,
    client: Client,
}

#[derive(serde::Deserialize)]
struct DeleteResponse {
    success: bool,
}

impl HttpService {
    pub fn new(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Client::new(),
        }
    }

    /// Check if the server is reachable.
    pub async fn health_check(&self) -> Result<(), ServiceError> {
        let resp = self
            .client
            .get(format!("{}/api/health", self.base_url))
            .send()
            .await
            .map_err(|e| ServiceError::Storage(format!("connection failed: {e}")))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ServiceError::Storage(format!(
                "health check failed: {}",
                resp.status()
            )))
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        let resp = self
            .client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        handle_response(resp).await
    }
}

async fn handle_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        resp.json::<T>()
            .await
            .map_err(|e| ServiceError::Storage(format!("json decode: {e}")))
    } else {
        Err(parse_error_with_status(status, resp).await)
    }
}

async fn parse_error_with_status(status: StatusCode, resp: reqwest::Response) -> ServiceError {
    let body = resp.text().await.unwrap_or_default();
    let msg = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v["error"].as_str().map(String::from))
        .unwrap_or(body);

    if status == StatusCode::NOT_FOUND {
        ServiceError::NotFound(msg)
    } else if status == StatusCode::BAD_REQUEST {
        ServiceError::Validation(msg)
    } else {
        ServiceError::Storage(msg)
    }
}

#[async_trait]
impl DocumentService for HttpService {
    async fn upload(&self, input: UploadDocument) -> Result<Document, ServiceError> {
        let mut part = Part::bytes(input.content.to_vec()).file_name(input.filename);
        if let Some(ct) = input.content_type.as_deref() {
            part = part
                .mime_str(ct)
                .map_err(|_| ServiceError::from(UploadError::NotPdf))?;
        }
        // Filenames go out verbatim; the server does not decode `filename*`.
        let form = Form::new()
            .percent_encode_noop()
            .part("file", part)
            .text("patient_id", input.patient_id);

        let resp = self
            .client
            .post(format!("{}/api/documents/upload", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        handle_response(resp).await
    }

    async fn list_documents(&self) -> Result<Vec<Document>, ServiceError> {
        self.get_json("/api/documents").await
    }

    async fn get_document(&self, id: &str) -> Result<Document, ServiceError> {
        self.get_json(&format!("/api/documents/{id}")).await
    }

    async fn download(&self, id: &str) -> Result<DocumentDownload, ServiceError> {
        let resp = self
            .client
            .get(format!("{}/api/documents/{id}/download", self.base_url))
            .send()
            .await
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(parse_error_with_status(status, resp).await);
        }

        let filename = resp
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(disposition::parse_filename)
            .unwrap_or_else(|| format!("{id}.pdf"));
        let content = resp
            .bytes()
            .await
            .map_err(|e| ServiceError::Storage(format!("read body: {e}")))?;

        Ok(DocumentDownload { filename, content })
    }

    async fn delete_document(&self, id: &str) -> Result<(), ServiceError> {
        let resp = self
            .client
            .delete(format!("{}/api/documents/{id}", self.base_url))
            .send()
            .await
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let body: DeleteResponse = handle_response(resp).await?;
        if body.success {
            Ok(())
        } else {
            Err(ServiceError::Storage("server reported delete failure".into()))
        }
    }
}
