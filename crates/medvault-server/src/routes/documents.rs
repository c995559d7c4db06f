use axum::{
    body::Body,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Path, State,
    },
    http::{header, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use medvault_core::disposition;
use medvault_core::upload::{UploadError, PDF_CONTENT_TYPE};
use medvault_service::{DocumentService, ServiceError, UploadDocument};
use serde_json::{json, Value};
use tracing::error;

use super::AppState;

type ApiError = (StatusCode, Json<Value>);

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/documents", get(list_documents))
        .route("/api/documents/upload", post(upload_document))
        .route(
            "/api/documents/{id}",
            get(get_document).delete(delete_document),
        )
        .route("/api/documents/{id}/download", get(download_document))
}

async fn list_documents(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state
        .service
        .list_documents()
        .await
        .map(|docs| Json(json!(docs)))
        .map_err(to_error)
}

async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .get_document(&id)
        .await
        .map(|doc| Json(json!(doc)))
        .map_err(to_error)
}

async fn upload_document(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    // Anything that is not a multipart form has no file part.
    let mut multipart = multipart.map_err(|_| validation(UploadError::MissingField))?;

    let mut input = UploadDocument::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                input.filename = field.file_name().unwrap_or("").to_string();
                input.content_type = field.content_type().map(str::to_string);
                input.content = field.bytes().await.map_err(multipart_error)?;
            }
            "patient_id" => {
                input.patient_id = field.text().await.map_err(multipart_error)?;
            }
            _ => {}
        }
    }

    state
        .service
        .upload(input)
        .await
        .map(|doc| (StatusCode::CREATED, Json(json!(doc))))
        .map_err(to_error)
}

async fn download_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let download = state.service.download(&id).await.map_err(to_error)?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, PDF_CONTENT_TYPE)
        .header(header::CONTENT_LENGTH, download.content.len())
        .header(
            header::CONTENT_DISPOSITION,
            disposition::attachment(&download.filename),
        )
        .body(Body::from(download.content))
        .map_err(|e| to_error(ServiceError::Storage(format!("build response: {e}"))))
}

async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .delete_document(&id)
        .await
        .map(|()| Json(json!({ "success": true })))
        .map_err(to_error)
}

fn validation(e: UploadError) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() })))
}

/// A body over the transport limit surfaces as a multipart read error.
fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return validation(UploadError::TooLarge);
    }
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": e.body_text() })),
    )
}

fn to_error(e: ServiceError) -> ApiError {
    let (status, msg) = match &e {
        ServiceError::Validation(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
        ServiceError::Storage(detail) => {
            error!(error = %detail, "storage failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal storage error".to_string(),
            )
        }
    };
    (status, Json(json!({ "error": msg })))
}
