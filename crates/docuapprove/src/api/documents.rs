//! Handlers for a user's own documents.

use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use super::context::AppState;
use super::error::ApiError;
use super::extractors::{ApiPath, ApiQuery, AuthUser, RawBody};
use crate::document::Document;
use crate::upload::{sanitize_file_name, Upload};

/// Declared type when a request carries no `Content-Type`.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Query parameters of `POST /documents`.
#[derive(Debug, Deserialize)]
pub struct UploadParams {
    /// Original file name.
    #[serde(default)]
    pub name: String,
    /// Optional note for the reviewer.
    pub reason: Option<String>,
}

/// Submit a file. The raw request body is the file.
#[tracing::instrument(skip_all, fields(user_id = %user.identity.user_id, name = %params.name))]
pub async fn upload(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(params): ApiQuery<UploadParams>,
    headers: HeaderMap,
    RawBody(body): RawBody,
) -> Result<(StatusCode, Json<Document>), ApiError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(FALLBACK_CONTENT_TYPE);

    let upload = Upload::new(params.name, content_type, body.to_vec()).with_reason(params.reason);
    let doc = state.documents.submit(&user.identity, upload).await?;
    Ok((StatusCode::CREATED, Json(doc)))
}

/// The caller's documents, newest first.
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Document>>, ApiError> {
    Ok(Json(state.documents.my_documents(&user.identity)?))
}

/// One document record.
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(state.documents.document(&user.identity, &id)?))
}

/// The stored file, served with its recorded type.
pub async fn content(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (doc, bytes) = state.documents.download(&user.identity, &id).await?;
    let disposition = format!("inline; filename=\"{}\"", sanitize_file_name(&doc.name));
    Ok((
        [(CONTENT_TYPE, doc.file_type), (CONTENT_DISPOSITION, disposition)],
        bytes,
    ))
}

/// Delete a document and its file.
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<String>,
) -> Result<StatusCode, ApiError> {
    state.documents.delete(&user.identity, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
