//! Admin dashboard handlers.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::context::AppState;
use super::error::ApiError;
use super::extractors::{ApiJson, ApiPath, ApiQuery, AuthUser};
use crate::document::{Decision, Document, DocumentStatus};
use crate::error::Result;

/// Query parameters of `GET /admin/documents`.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Restrict to one status.
    pub status: Option<String>,
}

/// Body of `POST /admin/documents/:id/decision`.
#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    /// `Approved` or `Declined`.
    pub status: String,
    /// Feedback for the uploader; required when declining.
    pub suggestion: Option<String>,
}

/// Response of `GET /admin/summary`.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    /// Awaiting review.
    pub pending: i64,
    /// Approved.
    pub approved: i64,
    /// Declined.
    pub declined: i64,
    /// All documents.
    pub total: i64,
}

fn parse_status(status: Option<&str>) -> Result<Option<DocumentStatus>> {
    status
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .transpose()
}

/// All documents, optionally filtered by status.
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(params): ApiQuery<ListParams>,
) -> std::result::Result<Json<Vec<Document>>, ApiError> {
    let status = parse_status(params.status.as_deref())?;
    Ok(Json(state.documents.all_documents(&user.identity, status)?))
}

/// Pending documents.
pub async fn queue(
    State(state): State<AppState>,
    user: AuthUser,
) -> std::result::Result<Json<Vec<Document>>, ApiError> {
    Ok(Json(state.documents.review_queue(&user.identity)?))
}

/// Approve or decline a document.
#[tracing::instrument(skip_all, fields(document_id = %id, status = %request.status))]
pub async fn decide(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<DecisionRequest>,
) -> std::result::Result<Json<Document>, ApiError> {
    let status: DocumentStatus = request.status.parse()?;
    let decision = Decision::new(status, request.suggestion)?;
    Ok(Json(state.documents.decide(&user.identity, &id, &decision)?))
}

/// Counts by status.
pub async fn summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> std::result::Result<Json<SummaryResponse>, ApiError> {
    let counts = state.documents.summary(&user.identity)?;
    Ok(Json(SummaryResponse {
        pending: counts.pending,
        approved: counts.approved,
        declined: counts.declined,
        total: counts.total(),
    }))
}
