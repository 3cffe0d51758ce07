//! HTTP error responses.

use axum::extract::rejection::{BytesRejection, JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::Error;
use crate::upload::UploadError;

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable description.
    pub message: String,
}

/// An error on its way out as an HTTP response.
#[derive(Debug)]
pub enum ApiError {
    /// Raised by the service layer.
    Service(Error),
    /// Raised by an extractor before the handler ran.
    Rejected {
        /// Status to answer with.
        status: StatusCode,
        /// Description of what was wrong with the request.
        message: String,
    },
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::Service(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl ApiError {
    /// Keep axum's status for a rejection, except that bodies which parse but
    /// do not fit the request type count as plain validation errors.
    fn rejected(status: StatusCode, message: String) -> Self {
        let status = if status == StatusCode::UNPROCESSABLE_ENTITY {
            StatusCode::BAD_REQUEST
        } else {
            status
        };
        Self::Rejected { status, message }
    }

    /// The status code this error maps to.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        let err = match self {
            Self::Rejected { status, .. } => return *status,
            Self::Service(err) => err,
        };
        match err {
            Error::Unauthenticated | Error::SessionExpired | Error::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::DocumentNotFound { .. } | Error::BlobNotFound { .. } => StatusCode::NOT_FOUND,
            Error::Upload(UploadError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Upload(UploadError::UnsupportedType { .. } | UploadError::ContentMismatch { .. }) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            Error::Upload(_)
            | Error::SuggestionRequired
            | Error::InvalidDecision { .. }
            | Error::UnknownStatus(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() {
            // internals stay in the log
            match &self {
                Self::Service(err) => tracing::error!(error = %err, "Request failed"),
                Self::Rejected { message, .. } => {
                    tracing::error!(error = %message, "Request rejected");
                }
            }
            "internal server error".to_string()
        } else {
            match self {
                Self::Service(err) => err.to_string(),
                Self::Rejected { message, .. } => message,
            }
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(err: Error) -> StatusCode {
        ApiError::from(err).status_code()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(status(Error::Unauthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(status(Error::SessionExpired), StatusCode::UNAUTHORIZED);
        assert_eq!(status(Error::forbidden("no")), StatusCode::FORBIDDEN);
        assert_eq!(status(Error::document_not_found("x")), StatusCode::NOT_FOUND);
        assert_eq!(status(Error::SuggestionRequired), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(Error::UnknownStatus("maybe".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(Error::internal("boom")), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_upload_status_codes() {
        assert_eq!(
            status(UploadError::TooLarge { size: 2, max: 1 }.into()),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            status(
                UploadError::UnsupportedType {
                    found: "text/plain".into(),
                    allowed: vec![],
                }
                .into()
            ),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            status(UploadError::EmptyFile.into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_rejection_status() {
        let err = ApiError::rejected(StatusCode::UNPROCESSABLE_ENTITY, "missing field".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = ApiError::rejected(StatusCode::PAYLOAD_TOO_LARGE, "too big".into());
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);

        let err = ApiError::rejected(StatusCode::UNSUPPORTED_MEDIA_TYPE, "not json".into());
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn test_internal_error_message_is_hidden() {
        let response = ApiError::from(Error::internal("secret detail")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
