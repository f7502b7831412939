//! HTTP error mapping shared by all handlers.

use auditlog_store::StoreError;
use auditlog_types::CursorError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::authz::AuthzError;
use crate::directory::DirectoryError;

/// Message returned for every authentication or authorization failure.
///
/// The same text is used whatever the cause so that responses never reveal
/// whether a user or domain exists.
pub const UNAUTHORIZED_MESSAGE: &str = "not authorized to view these audit events";

/// API error type mapping to HTTP status codes.
///
/// `Unauthorized` and `Internal` carry a detail that is logged but never
/// sent to the client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Machine-readable error kind used in the response body.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::BadRequest(msg) => {
                tracing::debug!(reason = %msg, "rejected malformed request");
                msg.clone()
            }
            ApiError::Unauthorized(detail) => {
                tracing::warn!(reason = %detail, "request not authorized");
                UNAUTHORIZED_MESSAGE.to_string()
            }
            ApiError::Internal(detail) => {
                tracing::error!(reason = %detail, "request failed");
                "internal server error".to_string()
            }
        };

        let body = Json(serde_json::json!({
            "error": {
                "kind": self.kind(),
                "message": message,
            }
        }));

        (self.status(), body).into_response()
    }
}

impl From<CursorError> for ApiError {
    fn from(err: CursorError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Directory(e) => e.into(),
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<r2d2::Error> for ApiError {
    fn from(err: r2d2::Error) -> Self {
        ApiError::Internal(format!("database connection unavailable: {err}"))
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("task join error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn unauthorized_hides_detail() {
        let err: ApiError = AuthzError::UnknownDomain("acme".to_string()).into();
        let (status, json) = body_json(err).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["kind"], "unauthorized");
        assert_eq!(json["error"]["message"], UNAUTHORIZED_MESSAGE);
        assert!(!json.to_string().contains("acme"));
    }

    #[tokio::test]
    async fn cursor_errors_are_bad_requests() {
        let err: ApiError = CursorError::InvalidOffset("x".to_string()).into();
        let (status, json) = body_json(err).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["kind"], "bad_request");
    }

    #[tokio::test]
    async fn directory_failures_are_internal() {
        let err: ApiError = AuthzError::Directory(DirectoryError::Database(
            rusqlite::Error::QueryReturnedNoRows,
        ))
        .into();
        let (status, json) = body_json(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"]["kind"], "internal");
        assert_eq!(json["error"]["message"], "internal server error");
    }
}
