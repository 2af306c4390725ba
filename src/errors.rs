use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::models::request::RequestId;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum EdlError {
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),

    #[error("failed to read {key}: {source}")]
    FieldRead {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to write {key}: {source}")]
    StoreWrite {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("delete mismatch for request {id}: expected {expected} fields, deleted {deleted}")]
    DeleteMismatch {
        id: RequestId,
        expected: usize,
        deleted: usize,
    },

    #[error("invalid request id: {0:?}")]
    InvalidRequestId(String),

    #[error("invalid submission: {0}")]
    InvalidSubmission(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EdlError {
    /// True when a delete removed some but not all request fields, leaving
    /// the record half-deleted.
    pub fn is_partial_delete(&self) -> bool {
        matches!(self, EdlError::DeleteMismatch { expected, deleted, .. } if *deleted > 0 && deleted < expected)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            EdlError::FieldRead {
                source: StoreError::NotFound { .. },
                ..
            }
        )
    }

    /// Stable label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            EdlError::StoreUnavailable(_) => "store_unavailable",
            EdlError::FieldRead { .. } if self.is_not_found() => "not_found",
            EdlError::FieldRead { .. } => "field_read",
            EdlError::StoreWrite { .. } => "store_write",
            EdlError::DeleteMismatch { .. } if self.is_partial_delete() => "delete_partial",
            EdlError::DeleteMismatch { .. } => "delete_mismatch",
            EdlError::InvalidRequestId(_) => "invalid_request_id",
            EdlError::InvalidSubmission(_) => "invalid_submission",
            EdlError::Serialization(_) => "serialization",
        }
    }
}

/// Failures are opaque to HTTP callers: the status code is the only signal.
impl IntoResponse for EdlError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        match &self {
            EdlError::DeleteMismatch { id, deleted, .. } if self.is_partial_delete() => {
                tracing::error!(
                    request_id = %id,
                    deleted,
                    kind,
                    "request left partially deleted: {}",
                    self
                );
            }
            EdlError::DeleteMismatch { id, .. } => {
                tracing::warn!(request_id = %id, kind, "request already gone: {}", self);
            }
            EdlError::InvalidSubmission(_) => {
                tracing::warn!(kind, "{}", self);
                return StatusCode::BAD_REQUEST.into_response();
            }
            _ => {
                tracing::error!(kind, "{}", self);
            }
        }
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mismatch(deleted: usize) -> EdlError {
        EdlError::DeleteMismatch {
            id: RequestId::parse("42").unwrap(),
            expected: 3,
            deleted,
        }
    }

    #[test]
    fn test_delete_mismatch_partial_vs_gone() {
        assert!(!mismatch(0).is_partial_delete());
        assert!(mismatch(1).is_partial_delete());
        assert!(mismatch(2).is_partial_delete());
        assert_eq!(mismatch(0).kind(), "delete_mismatch");
        assert_eq!(mismatch(2).kind(), "delete_partial");
    }

    #[test]
    fn test_not_found_kind() {
        let err = EdlError::FieldRead {
            key: "request:99".into(),
            source: StoreError::NotFound {
                key: "request:99".into(),
                field: "url".into(),
            },
        };
        assert!(err.is_not_found());
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            mismatch(0).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            EdlError::InvalidRequestId(String::new())
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            EdlError::InvalidSubmission("url is required".into())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
    }
}
