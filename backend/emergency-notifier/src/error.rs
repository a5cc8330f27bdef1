/// Error types for the emergency notifier
///
/// Only input and directory failures abort an invocation. Push dispatch
/// failures are absorbed into the delivery result and never reach callers
/// as errors.
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Result type for notifier operations
pub type Result<T> = std::result::Result<T, NotifierError>;

/// Errors that fail a whole fan-out invocation.
#[derive(Error, Debug)]
pub enum NotifierError {
    /// Missing or malformed report fields
    #[error("Invalid emergency report: {0}")]
    InvalidInput(String),

    /// The user directory could not be enumerated
    #[error("Failed to read user directory: {0}")]
    Directory(#[from] DirectoryError),

    /// The invocation exceeded its time budget
    #[error("Emergency notification timed out after {0:?}")]
    Timeout(Duration),
}

impl NotifierError {
    /// Error kind reported to callers. Every unrecoverable failure is
    /// surfaced as `internal`.
    pub fn kind(&self) -> &'static str {
        "internal"
    }

    /// Label for logs and metrics
    pub fn reason(&self) -> &'static str {
        match self {
            NotifierError::InvalidInput(_) => "invalid_input",
            NotifierError::Directory(_) => "directory",
            NotifierError::Timeout(_) => "timeout",
        }
    }
}

/// User directory failures
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Directory unavailable: {0}")]
    Unavailable(String),
}

/// Push transport failures. Recorded per branch, never propagated.
#[derive(Error, Debug)]
pub enum PushError {
    #[error("FCM client not configured")]
    NotConfigured,

    #[error(transparent)]
    Fcm(#[from] fcm_push::FCMError),

    #[error("Push dispatch failed: {0}")]
    Other(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub data: Option<()>,
    pub error: ErrorBody,
}

impl ResponseError for NotifierError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            success: false,
            data: None,
            error: ErrorBody {
                kind: self.kind(),
                message: self.to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_error_is_internal() {
        let errors = vec![
            NotifierError::InvalidInput("missing category".to_string()),
            NotifierError::Directory(DirectoryError::Unavailable("down".to_string())),
            NotifierError::Timeout(Duration::from_secs(30)),
        ];

        for err in errors {
            assert_eq!(err.kind(), "internal");
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn test_error_messages() {
        let err = NotifierError::from(DirectoryError::Unavailable("connection refused".into()));
        assert_eq!(
            err.to_string(),
            "Failed to read user directory: Directory unavailable: connection refused"
        );
        assert_eq!(err.reason(), "directory");
        assert_eq!(
            PushError::NotConfigured.to_string(),
            "FCM client not configured"
        );
    }
}
