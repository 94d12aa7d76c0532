//! API errors and the JSON body they are rendered as.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use uuid::Uuid;

const INTERNAL_MESSAGE: &str = "An internal server error occurred";

/// Body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    pub code: String,
    #[serde(default)]
    pub details: Vec<Value>,
    /// Matches the `error_id` of the server log line for this failure
    pub trace_id: String,
    pub timestamp: String,
}

#[derive(Error, Debug)]
pub enum AppError {
    /// The payload broke one or more field rules
    #[error("validation error: {message}")]
    Validation { message: String, details: Vec<Value> },

    /// A unique field is already taken
    #[error("conflict: {message}")]
    Conflict { message: String, details: Vec<Value> },

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(details: Vec<Value>, message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn conflict(details: Vec<Value>, message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Machine-readable `code` of the response body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::Conflict { .. } => "conflict",
            AppError::NotFound(_) => "not_found",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// HTTP status this error is reported with.
    ///
    /// Conflicts share 400 with validation failures; `code` tells them apart.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::Conflict { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_message_and_details(self) -> (String, Vec<Value>) {
        match self {
            AppError::Validation { message, details } | AppError::Conflict { message, details } => {
                (message, details)
            }
            AppError::NotFound(message) => (message, Vec::new()),
            AppError::Internal(e) => (format!("{e:#}"), Vec::new()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();
        let status = self.status();
        let code = self.code();
        let (message, details) = self.into_message_and_details();

        tracing::error!(
            error_id = %error_id,
            error_code = code,
            status_code = status.as_u16(),
            message = %message,
            "request failed"
        );

        // Internal details stay in the log in release builds
        let message = if cfg!(not(debug_assertions)) && status.is_server_error() {
            INTERNAL_MESSAGE.to_string()
        } else {
            message
        };

        let body = ErrorBody {
            message,
            code: code.to_string(),
            details,
            trace_id: error_id.to_string(),
            timestamp: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::json;

    async fn body_of(response: Response) -> ErrorBody {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn codes_and_statuses() {
        let cases = [
            (AppError::validation(vec![], "bad"), "validation_error", StatusCode::BAD_REQUEST),
            (AppError::conflict(vec![], "dup"), "conflict", StatusCode::BAD_REQUEST),
            (AppError::not_found("gone"), "not_found", StatusCode::NOT_FOUND),
            (
                AppError::Internal(anyhow::anyhow!("data file unwritable")),
                "internal_error",
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, code, status) in cases {
            assert_eq!(error.code(), code);
            assert_eq!(error.status(), status, "{code}");
        }
    }

    #[tokio::test]
    async fn not_found_body_has_trace_id_and_timestamp() {
        let response = AppError::not_found("Book not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_of(response).await;
        assert_eq!(body.message, "Book not found");
        assert_eq!(body.code, "not_found");
        assert!(body.details.is_empty());
        assert!(Uuid::parse_str(&body.trace_id).is_ok());
        assert!(OffsetDateTime::parse(&body.timestamp, &Rfc3339).is_ok());
    }

    #[tokio::test]
    async fn validation_body_keeps_field_details() {
        let details = vec![json!({"field": "isbn", "message": "ISBN is required"})];
        let response = AppError::validation(details.clone(), "ISBN is required").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_of(response).await;
        assert_eq!(body.code, "validation_error");
        assert_eq!(body.details, details);
    }

    #[tokio::test]
    async fn conflict_body_keeps_details() {
        let details = vec![json!({"field": "isbn", "value": "111"})];
        let response = AppError::conflict(details.clone(), "ISBN already exists").into_response();

        let body = body_of(response).await;
        assert_eq!(body.code, "conflict");
        assert_eq!(body.message, "ISBN already exists");
        assert_eq!(body.details, details);
    }
}
