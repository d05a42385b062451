//! # API Errors
//!
//! Every failure reaching a handler is rendered as a JSON body carrying the
//! error kind, its message and, for validation failures, one entry per path.

use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use docmodel::error::{DocumentStoreError, FieldErrorKind};

use crate::render;

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Failure reported by the access layer, passed through unchanged
    #[error(transparent)]
    Store(#[from] DocumentStoreError),

    /// Request body that is not a JSON object
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Store(DocumentStoreError::Connection(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ApiError::Store(error) => error.kind(),
            ApiError::InvalidBody(_) => "InvalidBody",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FieldErrorBody {
    pub kind: FieldErrorKind,
    pub path: String,
    pub message: String,
    pub value: Value,
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub name: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, FieldErrorBody>>,
}

impl From<ApiError> for ErrorResponse {
    fn from(err: ApiError) -> Self {
        let name = err.name();
        let message = err.to_string();

        let errors = match err {
            ApiError::Store(DocumentStoreError::Validation(validation)) => Some(
                validation
                    .errors
                    .into_iter()
                    .map(|(path, error)| {
                        let body = FieldErrorBody {
                            kind: error.kind,
                            path: error.path,
                            message: error.message,
                            value: render::bson(error.value),
                        };
                        (path, body)
                    })
                    .collect(),
            ),
            _ => None,
        };

        Self { name, message, errors }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(target: "docmodel::server", error = %self, "request failed");
        }

        (status, Json(ErrorResponse::from(self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmodel::error::{FieldError, ValidationError};
    use bson::Bson;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::from(DocumentStoreError::Connection("refused".to_string())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(DocumentStoreError::Backend("boom".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::InvalidBody("[]".to_string()).status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_validation_body_lists_each_path() {
        let mut validation = ValidationError::new("Kitten");
        validation.push(FieldError {
            kind: FieldErrorKind::Required,
            path: "age".to_string(),
            message: "Why no age?".to_string(),
            value: Bson::Null,
        });

        let body = ErrorResponse::from(ApiError::from(DocumentStoreError::from(validation)));
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["name"], "ValidationError");
        assert_eq!(json["message"], "Kitten validation failed: age: Why no age?");
        assert_eq!(json["errors"]["age"]["kind"], "required");
        assert_eq!(json["errors"]["age"]["value"], Value::Null);
    }
}
