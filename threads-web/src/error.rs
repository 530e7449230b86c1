//! JSON error responses
//!
//! Errors are reported as `{"error": true, "message": ...}`. Remote failures
//! keep HTTP 200 so page scripts read the body for the outcome; requests the
//! server rejects outright get a 4xx.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use libthreadcast::ThreadcastError;

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: bool,
    message: &'a str,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ThreadcastError> for ApiError {
    fn from(error: ThreadcastError) -> Self {
        let status = match &error {
            ThreadcastError::Validation(_) | ThreadcastError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            ThreadcastError::NotAuthenticated(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::OK,
        };
        Self::new(status, error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: true,
            message: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
