//! Response mapping.
//!
//! # Responsibilities
//! - Map classified errors to status codes and JSON bodies
//! - Keep internal failure details out of 500 responses
//!
//! Client and dependency errors carry a `detail` message; 500 responses only
//! say that something went wrong.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::orders::OrderError;

/// JSON body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            error: error.into(),
            detail,
        }
    }
}

/// 500 with no detail.
pub fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::new("Internal server error", None)),
    )
        .into_response()
}

pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(ErrorBody::new("Not found", None))).into_response()
}

impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            OrderError::Validation => (StatusCode::BAD_REQUEST, "Validation failed"),
            OrderError::DatabaseConnection | OrderError::ThirdPartyTimeout => {
                (StatusCode::SERVICE_UNAVAILABLE, "Service unavailable")
            }
            OrderError::Unexpected(_) => return internal_error(),
        };
        (status, Json(ErrorBody::new(error, Some(self.to_string())))).into_response()
    }
}
