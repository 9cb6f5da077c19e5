//! API error types with HTTP response mapping.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::CommerceError;
use serde::Serialize;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// A required query parameter is absent or empty.
    MissingParameter(&'static str),
    /// Malformed request body.
    BadRequest(String),
    /// Engine error.
    Commerce(CommerceError),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    code: &'a str,
    message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingParameter(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Commerce(err) => commerce_status(err),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::MissingParameter(_) => "MISSING_PARAMETER",
            ApiError::BadRequest(_) => "INVALID_INPUT",
            ApiError::Commerce(err) => err.code(),
        }
    }
}

fn commerce_status(err: &CommerceError) -> StatusCode {
    match err {
        CommerceError::UserInvalid(_)
        | CommerceError::ProductInvalid(_)
        | CommerceError::InvalidInput(_)
        | CommerceError::AddressLimitReached
        | CommerceError::EmptyCart => StatusCode::BAD_REQUEST,
        CommerceError::UserNotFound(_)
        | CommerceError::ProductNotFound(_)
        | CommerceError::SlotNotFound(_) => StatusCode::NOT_FOUND,
        CommerceError::DuplicateUser(_) | CommerceError::ConcurrentModification(_) => {
            StatusCode::CONFLICT
        }
        CommerceError::DecodeFailure(_)
        | CommerceError::UpdateFailed(_)
        | CommerceError::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        CommerceError::StoreTimeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        // Store text stays in the logs
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(code, error = ?self, "internal server error");
            "internal server error".to_string()
        } else {
            match &self {
                ApiError::MissingParameter(name) => format!("missing query parameter '{name}'"),
                ApiError::BadRequest(msg) => msg.clone(),
                ApiError::Commerce(err) => {
                    if status == StatusCode::SERVICE_UNAVAILABLE {
                        tracing::warn!(code, error = %err, "store timed out");
                    }
                    err.to_string()
                }
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<CommerceError> for ApiError {
    fn from(err: CommerceError) -> Self {
        ApiError::Commerce(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
