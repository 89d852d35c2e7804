//! Submission error taxonomy and its HTTP mapping.
//!
//! Every variant except `Internal` is an expected, user-facing condition.
//! Internal and delivery failures are logged with full detail server-side
//! and reported to the caller as an opaque 500.

use crate::delivery::DeliveryError;
use crate::validator::FieldError;
use axum::{
    http::{header::HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Terminal failure states of the submission pipeline.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("rate limited until {reset_at}")]
    RateLimited { limit: u32, reset_at: i64 },

    #[error("malformed request body")]
    MalformedRequest,

    #[error("validation failed ({} violations)", .0.len())]
    InvalidInput(Vec<FieldError>),

    #[error("anti-forgery token mismatch")]
    ForbiddenToken,

    #[error("delivery failed")]
    DeliveryFailed(#[source] DeliveryError),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for SubmissionError {
    fn into_response(self) -> Response {
        match self {
            Self::RateLimited { limit, reset_at } => {
                let body = Json(json!({
                    "error": "Too many requests. Please try again later.",
                    "resetTime": reset_at,
                }));
                let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
                let headers = response.headers_mut();
                headers.insert(
                    HeaderName::from_static("x-ratelimit-limit"),
                    header_value(limit.to_string()),
                );
                headers.insert(
                    HeaderName::from_static("x-ratelimit-remaining"),
                    HeaderValue::from_static("0"),
                );
                headers.insert(
                    HeaderName::from_static("x-ratelimit-reset"),
                    header_value(reset_at.to_string()),
                );
                response
            }
            Self::MalformedRequest => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Malformed request body" })),
            )
                .into_response(),
            Self::InvalidInput(details) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Validation failed",
                    "details": details,
                })),
            )
                .into_response(),
            Self::ForbiddenToken => (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "Invalid CSRF token" })),
            )
                .into_response(),
            Self::DeliveryFailed(err) => {
                error!(error = %err, "Message delivery failed");
                internal_response()
            }
            Self::Internal(err) => {
                error!(error = %err, "Unexpected submission failure");
                internal_response()
            }
        }
    }
}

fn internal_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error. Please try again later." })),
    )
        .into_response()
}

fn header_value(value: String) -> HeaderValue {
    // Decimal renderings of u32/i64 are always valid header bytes
    HeaderValue::from_str(&value).unwrap_or(HeaderValue::from_static("0"))
}
