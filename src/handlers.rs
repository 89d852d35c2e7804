//! HTTP handlers for the contact gate.
//!
//! The submission handler runs a strict pipeline: admission check first
//! (cheapest, most attacker-facing), then body parse, field validation,
//! anti-forgery token check, sanitization, and finally delivery. Any stage
//! can terminate the request; nothing is retried server-side, and consumed
//! quota is never refunded.

use crate::config::Config;
use crate::delivery::{DeliveryError, MessageSink, SanitizedSubmission};
use crate::error::SubmissionError;
use crate::limiter::RateLimiter;
use crate::sanitize::sanitize;
use crate::token::TokenIssuer;
use crate::validator::ContactSubmission;
use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::CookieJar;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// The delivery collaborator gets this long before the attempt is abandoned.
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared application state.
pub struct AppState {
    pub limiter: RateLimiter,
    pub issuer: TokenIssuer,
    pub sink: Arc<dyn MessageSink>,
    pub config: Config,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/contact", get(issue_token).post(submit))
        .with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "contact-gate",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Issue an anti-forgery token.
///
/// The token is set as a strict, HTTP-only session cookie and echoed in the
/// body so the client can send it back with the submission.
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> impl IntoResponse {
    let token = state.issuer.issue();
    let jar = jar.add(state.issuer.cookie(&token));
    debug!("Issued anti-forgery token");

    (jar, Json(json!({ "csrfToken": token })))
}

/// Handle a contact form submission.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, SubmissionError> {
    // Admission check runs before the body is even parsed
    let client_id = resolve_client_id(&headers);
    let decision = state.limiter.check(&client_id).await;
    if !decision.accepted {
        warn!(
            client = %client_id,
            reset_at = decision.reset_at,
            "Submission rate limited"
        );
        return Err(SubmissionError::RateLimited {
            limit: state.config.rate_limit.max_requests,
            reset_at: decision.reset_at,
        });
    }

    let submission: ContactSubmission = serde_json::from_slice(&body).map_err(|err| {
        debug!(client = %client_id, error = %err, "Unparseable submission body");
        SubmissionError::MalformedRequest
    })?;

    if let Err(violations) = submission.validate() {
        info!(
            client = %client_id,
            violations = violations.len(),
            "Submission failed validation"
        );
        return Err(SubmissionError::InvalidInput(violations));
    }

    let session_token = jar
        .get(state.issuer.cookie_name())
        .map(|cookie| cookie.value().to_string());
    if !state
        .issuer
        .verify(&submission.csrf_token, session_token.as_deref())
    {
        info!(client = %client_id, "Anti-forgery token mismatch");
        return Err(SubmissionError::ForbiddenToken);
    }

    // Escaping happens after validation so the checks above saw raw input
    let sanitized = SanitizedSubmission {
        name: sanitize(&submission.name),
        email: sanitize(&submission.email),
        subject: sanitize(&submission.subject),
        message: sanitize(&submission.message),
    };

    match tokio::time::timeout(DELIVERY_TIMEOUT, state.sink.deliver(&sanitized)).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => return Err(SubmissionError::DeliveryFailed(err)),
        Err(_) => {
            return Err(SubmissionError::DeliveryFailed(DeliveryError(
                "delivery timed out".to_string(),
            )))
        }
    }

    info!(
        client = %client_id,
        remaining = decision.remaining,
        "Contact submission accepted"
    );
    Ok(Json(json!({
        "success": true,
        "message": "Message sent successfully!",
    })))
}

/// Resolve the client identifier from proxy headers.
///
/// First non-empty entry of `x-forwarded-for`, then `x-real-ip`, then the
/// literal `"unknown"`.
fn resolve_client_id(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|value| value.to_str().ok())
        })
        .unwrap_or("unknown")
        .to_string()
}
