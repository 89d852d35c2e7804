//! Full-router tests exercising the HTTP surface end to end.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use async_trait::async_trait;
use contact_gate::{
    config::{Config, RateLimitConfig},
    delivery::{DeliveryError, LogSink, MessageSink, SanitizedSubmission},
    handlers::{router, AppState},
    limiter::RateLimiter,
    token::TokenIssuer,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

fn app_with(config: Config, sink: Arc<dyn MessageSink>) -> Router {
    let state = Arc::new(AppState {
        limiter: RateLimiter::new(config.rate_limit.clone()),
        issuer: TokenIssuer::new(config.token.clone()),
        sink,
        config,
    });
    router(state)
}

fn app() -> Router {
    app_with(Config::default(), Arc::new(LogSink))
}

/// Sink that captures the last delivered submission.
#[derive(Default)]
struct CaptureSink {
    last: Mutex<Option<SanitizedSubmission>>,
}

#[async_trait]
impl MessageSink for CaptureSink {
    async fn deliver(&self, submission: &SanitizedSubmission) -> Result<(), DeliveryError> {
        *self.last.lock().unwrap() = Some(submission.clone());
        Ok(())
    }
}

/// Sink that always fails.
struct FailingSink;

#[async_trait]
impl MessageSink for FailingSink {
    async fn deliver(&self, _submission: &SanitizedSubmission) -> Result<(), DeliveryError> {
        Err(DeliveryError("smtp relay unreachable".to_string()))
    }
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// GET a token; returns (cookie pair for the Cookie header, token value).
async fn fetch_token(app: &Router) -> (String, String) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/contact")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .to_string();
    let cookie_pair = set_cookie.split(';').next().unwrap().to_string();

    let body = response_json(response).await;
    let token = body["csrfToken"].as_str().unwrap().to_string();
    (cookie_pair, token)
}

fn submit_request(cookie: Option<&str>, payload: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/contact")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(payload.to_string())).unwrap()
}

fn valid_payload(token: &str) -> Value {
    json!({
        "name": "Jon Doe",
        "email": "jon@x.com",
        "subject": "Hi there",
        "message": "Hello, checking in.",
        "csrfToken": token,
    })
}

#[tokio::test]
async fn test_token_endpoint_sets_session_cookie() {
    let app = app();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/contact")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.starts_with("csrf-token="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Strict"));
    assert!(set_cookie.contains("Max-Age=3600"));

    let cookie_value = set_cookie
        .split(';')
        .next()
        .unwrap()
        .trim_start_matches("csrf-token=")
        .to_string();
    let body = response_json(response).await;
    assert_eq!(body["csrfToken"], cookie_value.as_str());
}

#[tokio::test]
async fn test_valid_submission_succeeds() {
    let app = app();
    let (cookie, token) = fetch_token(&app).await;

    let response = app
        .oneshot(submit_request(Some(&cookie), &valid_payload(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Message sent successfully!");
}

#[tokio::test]
async fn test_wrong_token_returns_403_despite_valid_fields() {
    let app = app();
    let (cookie, _token) = fetch_token(&app).await;

    let response = app
        .oneshot(submit_request(Some(&cookie), &valid_payload("wrong")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Invalid CSRF token");
}

#[tokio::test]
async fn test_missing_cookie_returns_403() {
    let app = app();
    let (_cookie, token) = fetch_token(&app).await;

    let response = app
        .oneshot(submit_request(None, &valid_payload(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_invalid_fields_return_400_with_all_details() {
    let app = app();
    let (cookie, token) = fetch_token(&app).await;

    let payload = json!({
        "name": "A",
        "email": "not-an-email",
        "subject": "Hi there",
        "message": "Hello, checking in.",
        "csrfToken": token,
    });
    let response = app
        .oneshot(submit_request(Some(&cookie), &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Validation failed");

    let details = body["details"].as_array().unwrap();
    assert_eq!(details.len(), 2);
    assert!(details.iter().any(|d| d["field"] == "name"));
    assert!(details.iter().any(|d| d["field"] == "email"));
}

#[tokio::test]
async fn test_malformed_body_returns_400() {
    let app = app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/contact")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("this is not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Malformed request body");
}

#[tokio::test]
async fn test_quota_exhaustion_returns_429_with_headers() {
    let config = Config {
        rate_limit: RateLimitConfig {
            max_requests: 2,
            window_secs: 900,
            sweep_probability: 0.0,
        },
        ..Default::default()
    };
    let app = app_with(config, Arc::new(LogSink));
    let (cookie, token) = fetch_token(&app).await;

    // The token GET is not rate limited; both POST slots get used up
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(submit_request(Some(&cookie), &valid_payload(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(submit_request(Some(&cookie), &valid_payload(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["x-ratelimit-limit"], "2");
    assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
    let reset: i64 = response.headers()["x-ratelimit-reset"]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(reset > chrono::Utc::now().timestamp_millis());

    let body = response_json(response).await;
    assert_eq!(body["error"], "Too many requests. Please try again later.");
    assert_eq!(body["resetTime"], reset);
}

#[tokio::test]
async fn test_rate_limit_applies_before_parsing() {
    let config = Config {
        rate_limit: RateLimitConfig {
            max_requests: 1,
            window_secs: 900,
            sweep_probability: 0.0,
        },
        ..Default::default()
    };
    let app = app_with(config, Arc::new(LogSink));

    // First garbage request consumes the only slot as a 400
    let first = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/contact")
                .body(Body::from("garbage"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::BAD_REQUEST);

    // Second garbage request is refused by the gate, not the parser
    let second = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/contact")
                .body(Body::from("garbage"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_clients_have_independent_quotas() {
    let config = Config {
        rate_limit: RateLimitConfig {
            max_requests: 1,
            window_secs: 900,
            sweep_probability: 0.0,
        },
        ..Default::default()
    };
    let app = app_with(config, Arc::new(LogSink));
    let (cookie, token) = fetch_token(&app).await;

    let with_ip = |ip: &str| {
        Request::builder()
            .method("POST")
            .uri("/api/contact")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::COOKIE, cookie.clone())
            .header("x-forwarded-for", ip.to_string())
            .body(Body::from(valid_payload(&token).to_string()))
            .unwrap()
    };

    assert_eq!(
        app.clone().oneshot(with_ip("203.0.113.7")).await.unwrap().status(),
        StatusCode::OK
    );
    assert_eq!(
        app.clone().oneshot(with_ip("203.0.113.7")).await.unwrap().status(),
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(
        app.oneshot(with_ip("203.0.113.8")).await.unwrap().status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_sink_receives_sanitized_fields() {
    let sink = Arc::new(CaptureSink::default());
    let app = app_with(Config::default(), sink.clone());
    let (cookie, token) = fetch_token(&app).await;

    let payload = json!({
        "name": "Jon Doe",
        "email": "jon@x.com",
        "subject": "A <b>bold</b> one",
        "message": "<script>alert('x')</script> plus padding",
        "csrfToken": token,
    });
    let response = app
        .oneshot(submit_request(Some(&cookie), &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let delivered = sink.last.lock().unwrap().clone().unwrap();
    assert!(!delivered.message.contains('<'));
    assert!(delivered.message.starts_with("&lt;script&gt;"));
    assert_eq!(delivered.subject, "A &lt;b&gt;bold&lt;&#x2F;b&gt; one");
    assert_eq!(delivered.name, "Jon Doe");
}

#[tokio::test]
async fn test_delivery_failure_is_an_opaque_500() {
    let app = app_with(Config::default(), Arc::new(FailingSink));
    let (cookie, token) = fetch_token(&app).await;

    let response = app
        .oneshot(submit_request(Some(&cookie), &valid_payload(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Internal server error. Please try again later.");
    assert!(!body.to_string().contains("smtp"));
}

#[tokio::test]
async fn test_health_endpoint() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "contact-gate");
}
