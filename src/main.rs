//! Contact Gate Service
//!
//! Admission control and validation for a contact form endpoint:
//!
//! - 5 submissions per 15 minutes per client (default)
//! - Anti-forgery token issuance bound to a strict, HTTP-only cookie
//! - Field validation and HTML-escaping sanitization
//! - Pluggable message delivery (log sink by default)
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `MAX_REQUESTS`: Max submissions per window per client (default: 5)
//! - `WINDOW_SECS`: Window length in seconds (default: 900)
//! - `SECURE_COOKIES`: Set the Secure cookie attribute (default: false)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use contact_gate::{
    config::{Config, RateLimitConfig, TokenConfig},
    delivery::LogSink,
    handlers::{router, AppState},
    limiter::RateLimiter,
    token::TokenIssuer,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let config = load_config();
    info!(
        bind_addr = %config.bind_addr,
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        secure_cookies = config.token.secure_cookies,
        "Starting contact gate"
    );

    // Create application state
    let limiter = RateLimiter::new(config.rate_limit.clone());
    let issuer = TokenIssuer::new(config.token.clone());

    let state = Arc::new(AppState {
        limiter,
        issuer,
        sink: Arc::new(LogSink),
        config: config.clone(),
    });

    // Build router
    let app = router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Load configuration from environment variables.
fn load_config() -> Config {
    Config {
        bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
        rate_limit: RateLimitConfig {
            max_requests: std::env::var("MAX_REQUESTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            window_secs: std::env::var("WINDOW_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(900),
            ..Default::default()
        },
        token: TokenConfig {
            secure_cookies: std::env::var("SECURE_COOKIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            ..Default::default()
        },
    }
}
