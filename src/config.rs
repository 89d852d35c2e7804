//! Configuration for the contact gate service.
//!
//! Defaults match the upstream contact endpoint policy: 5 submissions per
//! 15-minute window per client, 1-hour anti-forgery cookies.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the contact gate service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Anti-forgery token configuration
    #[serde(default)]
    pub token: TokenConfig,
}

/// Fixed-window rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests per window per client (default: 5)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds (default: 900)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Fraction of admission checks that trigger an expired-entry sweep
    /// (default: 0.01)
    #[serde(default = "default_sweep_probability")]
    pub sweep_probability: f64,
}

/// Anti-forgery token configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Cookie name carrying the session-bound token (default: csrf-token)
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Token length in characters (default: 32)
    #[serde(default = "default_token_length")]
    pub token_length: usize,

    /// Cookie lifetime in seconds (default: 3600)
    #[serde(default = "default_cookie_max_age_secs")]
    pub cookie_max_age_secs: u64,

    /// Set the Secure attribute on the cookie (default: false; enable behind TLS)
    #[serde(default)]
    pub secure_cookies: bool,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_requests() -> u32 {
    5
}

fn default_window_secs() -> u64 {
    900 // 15 minutes
}

fn default_sweep_probability() -> f64 {
    0.01
}

fn default_cookie_name() -> String {
    "csrf-token".to_string()
}

fn default_token_length() -> usize {
    32
}

fn default_cookie_max_age_secs() -> u64 {
    3600
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            rate_limit: RateLimitConfig::default(),
            token: TokenConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            sweep_probability: default_sweep_probability(),
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            token_length: default_token_length(),
            cookie_max_age_secs: default_cookie_max_age_secs(),
            secure_cookies: false,
        }
    }
}

impl RateLimitConfig {
    /// Get the window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl TokenConfig {
    /// Get the cookie lifetime
    pub fn cookie_max_age(&self) -> Duration {
        Duration::from_secs(self.cookie_max_age_secs)
    }
}
