//! Anti-forgery token issuance and verification.
//!
//! Tokens are opaque random strings handed out twice: once in the response
//! body and once in a strict, HTTP-only cookie. A submission is accepted
//! only when the echoed token matches the cookie value. Tokens stay valid
//! until the cookie expires; they are not invalidated after use.

use crate::config::TokenConfig;
use axum_extra::extract::cookie::{Cookie, SameSite};
use rand::{distributions::Alphanumeric, Rng};

/// Issues anti-forgery tokens and builds their session cookies.
pub struct TokenIssuer {
    config: TokenConfig,
}

impl TokenIssuer {
    pub fn new(config: TokenConfig) -> Self {
        Self { config }
    }

    /// Generate a fresh token from the thread-local CSPRNG.
    pub fn issue(&self) -> String {
        rand::thread_rng()
            .sample_iter(Alphanumeric)
            .map(char::from)
            .take(self.config.token_length)
            .collect()
    }

    /// Build the session cookie carrying `token`.
    pub fn cookie(&self, token: &str) -> Cookie<'static> {
        Cookie::build((self.config.cookie_name.clone(), token.to_string()))
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(self.config.secure_cookies)
            .max_age(time::Duration::seconds(
                self.config.cookie_max_age_secs as i64,
            ))
            .path("/")
            .build()
    }

    /// Name of the session cookie.
    pub fn cookie_name(&self) -> &str {
        &self.config.cookie_name
    }

    /// Compare a submitted token against the session cookie value.
    /// A missing cookie never matches.
    pub fn verify(&self, submitted: &str, session: Option<&str>) -> bool {
        match session {
            Some(session) => !session.is_empty() && submitted == session,
            None => false,
        }
    }
}
