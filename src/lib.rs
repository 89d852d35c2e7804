//! Contact Gate
//!
//! This crate provides the admission-control and validation core for a
//! contact form endpoint:
//!
//! - Per-client fixed-window rate limiting (5 requests / 15 minutes default)
//! - Anti-forgery token issuance bound to a strict, HTTP-only cookie
//! - Field validation with full per-field error collection
//! - HTML-escaping sanitization before delivery
//! - Orchestrated hand-off to a pluggable message-delivery sink

pub mod config;
pub mod delivery;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod sanitize;
pub mod token;
pub mod validator;

pub use config::Config;
pub use delivery::{LogSink, MessageSink, SanitizedSubmission};
pub use error::SubmissionError;
pub use limiter::{AdmissionDecision, AdmissionStore, MemoryStore, RateLimiter};
pub use token::TokenIssuer;
pub use validator::{ContactSubmission, FieldError};
