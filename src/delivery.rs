//! Message delivery seam.
//!
//! The gate hands sanitized submissions to a [`MessageSink`]; the actual
//! transport (mail relay, queue, storage) lives behind this trait and is
//! not implemented here. [`LogSink`] is the default sink, writing the
//! submission to the structured log.

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tracing::info;

/// A submission with all free-text fields already HTML-escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedSubmission {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// Delivery failure, surfaced to the caller without internal detail.
#[derive(Debug, Error)]
#[error("delivery failed: {0}")]
pub struct DeliveryError(pub String);

/// Destination for accepted contact submissions.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn deliver(&self, submission: &SanitizedSubmission) -> Result<(), DeliveryError>;
}

/// Sink that records submissions in the application log.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl MessageSink for LogSink {
    async fn deliver(&self, submission: &SanitizedSubmission) -> Result<(), DeliveryError> {
        info!(
            name = %submission.name,
            email = %submission.email,
            subject = %submission.subject,
            message = %submission.message,
            timestamp = %Utc::now().to_rfc3339(),
            "Contact form submission"
        );
        Ok(())
    }
}
