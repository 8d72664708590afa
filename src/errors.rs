//! Pipeline error types.
//!
//! Responders turn errors into a [`ResponseEnvelope`] through
//! [`PipelineError::into_envelope`]; the fan-out records the per-item
//! variants (`MalformedEntry`, `Fetch`, `Decode`, `Store`) in its report.

use axum::http::StatusCode;
use thiserror::Error;

use crate::envelope::ResponseEnvelope;

/// Errors raised while handling a pipeline event or request.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required request path parameter is absent.
    #[error("Missing path parameter: {name}")]
    MissingParameter { name: String },

    /// A notification entry is missing its bucket or key.
    #[error("Malformed notification entry: {reason}")]
    MalformedEntry { reason: String },

    /// Reading the object from storage failed.
    #[error("Unable to fetch {key}: {source}")]
    Fetch {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// The object is not a decodable image.
    #[error("Unable to decode image {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: image::ImageError,
    },

    /// Writing the metadata record failed.
    #[error("Unable to store metadata for {key}: {source}")]
    Store {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Catch-all for store and runtime failures.
    #[error("We encountered an internal error, please try again.")]
    Internal(#[from] anyhow::Error),
}

impl PipelineError {
    /// Short stage label used in logs and metrics.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::MissingParameter { .. } => "missing_parameter",
            PipelineError::MalformedEntry { .. } => "malformed",
            PipelineError::Fetch { .. } => "fetch",
            PipelineError::Decode { .. } => "decode",
            PipelineError::Store { .. } => "store",
            PipelineError::Internal(_) => "internal",
        }
    }

    /// HTTP status for a responder error. Per-item fan-out errors never
    /// reach a response and fall under 500.
    pub fn status_code(&self) -> StatusCode {
        match self {
            PipelineError::MissingParameter { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render as a JSON `{"success": false, "message": ...}` envelope.
    pub fn into_envelope(self) -> ResponseEnvelope {
        let message = self.to_string();
        ResponseEnvelope::json(
            self.status_code(),
            &serde_json::json!({ "success": false, "message": message }),
        )
    }
}
