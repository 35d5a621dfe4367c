use async_trait::async_trait;
use thiserror::Error;
use crate::models::AdvisoryRequest;

/// Errors that can occur when calling the advisory service
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("Missing OPENAI_API_KEY")]
    MissingCredential,

    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// Non-success status; `body` is the advisor's own error text
    #[error("{body}")]
    ApiError { status: u16, body: String },

    #[error("Failed to encode advisory payload: {0}")]
    PayloadError(#[from] serde_json::Error),
}

/// The external, non-deterministic refinement step
///
/// Implementations return the advisor's raw message content. Whatever comes
/// back is repaired by [`crate::core::Sanitizer`], so an implementation only
/// reports transport and configuration failures.
#[async_trait]
pub trait AdvisoryService: Send + Sync {
    /// Fail fast before any work is done for a request
    fn ensure_configured(&self) -> Result<(), AdvisorError> {
        Ok(())
    }

    async fn advise(&self, request: &AdvisoryRequest) -> Result<String, AdvisorError>;
}
