//! Port for the external AI completion provider.
//!
//! Providers are unreliable by nature. Every error here is recoverable: the
//! domain substitutes a deterministic local result instead of failing the
//! request.

use async_trait::async_trait;

use super::define_port_error;

/// Text prompt with an optional image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub image_url: Option<String>,
}

define_port_error! {
    /// Errors raised by AI completion adapters.
    pub enum AiCompletionError {
        /// No provider credentials are configured.
        Unconfigured => "AI provider is not configured",
        /// The request exceeded the configured timeout.
        Timeout { message: String } => "AI provider request timed out: {message}",
        /// The provider throttled the request.
        RateLimited { message: String } => "AI provider rate limited the request: {message}",
        /// The provider rejected the request as invalid.
        InvalidRequest { message: String } => "AI provider rejected the request: {message}",
        /// Network or server failure.
        Transport { message: String } => "AI provider transport failed: {message}",
        /// The provider answered with an unexpected envelope.
        InvalidResponse { message: String } => "AI provider response was malformed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AiCompletionSource: Send + Sync {
    /// Return the provider's raw text answer.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AiCompletionError>;
}

/// Source used when no provider key is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredAiSource;

#[async_trait]
impl AiCompletionSource for UnconfiguredAiSource {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, AiCompletionError> {
        Err(AiCompletionError::unconfigured())
    }
}
