//! The core [`GenerationService`] trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{GenerationRequest, GenerationResponse};

/// A service that can turn a prompt into generated text.
///
/// Implementations handle the protocol details for a specific endpoint
/// (authentication, request formatting, response parsing). The shipped
/// implementation is [`HttpGenerator`](crate::http::HttpGenerator), which
/// works with any OpenAI-compatible endpoint.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Returns the service name (e.g. "openai", "local").
    fn name(&self) -> &str;

    /// Execute a generation request and return the produced text.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError`](crate::error::GenerationError) if the
    /// request fails due to network issues, authentication problems, rate
    /// limiting, or an unusable response.
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse>;
}
