//! Language-model completion provider.
//!
//! The outline pipeline talks to a model through [`CompletionProvider`], a
//! single-operation seam: send a system instruction and a user instruction,
//! get raw response text back. [`OpenAiProvider`] implements it against any
//! OpenAI-compatible `chat/completions` endpoint.
//!
//! Failures are reported as [`SlidesmithError::Provider`], except account-level
//! exhaustion (HTTP 429 or an `insufficient_quota` error body), which is the
//! distinguished [`SlidesmithError::QuotaExceeded`].

mod openai;

use async_trait::async_trait;
use slidesmith_shared::Result;

pub use openai::OpenAiProvider;

#[cfg(doc)]
use slidesmith_shared::SlidesmithError;

/// A single completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Provider model identifier.
    pub model: String,
    /// System instruction.
    pub system: String,
    /// User instruction.
    pub user: String,
    /// Sampling temperature.
    pub temperature: f32,
}

/// A language-model completion provider.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Run one completion and return the model's raw text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}
