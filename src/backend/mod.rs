//! Backend trait and normalized request/response types.
//!
//! The [`Backend`] trait abstracts over LLM providers, translating between
//! normalized [`LlmRequest`]/[`LlmResponse`] types and provider-specific
//! HTTP APIs.
//!
//! ```text
//! LlmAgent ──► LlmRequest ──► Backend::complete() ──► LlmResponse
//!                                    │
//!                         ┌──────────┴──────────┐
//!                    GeminiBackend         OpenAiBackend
//!              :generateContent        /v1/chat/completions
//! ```
//!
//! Backends do not retry. A failed call surfaces immediately and aborts
//! the stage that issued it.

pub mod gemini;
pub mod mock;
#[cfg(feature = "openai")]
pub mod openai;

pub use gemini::GeminiBackend;
pub use mock::MockBackend;
#[cfg(feature = "openai")]
pub use openai::OpenAiBackend;

use crate::client::LlmConfig;
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;

/// A normalized LLM request — provider-agnostic.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// Model identifier (e.g. `"gemini-2.0-flash"`, `"gpt-4o"`).
    pub model: String,

    /// System instructions (the agent persona), if any.
    pub system_prompt: Option<String>,

    /// The user prompt text.
    pub prompt: String,

    /// Sampling configuration.
    pub config: LlmConfig,
}

/// A normalized LLM response.
#[derive(Debug)]
pub struct LlmResponse {
    /// The generated text content.
    pub text: String,

    /// HTTP status code (for diagnostics/logging).
    pub status: u16,

    /// Provider-specific metadata (token counts, model info).
    pub metadata: Option<serde_json::Value>,
}

/// Abstraction over LLM providers.
///
/// This trait is object-safe and designed to be used as `Arc<dyn Backend>`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Execute a non-streaming LLM call.
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse>;

    /// Human-readable name for logging and diagnostics.
    fn name(&self) -> &'static str;
}
