//! Execution context shared across agent invocations.
//!
//! [`ExecCtx`] carries the HTTP client, LLM backend, endpoint, default model
//! and sampling configuration. It is built once per run (or once per server)
//! and shared by every stage.

use crate::backend::{Backend, GeminiBackend};
use crate::client::LlmConfig;
use crate::{error::Result, PipelineError};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Default model used when neither the stage nor the config names one.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Shared execution context for agent invocations.
///
/// # Example
///
/// ```
/// use article_topics::{ExecCtx, MockBackend};
/// use std::sync::Arc;
///
/// let ctx = ExecCtx::builder("http://unused")
///     .backend(Arc::new(MockBackend::fixed("ok")))
///     .model("test-model")
///     .build()
///     .unwrap();
/// assert_eq!(ctx.model, "test-model");
/// ```
pub struct ExecCtx {
    /// HTTP client (cheap to clone -- uses `Arc` internally).
    pub client: Client,
    /// Base URL for the LLM provider.
    pub base_url: String,
    pub backend: Arc<dyn Backend>,
    /// Default model for stages without an override.
    pub model: String,
    pub config: LlmConfig,
}

impl ExecCtx {
    /// Create a new builder.
    pub fn builder(base_url: impl Into<String>) -> ExecCtxBuilder {
        ExecCtxBuilder {
            client: None,
            base_url: base_url.into(),
            backend: None,
            model: None,
            config: None,
            timeout: None,
        }
    }
}

impl std::fmt::Debug for ExecCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecCtx")
            .field("base_url", &self.base_url)
            .field("backend", &self.backend.name())
            .field("model", &self.model)
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for [`ExecCtx`].
pub struct ExecCtxBuilder {
    client: Option<Client>,
    base_url: String,
    backend: Option<Arc<dyn Backend>>,
    model: Option<String>,
    config: Option<LlmConfig>,
    timeout: Option<Duration>,
}

impl ExecCtxBuilder {
    /// Set the HTTP client. If not set, a default client is created.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the LLM backend. Required.
    pub fn backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Shorthand for a [`GeminiBackend`] authenticated with `api_key`.
    pub fn gemini(mut self, api_key: impl Into<String>) -> Self {
        self.backend = Some(Arc::new(GeminiBackend::new(api_key)));
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn config(mut self, config: LlmConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the request timeout. Default: 120 seconds.
    ///
    /// Ignored when a custom `Client` is supplied via `.client()`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the execution context.
    pub fn build(self) -> Result<ExecCtx> {
        let backend = self.backend.ok_or_else(|| {
            PipelineError::InvalidConfig("ExecCtx requires a backend".to_string())
        })?;
        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .timeout(self.timeout.unwrap_or(Duration::from_secs(120)))
                .build()?,
        };
        Ok(ExecCtx {
            client,
            base_url: normalize_base_url(&self.base_url),
            backend,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            config: self.config.unwrap_or_default(),
        })
    }
}

/// Strip known provider path suffixes from a base URL.
/// This prevents double-pathing when backends append their own paths.
fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    // longest first
    for suffix in &["/v1/chat/completions", "/v1beta/models", "/v1beta", "/v1/chat", "/v1"] {
        if let Some(stripped) = trimmed.strip_suffix(suffix) {
            return stripped.to_string();
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;

    #[test]
    fn test_normalize_base_url_strips_v1() {
        assert_eq!(normalize_base_url("https://api.openai.com/v1"), "https://api.openai.com");
        assert_eq!(normalize_base_url("https://api.openai.com/v1/"), "https://api.openai.com");
    }

    #[test]
    fn test_normalize_base_url_strips_v1beta() {
        assert_eq!(
            normalize_base_url("https://generativelanguage.googleapis.com/v1beta/models/"),
            "https://generativelanguage.googleapis.com"
        );
        assert_eq!(
            normalize_base_url("https://generativelanguage.googleapis.com/v1beta"),
            "https://generativelanguage.googleapis.com"
        );
    }

    #[test]
    fn test_normalize_base_url_preserves_clean() {
        assert_eq!(normalize_base_url("http://localhost:8080"), "http://localhost:8080");
    }

    #[test]
    fn test_build_requires_backend() {
        let result = ExecCtx::builder("http://test").build();
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn test_defaults() {
        let ctx = ExecCtx::builder("http://test/")
            .backend(Arc::new(MockBackend::fixed("x")))
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        assert_eq!(ctx.base_url, "http://test");
        assert_eq!(ctx.model, DEFAULT_MODEL);
        assert_eq!(ctx.config, LlmConfig::default());
        assert_eq!(ctx.backend.name(), "mock");
    }
}
