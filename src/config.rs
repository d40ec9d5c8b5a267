//! Runtime configuration.
//!
//! Read from a TOML file (`--config`, or `article-topics/config.toml` under
//! the platform config dir when present). Every field has a default, so an
//! empty file and no file at all are both valid.

use crate::agent::LlmAgent;
use crate::backend::{gemini, Backend, GeminiBackend};
use crate::client::LlmConfig;
use crate::exec_ctx::{ExecCtx, DEFAULT_MODEL};
use crate::session::DEFAULT_DISPLAY_LIMIT;
use crate::types::TopicRange;
use crate::{error::Result, PipelineError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Which provider API the agents talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Gemini,
    /// Any OpenAI-compatible endpoint. Requires the `openai` feature.
    OpenAi,
}

impl Provider {
    pub fn default_model(self) -> &'static str {
        match self {
            Provider::Gemini => DEFAULT_MODEL,
            Provider::OpenAi => "gpt-4o-mini",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Provider::Gemini => gemini::DEFAULT_BASE_URL,
            Provider::OpenAi => "https://api.openai.com",
        }
    }

    pub fn default_api_key_env(self) -> &'static str {
        match self {
            Provider::Gemini => "GOOGLE_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub provider: Provider,
    /// Unset fields below fall back to the provider's defaults.
    pub model: Option<String>,
    pub base_url: Option<String>,
    /// Name of the environment variable holding the API key.
    pub api_key_env: Option<String>,
    /// Sent as `OpenAI-Organization` by the `openai` provider.
    pub organization: Option<String>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub cli_topic_range: TopicRange,
    pub web_topic_range: TopicRange,
    /// Where documents are saved. Defaults to `$HOME/Downloads`.
    pub output_dir: Option<PathBuf>,
    pub history_display_limit: usize,
    pub bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Provider::Gemini,
            model: None,
            base_url: None,
            api_key_env: None,
            organization: None,
            temperature: 0.8,
            max_tokens: 8192,
            timeout_secs: 120,
            cli_topic_range: TopicRange::CLI,
            web_topic_range: TopicRange::WEB,
            output_dir: None,
            history_display_limit: DEFAULT_DISPLAY_LIMIT,
            bind_addr: "127.0.0.1:8501".to_string(),
        }
    }
}

/// `article-topics/config.toml` under the platform config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("article-topics").join("config.toml"))
}

impl Config {
    /// Load from `path`, or from the default location if it exists, or fall
    /// back to defaults. An explicit path that does not exist is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path().filter(|p| p.is_file()) {
                Some(p) => p,
                None => {
                    tracing::debug!("no config file, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let text = std::fs::read_to_string(&path)?;
        let config = Self::from_toml(&text).map_err(|e| {
            PipelineError::InvalidConfig(format!("{}: {}", path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(text).map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
    }

    pub fn api_key_env(&self) -> &str {
        self.api_key_env
            .as_deref()
            .unwrap_or_else(|| self.provider.default_api_key_env())
    }

    pub fn validate(&self) -> Result<()> {
        self.cli_topic_range.validate()?;
        self.web_topic_range.validate()?;
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(PipelineError::InvalidConfig(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(PipelineError::InvalidConfig(
                "max_tokens must be positive".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(PipelineError::InvalidConfig(
                "timeout_secs must be positive".to_string(),
            ));
        }
        if self.model().trim().is_empty() {
            return Err(PipelineError::InvalidConfig(
                "model cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Read the API key from the environment variable named by
    /// `api_key_env`. Missing or empty is a [`PipelineError::Configuration`].
    pub fn api_key(&self) -> Result<String> {
        let var = self.api_key_env();
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(PipelineError::Configuration(format!(
                "{} is not set. Export your API key before running the pipeline.",
                var
            ))),
        }
    }

    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig::default()
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
    }

    fn build_backend(&self, api_key: String) -> Result<Arc<dyn Backend>> {
        match self.provider {
            Provider::Gemini => Ok(Arc::new(GeminiBackend::new(api_key))),
            #[cfg(feature = "openai")]
            Provider::OpenAi => {
                let backend = crate::backend::OpenAiBackend::new().with_api_key(api_key);
                Ok(Arc::new(match &self.organization {
                    Some(org) => backend.with_organization(org.clone()),
                    None => backend,
                }))
            }
            #[cfg(not(feature = "openai"))]
            Provider::OpenAi => Err(PipelineError::InvalidConfig(
                "provider \"openai\" requires the `openai` feature".to_string(),
            )),
        }
    }

    /// Build the execution context. The credential is checked first, so a
    /// missing key fails before any stage can run.
    pub fn build_exec_ctx(&self) -> Result<ExecCtx> {
        let api_key = self.api_key()?;
        ExecCtx::builder(self.base_url())
            .backend(self.build_backend(api_key)?)
            .model(self.model())
            .config(self.llm_config())
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
    }

    pub fn build_agent(&self) -> Result<LlmAgent> {
        Ok(LlmAgent::new(Arc::new(self.build_exec_ctx()?)))
    }
}
