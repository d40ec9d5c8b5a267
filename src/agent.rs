//! Agent execution: turning a built [`Stage`] into text.
//!
//! The runner only knows the [`AgentExecutor`] trait. [`LlmAgent`] is the
//! production implementation backed by an [`ExecCtx`]; [`FnAgent`] wraps a
//! closure so tests and demos can run the whole pipeline offline.

use crate::backend::LlmRequest;
use crate::exec_ctx::ExecCtx;
use crate::prompt::section;
use crate::stage::Stage;
use crate::types::{StageResult, Theme, TopicCount};
use crate::{error::Result, parsing, PipelineError};
use async_trait::async_trait;
use std::sync::Arc;

/// Everything an agent may read while executing one stage.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub theme: Theme,
    pub topic_count: TopicCount,
    /// Results of the stages completed so far, in execution order.
    pub results: Vec<StageResult>,
}

impl RunContext {
    pub fn new(theme: Theme, topic_count: TopicCount) -> Self {
        Self {
            theme,
            topic_count,
            results: Vec::new(),
        }
    }

    /// Outputs of the stages `stage` depends on, in declaration order.
    ///
    /// Results from stages that are not dependencies are not visible.
    pub fn upstream_for(&self, stage: &Stage) -> Vec<&StageResult> {
        stage
            .depends_on
            .iter()
            .filter_map(|dep| self.results.iter().find(|r| &r.stage == dep))
            .collect()
    }

    /// Result of the stage with the given name, if it has run.
    pub fn result(&self, stage: &str) -> Option<&StageResult> {
        self.results.iter().find(|r| r.stage == stage)
    }
}

/// Executes one stage and returns its text.
///
/// This trait is object-safe and designed to be used as
/// `&dyn AgentExecutor` or `Arc<dyn AgentExecutor>`.
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    async fn execute(&self, stage: &Stage, context: &RunContext) -> Result<String>;
}

/// [`AgentExecutor`] that prompts an LLM through the configured backend.
///
/// # Example
///
/// ```
/// use article_topics::{ExecCtx, LlmAgent, MockBackend};
/// use std::sync::Arc;
///
/// let ctx = ExecCtx::builder("http://unused")
///     .backend(Arc::new(MockBackend::fixed("1. Topic")))
///     .build()
///     .unwrap();
/// let agent = LlmAgent::new(Arc::new(ctx));
/// ```
#[derive(Debug, Clone)]
pub struct LlmAgent {
    ctx: Arc<ExecCtx>,
}

impl LlmAgent {
    pub fn new(ctx: Arc<ExecCtx>) -> Self {
        Self { ctx }
    }

    pub fn ctx(&self) -> &ExecCtx {
        &self.ctx
    }

    /// Persona instructions sent as the system prompt.
    fn system_prompt(stage: &Stage) -> String {
        format!(
            "You are the {}. {}\nYour personal goal is: {}",
            stage.agent.role, stage.agent.backstory, stage.agent.goal
        )
    }

    /// Task prompt: description, expected output, then upstream outputs.
    fn user_prompt(stage: &Stage, context: &RunContext) -> String {
        let mut prompt = format!(
            "{}\n\nThis is the expected criteria for your final answer: {}\n\
             You MUST return the actual complete content as the final answer, not a summary.",
            stage.description, stage.expected_output
        );
        let upstream = context.upstream_for(stage);
        if !upstream.is_empty() {
            prompt.push_str("\n\nThis is the context you're working with:");
            for result in upstream {
                prompt.push_str("\n\n");
                prompt.push_str(&section(&format!("Output of {}", result.stage), &result.text));
            }
        }
        prompt
    }

    fn build_request(&self, stage: &Stage, context: &RunContext) -> LlmRequest {
        let mut config = self.ctx.config.clone();
        if let Some(temp) = stage.temperature {
            config = config.with_temperature(temp);
        }
        LlmRequest {
            model: stage.model.clone().unwrap_or_else(|| self.ctx.model.clone()),
            system_prompt: Some(Self::system_prompt(stage)),
            prompt: Self::user_prompt(stage, context),
            config,
        }
    }
}

#[async_trait]
impl AgentExecutor for LlmAgent {
    async fn execute(&self, stage: &Stage, context: &RunContext) -> Result<String> {
        let request = self.build_request(stage, context);
        tracing::debug!(
            stage = %stage.name,
            backend = self.ctx.backend.name(),
            model = %request.model,
            prompt_chars = request.prompt.len(),
            "sending stage prompt"
        );

        let response = self
            .ctx
            .backend
            .complete(&self.ctx.client, &self.ctx.base_url, &request)
            .await?;

        if let Some(ref meta) = response.metadata {
            tracing::debug!(stage = %stage.name, metadata = %meta, "backend metadata");
        }

        let text = parsing::clean_response(&response.text);
        if text.is_empty() {
            return Err(PipelineError::Other(format!(
                "{} returned an empty reply",
                self.ctx.backend.name()
            )));
        }
        Ok(text)
    }
}

/// An [`AgentExecutor`] backed by a closure.
///
/// # Example
///
/// ```
/// use article_topics::agent::FnAgent;
///
/// let agent = FnAgent(|stage: &article_topics::Stage, _ctx: &article_topics::RunContext| {
///     Ok(format!("output of {}", stage.name))
/// });
/// ```
pub struct FnAgent<F>(pub F)
where
    F: Fn(&Stage, &RunContext) -> Result<String> + Send + Sync;

#[async_trait]
impl<F> AgentExecutor for FnAgent<F>
where
    F: Fn(&Stage, &RunContext) -> Result<String> + Send + Sync,
{
    async fn execute(&self, stage: &Stage, context: &RunContext) -> Result<String> {
        (self.0)(stage, context)
    }
}
