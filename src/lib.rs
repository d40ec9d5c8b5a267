//! # Article Topics
//!
//! Generate a Markdown list of article topics for a theme by driving five
//! cooperating LLM agents in sequence:
//!
//! ```text
//! plan ──► research ──► condense ──► collect-links ──► write
//! ```
//!
//! Each stage is an agent persona (role, goal, backstory) plus a task whose
//! prompt is rendered from the theme and a topic count drawn at the start
//! of the run. The final text is wrapped with a theme header and saved as a
//! `.md` file.
//!
//! ## Core Concepts
//!
//! - **[`Stage`]**: a fully rendered agent task, built by [`StageBuilder`].
//!   [`registry::article_stages`] returns the five article stages.
//! - **[`Pipeline`]**: runs stages strictly in order and reports progress to
//!   a [`ProgressObserver`]. The first failure aborts the run.
//! - **[`AgentExecutor`]**: turns a stage into text. [`LlmAgent`] calls an
//!   LLM through a [`Backend`](backend::Backend); [`FnAgent`] wraps a closure.
//! - **[`packager`]** and **[`archive`]**: writing, zipping and purging the
//!   generated files.
//! - **[`web`]**: a small axum API over an explicit [`SessionContext`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use article_topics::{pipeline, Config, RunInput, Theme, TracingObserver};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(None)?;
//!     let agent = config.build_agent()?; // fails fast without GOOGLE_API_KEY
//!
//!     let theme = Theme::new("Space Exploration")?;
//!     let count = config.cli_topic_range.sample()?;
//!     let result = pipeline::run_article(&agent, RunInput::new(theme, count), &TracingObserver).await?;
//!
//!     let dir = article_topics::packager::downloads_dir()?;
//!     let path = article_topics::packager::save_run(&result, &dir, &chrono::Local::now())?;
//!     println!("saved {}", path.display());
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod archive;
pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod exec_ctx;
pub mod packager;
pub mod parsing;
pub mod pipeline;
pub mod prompt;
pub mod registry;
pub mod session;
pub mod stage;
pub mod types;
pub mod web;

pub use agent::{AgentExecutor, FnAgent, LlmAgent, RunContext};
#[cfg(feature = "openai")]
pub use backend::OpenAiBackend;
pub use backend::{GeminiBackend, MockBackend};
pub use client::LlmConfig;
pub use config::{Config, Provider};
pub use error::{PipelineError, Result};
pub use events::{FnObserver, NoopObserver, ProgressObserver, TracingObserver};
pub use exec_ctx::{ExecCtx, ExecCtxBuilder};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use prompt::PromptTemplate;
pub use session::{HistoryEntry, SessionContext, SessionObserver};
pub use stage::{AgentProfile, Stage, StageBuilder};
pub use types::{
    PipelineContext, PipelineProgress, RunInput, RunResult, RunState, StageResult, Theme,
    TopicCount, TopicRange,
};
