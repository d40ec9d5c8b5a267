use crate::{error::Result, PipelineError};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Free-text theme supplied by the caller. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Theme(String);

impl Theme {
    /// Trim and validate a theme. Fails on empty or whitespace-only input.
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "Theme cannot be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Theme {
    type Error = PipelineError;

    fn try_from(value: String) -> Result<Self> {
        Theme::new(value)
    }
}

impl From<Theme> for String {
    fn from(theme: Theme) -> Self {
        theme.0
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Inclusive range the topic count is drawn from.
///
/// Serialized as a two-element array, e.g. `cli_topic_range = [5, 9]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct TopicRange {
    pub min: u32,
    pub max: u32,
}

impl TopicRange {
    /// Range used by the command-line generator.
    pub const CLI: TopicRange = TopicRange { min: 5, max: 9 };

    /// Range used by the web variant.
    pub const WEB: TopicRange = TopicRange { min: 5, max: 10 };

    pub fn new(min: u32, max: u32) -> Result<Self> {
        let range = Self { min, max };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min == 0 || self.min > self.max {
            return Err(PipelineError::InvalidConfig(format!(
                "Topic range must satisfy 1 <= min <= max, got [{}, {}]",
                self.min, self.max
            )));
        }
        Ok(())
    }

    pub fn contains(&self, n: u32) -> bool {
        (self.min..=self.max).contains(&n)
    }

    /// Draw a count uniformly from the range.
    pub fn sample(&self) -> Result<TopicCount> {
        self.validate()?;
        Ok(TopicCount(fastrand::u32(self.min..=self.max)))
    }
}

impl From<[u32; 2]> for TopicRange {
    fn from([min, max]: [u32; 2]) -> Self {
        Self { min, max }
    }
}

impl From<TopicRange> for [u32; 2] {
    fn from(range: TopicRange) -> Self {
        [range.min, range.max]
    }
}

/// Number of topics to generate; fixed for the duration of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicCount(u32);

impl TopicCount {
    /// Accept an explicit count, rejecting values outside `range`.
    pub fn new(n: u32, range: TopicRange) -> Result<Self> {
        range.validate()?;
        if !range.contains(n) {
            return Err(PipelineError::InvalidConfig(format!(
                "Topic count {} is outside [{}, {}]",
                n, range.min, range.max
            )));
        }
        Ok(Self(n))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TopicCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Initial input to a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInput {
    pub theme: Theme,
    pub topic_count: TopicCount,
}

impl RunInput {
    pub fn new(theme: Theme, topic_count: TopicCount) -> Self {
        Self { theme, topic_count }
    }
}

/// Output from a single completed stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    /// Name of the stage that produced this text.
    pub stage: String,

    /// Cleaned text returned by the agent.
    pub text: String,

    pub completed_at: DateTime<Local>,
}

/// Complete result of a successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub theme: Theme,
    pub topic_count: TopicCount,

    /// Final text from the last stage.
    pub content: String,

    /// Results from each stage in execution order.
    pub stage_results: Vec<StageResult>,

    pub completed_at: DateTime<Local>,
}

/// Lifecycle of a single run.
///
/// `Idle -> Running(0) -> ... -> Running(n-1) -> Completed`, or
/// `Running(i) -> Failed`. A failed run is never resumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Running {
        stage: String,
        stage_index: usize,
    },
    Completed,
    Failed {
        stage: Option<String>,
        message: String,
    },
}

impl RunState {
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running { .. })
    }
}

/// Progress update emitted during pipeline execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineProgress {
    /// Current stage index (0-based).
    pub stage_index: usize,

    /// Total number of stages in the pipeline.
    pub total_stages: usize,

    /// Name of the current stage.
    pub stage_name: String,

    /// Human-readable label (e.g. "Link Collecting").
    pub label: String,
}

/// Values substituted into prompt templates via `{key}` placeholders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineContext {
    pub data: HashMap<String, String>,
}

impl PipelineContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(|s| s.as_str())
    }

    /// Context holding the `theme` and `topic_count` parameters.
    pub fn for_run(theme: &Theme, count: TopicCount) -> Self {
        Self::new()
            .insert("theme", theme.as_str())
            .insert("topic_count", count.to_string())
    }
}
