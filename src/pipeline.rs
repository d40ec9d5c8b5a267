use crate::{
    agent::{AgentExecutor, RunContext},
    error::Result,
    events::ProgressObserver,
    registry,
    stage::Stage,
    types::{PipelineProgress, RunInput, RunResult, RunState, StageResult, Theme, TopicCount},
    PipelineError,
};
use chrono::Local;
use std::collections::HashSet;

/// Sequential runner for multi-stage agent workflows.
///
/// Stages run strictly in order, one at a time. Each stage sees the results
/// of the stages it depends on through [`RunContext::upstream_for`]. The
/// first failing stage aborts the run; there are no retries and no resume.
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field(
                "stages",
                &self.stages.iter().map(|s| &s.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// The five article stages, built for `theme` and `count`.
    pub fn for_article(theme: &Theme, count: TopicCount) -> Result<Self> {
        registry::article_stages(theme, count)?
            .into_iter()
            .fold(Self::builder(), PipelineBuilder::add_stage)
            .build()
    }

    /// Get a reference to the pipeline's stages.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Execute every stage in order.
    ///
    /// `observer.on_stage_complete` fires exactly once per successful stage,
    /// after its result has been recorded. When stage k fails, the error is
    /// returned as [`PipelineError::StageFailed`] and no stage after k runs.
    pub async fn run(
        &self,
        executor: &dyn AgentExecutor,
        input: RunInput,
        observer: &dyn ProgressObserver,
    ) -> Result<RunResult> {
        let total_stages = self.stages.len();
        let mut context = RunContext::new(input.theme, input.topic_count);
        let mut state = RunState::Idle;

        tracing::info!(
            theme = %context.theme,
            topic_count = %context.topic_count,
            stages = total_stages,
            "starting run"
        );

        for (idx, stage) in self.stages.iter().enumerate() {
            transition(
                &mut state,
                RunState::Running {
                    stage: stage.name.clone(),
                    stage_index: idx,
                },
            );
            let progress = PipelineProgress {
                stage_index: idx,
                total_stages,
                stage_name: stage.name.clone(),
                label: stage.label.clone(),
            };
            observer.on_stage_start(&progress);

            let text = match executor.execute(stage, &context).await {
                Ok(text) => text,
                Err(e) => {
                    let message = e.to_string();
                    transition(
                        &mut state,
                        RunState::Failed {
                            stage: Some(stage.name.clone()),
                            message: message.clone(),
                        },
                    );
                    return Err(PipelineError::StageFailed {
                        stage: stage.name.clone(),
                        message,
                    });
                }
            };

            context.results.push(StageResult {
                stage: stage.name.clone(),
                text,
                completed_at: Local::now(),
            });
            observer.on_stage_complete(&progress);
        }

        let content = context
            .results
            .last()
            .ok_or_else(|| PipelineError::Other("No stages were executed".to_string()))?
            .text
            .trim()
            .to_string();
        transition(&mut state, RunState::Completed);

        Ok(RunResult {
            theme: context.theme,
            topic_count: context.topic_count,
            content,
            stage_results: context.results,
            completed_at: Local::now(),
        })
    }
}

fn transition(state: &mut RunState, next: RunState) {
    match &next {
        RunState::Failed { stage, message } => {
            tracing::error!(from = ?state, stage = ?stage, %message, "run failed")
        }
        _ => tracing::debug!(from = ?state, to = ?next, "run state"),
    }
    *state = next;
}

/// Build a pipeline for the article stages and run it once.
pub async fn run_article(
    executor: &dyn AgentExecutor,
    input: RunInput,
    observer: &dyn ProgressObserver,
) -> Result<RunResult> {
    let pipeline = Pipeline::for_article(&input.theme, input.topic_count)?;
    pipeline.run(executor, input, observer).await
}

/// Builder for creating pipelines.
pub struct PipelineBuilder {
    stages: Vec<Stage>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Add a stage to the pipeline. Its ordinal is its position.
    pub fn add_stage(mut self, mut stage: Stage) -> Self {
        stage.ordinal = self.stages.len();
        self.stages.push(stage);
        self
    }

    /// Build the pipeline, validating configuration.
    ///
    /// Every `depends_on` entry must name a stage added earlier.
    pub fn build(self) -> Result<Pipeline> {
        if self.stages.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "Pipeline must have at least one stage".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for stage in &self.stages {
            for dep in &stage.depends_on {
                if !seen.contains(dep.as_str()) {
                    return Err(PipelineError::InvalidConfig(format!(
                        "Stage '{}' depends on '{}', which is not an earlier stage",
                        stage.name, dep
                    )));
                }
            }
            if !seen.insert(stage.name.as_str()) {
                return Err(PipelineError::InvalidConfig(format!(
                    "Duplicate stage name '{}'",
                    stage.name
                )));
            }
        }

        Ok(Pipeline {
            stages: self.stages,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
