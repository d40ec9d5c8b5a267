//! Progress observation for pipeline runs.
//!
//! Provides an optional, non-intrusive way to watch a run advance. The
//! runner calls [`ProgressObserver::on_stage_start`] before invoking each
//! stage and [`ProgressObserver::on_stage_complete`] exactly once after each
//! stage succeeds. Nothing is reported for a failed stage or any stage after
//! it; the failure comes back as the run's `Err`.

use crate::types::PipelineProgress;

/// Observer for stage lifecycle events.
///
/// # Example
///
/// ```
/// use article_topics::events::ProgressObserver;
/// use article_topics::PipelineProgress;
///
/// struct PrintObserver;
///
/// impl ProgressObserver for PrintObserver {
///     fn on_stage_complete(&self, progress: &PipelineProgress) {
///         println!("[{}/{}] {} completed", progress.stage_index + 1,
///                  progress.total_stages, progress.label);
///     }
/// }
/// ```
pub trait ProgressObserver: Send + Sync {
    /// Called right before a stage is handed to the agent.
    fn on_stage_start(&self, _progress: &PipelineProgress) {}

    /// Called once after a stage has produced its result.
    fn on_stage_complete(&self, progress: &PipelineProgress);
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_stage_complete(&self, _progress: &PipelineProgress) {}
}

/// Observer that logs each event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn on_stage_start(&self, progress: &PipelineProgress) {
        tracing::info!(
            stage = %progress.stage_name,
            index = progress.stage_index + 1,
            total = progress.total_stages,
            "{}...",
            progress.label
        );
    }

    fn on_stage_complete(&self, progress: &PipelineProgress) {
        tracing::info!(
            stage = %progress.stage_name,
            index = progress.stage_index + 1,
            total = progress.total_stages,
            "{} completed",
            progress.label
        );
    }
}

/// A [`ProgressObserver`] backed by a closure, called on completion only.
///
/// # Example
///
/// ```
/// use article_topics::events::FnObserver;
/// use article_topics::PipelineProgress;
///
/// let observer = FnObserver(|p: &PipelineProgress| {
///     println!("✅ {} completed!", p.label);
/// });
/// ```
pub struct FnObserver<F: Fn(&PipelineProgress) + Send + Sync>(pub F);

impl<F: Fn(&PipelineProgress) + Send + Sync> ProgressObserver for FnObserver<F> {
    fn on_stage_complete(&self, progress: &PipelineProgress) {
        (self.0)(progress);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn progress(index: usize) -> PipelineProgress {
        PipelineProgress {
            stage_index: index,
            total_stages: 5,
            stage_name: "plan".to_string(),
            label: "Planning".to_string(),
        }
    }

    #[test]
    fn test_fn_observer_receives_completion() {
        let seen = Mutex::new(Vec::new());
        let observer = FnObserver(|p: &PipelineProgress| {
            seen.lock().unwrap().push(p.stage_index);
        });
        observer.on_stage_start(&progress(0));
        observer.on_stage_complete(&progress(0));
        observer.on_stage_complete(&progress(1));
        assert_eq!(*seen.lock().unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_observers_are_object_safe() {
        let observers: Vec<Box<dyn ProgressObserver>> =
            vec![Box::new(NoopObserver), Box::new(TracingObserver)];
        for observer in &observers {
            observer.on_stage_start(&progress(2));
            observer.on_stage_complete(&progress(2));
        }
    }
}
