//! Per-session bookkeeping for the web variant.
//!
//! A [`SessionContext`] holds the run history, the current [`RunState`] and
//! the progress messages shown while a run is active. It is owned by the
//! server state and passed to handlers explicitly.

use crate::error::Result;
use crate::events::ProgressObserver;
use crate::registry;
use crate::types::{PipelineProgress, RunResult, RunState};
use crate::PipelineError;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Number of history entries shown by default.
pub const DEFAULT_DISPLAY_LIMIT: usize = 5;

/// Characters shown in a collapsed history entry.
pub const PREVIEW_CHARS: usize = 200;

/// One finished run kept in the session history.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub result: RunResult,
    /// Whether the full content is shown instead of the preview.
    pub expanded: bool,
}

impl HistoryEntry {
    /// First `limit` characters of the content, with `...` appended when
    /// the content is longer.
    pub fn preview(&self, limit: usize) -> String {
        let content = &self.result.content;
        match content.char_indices().nth(limit) {
            Some((cut, _)) => format!("{}...", &content[..cut]),
            None => content.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionContext {
    /// Newest first. Unbounded.
    history: Vec<HistoryEntry>,
    state: RunState,
    progress_messages: Vec<String>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn progress_messages(&self) -> &[String] {
        &self.progress_messages
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Store a finished run at the front of the history.
    pub fn record(&mut self, result: RunResult) -> Uuid {
        let id = Uuid::new_v4();
        self.history.insert(
            0,
            HistoryEntry {
                id,
                result,
                expanded: false,
            },
        );
        id
    }

    pub fn get(&self, id: Uuid) -> Option<&HistoryEntry> {
        self.history.iter().find(|e| e.id == id)
    }

    /// Remove an entry. Returns false when no entry has that id.
    pub fn delete(&mut self, id: Uuid) -> bool {
        let before = self.history.len();
        self.history.retain(|e| e.id != id);
        self.history.len() != before
    }

    /// The `limit` most recent entries.
    pub fn recent(&self, limit: usize) -> &[HistoryEntry] {
        &self.history[..limit.min(self.history.len())]
    }

    /// Flip the expanded flag. Returns the new value.
    pub fn toggle_expanded(&mut self, id: Uuid) -> Option<bool> {
        let entry = self.history.iter_mut().find(|e| e.id == id)?;
        entry.expanded = !entry.expanded;
        Some(entry.expanded)
    }

    /// Mark a run as started. Fails if one is already running.
    pub fn begin_run(&mut self) -> Result<()> {
        if self.state.is_running() {
            return Err(PipelineError::InvalidConfig(
                "A run is already in progress".to_string(),
            ));
        }
        self.progress_messages.clear();
        self.state = RunState::Running {
            stage: registry::PLAN.to_string(),
            stage_index: 0,
        };
        Ok(())
    }

    pub fn stage_started(&mut self, progress: &PipelineProgress) {
        self.state = RunState::Running {
            stage: progress.stage_name.clone(),
            stage_index: progress.stage_index,
        };
    }

    pub fn stage_completed(&mut self, progress: &PipelineProgress) {
        self.progress_messages
            .push(format!("✅ {} completed!", progress.label));
    }

    /// Close the current run. A successful result is recorded and its id
    /// returned; a failure is kept in the state and passed back.
    pub fn finish(&mut self, outcome: Result<RunResult>) -> Result<Uuid> {
        match outcome {
            Ok(result) => {
                self.state = RunState::Completed;
                Ok(self.record(result))
            }
            Err(e) => {
                self.state = RunState::Failed {
                    stage: e.stage().map(str::to_string),
                    message: e.to_string(),
                };
                Err(e)
            }
        }
    }
}

/// Lock a shared session. A poisoned lock is logged and recovered: the
/// session only holds plain data, so the state left by a panicking holder
/// is still readable.
pub fn lock(session: &Mutex<SessionContext>) -> MutexGuard<'_, SessionContext> {
    session.lock().unwrap_or_else(|poisoned| {
        tracing::warn!("session lock poisoned, recovering");
        PoisonError::into_inner(poisoned)
    })
}

/// [`ProgressObserver`] that mirrors progress into a shared session.
#[derive(Debug, Clone)]
pub struct SessionObserver {
    session: Arc<Mutex<SessionContext>>,
}

impl SessionObserver {
    pub fn new(session: Arc<Mutex<SessionContext>>) -> Self {
        Self { session }
    }
}

impl ProgressObserver for SessionObserver {
    fn on_stage_start(&self, progress: &PipelineProgress) {
        lock(&self.session).stage_started(progress);
    }

    fn on_stage_complete(&self, progress: &PipelineProgress) {
        lock(&self.session).stage_completed(progress);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Theme, TopicCount, TopicRange};
    use chrono::Local;

    fn run(content: &str) -> RunResult {
        RunResult {
            theme: Theme::new("Urban Farming").unwrap(),
            topic_count: TopicCount::new(6, TopicRange::WEB).unwrap(),
            content: content.to_string(),
            stage_results: Vec::new(),
            completed_at: Local::now(),
        }
    }

    fn progress(index: usize, name: &str, label: &str) -> PipelineProgress {
        PipelineProgress {
            stage_index: index,
            total_stages: 5,
            stage_name: name.to_string(),
            label: label.to_string(),
        }
    }

    #[test]
    fn test_record_newest_first_and_recent() {
        let mut session = SessionContext::new();
        let ids: Vec<_> = (0..7).map(|i| session.record(run(&format!("run {i}")))).collect();
        assert_eq!(session.history().len(), 7);

        let recent = session.recent(DEFAULT_DISPLAY_LIMIT);
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].id, ids[6]);
        assert_eq!(recent[4].id, ids[2]);
        assert_eq!(session.recent(100).len(), 7);
    }

    #[test]
    fn test_delete_and_toggle() {
        let mut session = SessionContext::new();
        let id = session.record(run("x"));
        assert_eq!(session.toggle_expanded(id), Some(true));
        assert_eq!(session.toggle_expanded(id), Some(false));
        assert!(session.delete(id));
        assert!(!session.delete(id));
        assert_eq!(session.toggle_expanded(id), None);
        assert!(session.get(id).is_none());
    }

    #[test]
    fn test_preview() {
        let mut session = SessionContext::new();
        let long = "é".repeat(250);
        let id = session.record(run(&long));
        let preview = session.get(id).unwrap().preview(PREVIEW_CHARS);
        assert_eq!(preview.chars().count(), 203);
        assert!(preview.ends_with("..."));

        let id = session.record(run("short"));
        assert_eq!(session.get(id).unwrap().preview(PREVIEW_CHARS), "short");
    }

    #[test]
    fn test_run_lifecycle() {
        let mut session = SessionContext::new();
        session.begin_run().unwrap();
        assert!(matches!(
            session.begin_run(),
            Err(PipelineError::InvalidConfig(_))
        ));

        let p = progress(1, "research", "Researching");
        session.stage_started(&p);
        session.stage_completed(&p);
        assert_eq!(session.progress_messages(), ["✅ Researching completed!"]);
        assert_eq!(
            session.state(),
            &RunState::Running {
                stage: "research".to_string(),
                stage_index: 1
            }
        );

        let id = session.finish(Ok(run("done"))).unwrap();
        assert_eq!(session.state(), &RunState::Completed);
        assert_eq!(session.history()[0].id, id);

        // a new run clears old messages
        session.begin_run().unwrap();
        assert!(session.progress_messages().is_empty());
    }

    #[test]
    fn test_failed_run_keeps_stage() {
        let mut session = SessionContext::new();
        session.begin_run().unwrap();
        let err = session
            .finish(Err(PipelineError::StageFailed {
                stage: "condense".to_string(),
                message: "HTTP 500".to_string(),
            }))
            .unwrap_err();
        assert_eq!(err.stage(), Some("condense"));
        match session.state() {
            RunState::Failed { stage, .. } => assert_eq!(stage.as_deref(), Some("condense")),
            other => panic!("unexpected state: {other:?}"),
        }
        assert!(session.history().is_empty());
        // a failed run can be started again
        assert!(session.begin_run().is_ok());
    }

    #[test]
    fn test_session_observer() {
        let shared = Arc::new(Mutex::new(SessionContext::new()));
        let observer = SessionObserver::new(shared.clone());
        let p = progress(0, "plan", "Planning");
        observer.on_stage_start(&p);
        observer.on_stage_complete(&p);
        let session = shared.lock().unwrap();
        assert_eq!(session.progress_messages(), ["✅ Planning completed!"]);
    }

    #[test]
    fn test_observer_recovers_poisoned_lock() {
        let shared = Arc::new(Mutex::new(SessionContext::new()));
        let poisoner = shared.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("holder panicked");
        })
        .join();
        assert!(shared.is_poisoned());

        let observer = SessionObserver::new(shared.clone());
        observer.on_stage_complete(&progress(0, "plan", "Planning"));
        assert_eq!(lock(&shared).progress_messages(), ["✅ Planning completed!"]);
    }
}
