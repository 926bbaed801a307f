use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

/// Shared cancel flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the run to stop at its next step boundary
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Determinate progress of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunProgress {
    pub completed_steps: usize,
    pub total_steps: usize,

    /// Host of the site the last step belonged to
    pub domain: String,
}

impl RunProgress {
    pub fn percent(&self) -> usize {
        if self.total_steps == 0 {
            0
        } else {
            self.completed_steps * 100 / self.total_steps
        }
    }
}

/// Notifications from the worker to the presentation layer, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// The search collaborator was called
    Searching { query: String },

    /// Candidate sites are known and the step budget is fixed
    Started { sites: usize, total_steps: usize },

    /// One step finished
    Step(RunProgress),
}

/// State owned by the worker for the lifetime of one run
pub struct RunContext {
    progress: RunProgress,
    cancel: CancelHandle,
    events: UnboundedSender<RunEvent>,
}

impl RunContext {
    pub fn new(cancel: CancelHandle, events: UnboundedSender<RunEvent>) -> Self {
        Self {
            progress: RunProgress::default(),
            cancel,
            events,
        }
    }

    pub fn searching(&self, query: &str) {
        self.emit(RunEvent::Searching {
            query: query.to_string(),
        });
    }

    /// Reset the counters and fix the step budget
    pub fn begin(&mut self, sites: usize, total_steps: usize) {
        self.progress = RunProgress {
            completed_steps: 0,
            total_steps,
            domain: String::new(),
        };
        self.emit(RunEvent::Started { sites, total_steps });
    }

    /// Count one finished step and notify
    pub fn advance(&mut self, domain: &str) {
        debug_assert!(
            self.progress.completed_steps < self.progress.total_steps,
            "step budget exceeded"
        );
        self.progress.completed_steps += 1;
        if self.progress.domain != domain {
            self.progress.domain = domain.to_string();
        }
        self.emit(RunEvent::Step(self.progress.clone()));
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancel_handle(&self) -> &CancelHandle {
        &self.cancel
    }

    pub fn progress(&self) -> &RunProgress {
        &self.progress
    }

    fn emit(&self, event: RunEvent) {
        // A closed receiver only means nobody is watching any more
        let _ = self.events.send(event);
    }
}
