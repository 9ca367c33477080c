use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::project::Project;

use super::ProjectStore;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing to write.
    Idle,
    /// Dirty, but the quiet window has not elapsed yet.
    Pending,
    Saved,
    /// The write failed. The document stays dirty so a later flush retries.
    Failed(String),
}

/// Coalesces bursts of mutations into one write once the document has been
/// quiet for `window`. The caller supplies the clock.
#[derive(Debug, Clone)]
pub struct SaveScheduler {
    window: Duration,
    last_change: Option<Instant>,
}

impl Default for SaveScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl SaveScheduler {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_change: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn is_dirty(&self) -> bool {
        self.last_change.is_some()
    }

    /// Records a mutation; every call restarts the quiet window.
    pub fn mark_dirty(&mut self, now: Instant) {
        self.last_change = Some(now);
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.last_change
            .is_some_and(|changed| now.saturating_duration_since(changed) >= self.window)
    }

    pub fn flush_if_due<S: ProjectStore + ?Sized>(
        &mut self,
        now: Instant,
        store: &S,
        key: &str,
        project: &Project,
    ) -> SaveOutcome {
        if !self.is_dirty() {
            return SaveOutcome::Idle;
        }
        if !self.is_due(now) {
            return SaveOutcome::Pending;
        }
        self.write(store, key, project)
    }

    /// Writes immediately when dirty, ignoring the quiet window.
    pub fn flush<S: ProjectStore + ?Sized>(
        &mut self,
        store: &S,
        key: &str,
        project: &Project,
    ) -> SaveOutcome {
        if !self.is_dirty() {
            return SaveOutcome::Idle;
        }
        self.write(store, key, project)
    }

    fn write<S: ProjectStore + ?Sized>(&mut self, store: &S, key: &str, project: &Project) -> SaveOutcome {
        match store.save(key, project) {
            Ok(()) => {
                self.last_change = None;
                debug!(key, "debounced save written");
                SaveOutcome::Saved
            }
            Err(err) => {
                warn!(key, error = %err, "save failed; keeping changes in memory");
                SaveOutcome::Failed(err.to_string())
            }
        }
    }
}
