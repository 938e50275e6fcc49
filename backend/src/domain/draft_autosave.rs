//! Debounced draft writes.
//!
//! Each form name has at most one pending write. Scheduling a new snapshot
//! aborts the pending task for that form, so only the last snapshot inside a
//! quiet period is persisted.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::storage::repositories::DraftRepository;

/// Quiet period before a draft is written
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Clone)]
pub struct DraftAutosaver {
    drafts: DraftRepository,
    delay: Duration,
    pending: Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
}

impl DraftAutosaver {
    pub fn new(drafts: DraftRepository, delay: Duration) -> Self {
        Self {
            drafts,
            delay,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Save `snapshot` under `form` once the delay elapses without another
    /// snapshot for the same form. Must be called inside a tokio runtime.
    pub fn schedule(&self, form: &str, snapshot: Value) {
        let drafts = self.drafts.clone();
        let delay = self.delay;
        let name = form.to_string();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            drafts.save_value(&name, &snapshot).await;
        });

        if let Some(previous) = self.lock().insert(form.to_string(), handle) {
            debug!("Superseding pending draft save for form '{}'", form);
            previous.abort();
        }
    }

    /// Drop the pending save for `form`, returning whether one was waiting
    pub fn cancel(&self, form: &str) -> bool {
        match self.lock().remove(form) {
            Some(handle) => {
                let waiting = !handle.is_finished();
                handle.abort();
                waiting
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        for (_, handle) in self.lock().drain() {
            handle.abort();
        }
    }

    pub fn is_pending(&self, form: &str) -> bool {
        self.lock()
            .get(form)
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
