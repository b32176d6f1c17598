//! Progress indicator for background tasks

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Progress surface a running task reports to
pub trait ProgressIndicator: Send + Sync {
    /// Switch between "duration unknown" and percentage reporting
    fn set_indeterminate(&self, indeterminate: bool);

    fn is_indeterminate(&self) -> bool;

    fn set_text(&self, text: &str);

    /// Whether the owner asked the task to stop. Advisory only.
    fn is_canceled(&self) -> bool;
}

/// Thread-safe indicator owned by the scheduler
#[derive(Debug, Default)]
pub struct TaskProgress {
    indeterminate: AtomicBool,
    canceled: AtomicBool,
    text: Mutex<String>,
}

impl TaskProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    pub fn text(&self) -> String {
        self.text.lock().map(|t| t.clone()).unwrap_or_default()
    }
}

impl ProgressIndicator for TaskProgress {
    fn set_indeterminate(&self, indeterminate: bool) {
        tracing::trace!("Progress indeterminate: {}", indeterminate);
        self.indeterminate.store(indeterminate, Ordering::SeqCst);
    }

    fn is_indeterminate(&self) -> bool {
        self.indeterminate.load(Ordering::SeqCst)
    }

    fn set_text(&self, text: &str) {
        if let Ok(mut current) = self.text.lock() {
            *current = text.to_string();
        }
    }

    fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }
}
