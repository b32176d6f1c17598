//! Background scheduling of tasks
//!
//! The scheduler owns the worker, the progress indicator and cancellation.
//! Tasks only supply the body that runs on the worker.

use super::progress::{ProgressIndicator, TaskProgress};
use super::{BackgroundTask, TaskDescriptor, TaskState};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Host facility that runs tasks off the caller's thread
pub trait BackgroundScheduler {
    fn schedule_background(&self, task: Box<dyn BackgroundTask>) -> TaskHandle;
}

/// Shared between the handle and the spawned worker
#[derive(Debug)]
struct TaskShared {
    descriptor: TaskDescriptor,
    state: Mutex<TaskState>,
    progress: Arc<TaskProgress>,
}

impl TaskShared {
    /// Lock the state, recovering the value if a previous holder panicked
    fn lock_state(&self) -> MutexGuard<'_, TaskState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("{}: task state lock poisoned, recovering", self.descriptor.title);
            poisoned.into_inner()
        })
    }

    fn state(&self) -> TaskState {
        *self.lock_state()
    }

    fn set_state(&self, state: TaskState) {
        *self.lock_state() = state;
    }

    /// Move Created -> Running unless the task was cancelled first
    fn try_start(&self) -> bool {
        let mut current = self.lock_state();
        if *current == TaskState::Created {
            *current = TaskState::Running;
            true
        } else {
            false
        }
    }
}

/// Caller-side view of a scheduled task
#[derive(Debug)]
pub struct TaskHandle {
    shared: Arc<TaskShared>,
    join: JoinHandle<TaskState>,
}

impl TaskHandle {
    pub fn descriptor(&self) -> &TaskDescriptor {
        &self.shared.descriptor
    }

    pub fn state(&self) -> TaskState {
        self.shared.state()
    }

    pub fn progress(&self) -> Arc<TaskProgress> {
        self.shared.progress.clone()
    }

    /// Request cancellation.
    ///
    /// Only a cancellable task that has not started running is stopped.
    /// Returns whether the request took effect.
    pub fn cancel(&self) -> bool {
        if !self.shared.descriptor.cancellable {
            tracing::debug!("{}: task is not cancellable", self.shared.descriptor.title);
            return false;
        }

        self.shared.progress.cancel();

        let mut current = self.shared.lock_state();
        if *current == TaskState::Created {
            *current = TaskState::Cancelled;
            tracing::info!("{}: cancelled before start", self.shared.descriptor.title);
            true
        } else {
            false
        }
    }

    /// Wait for the task to finish and return its final state
    pub async fn join(self) -> TaskState {
        match self.join.await {
            Ok(state) => state,
            Err(e) => {
                tracing::error!("{}: worker aborted: {}", self.shared.descriptor.title, e);
                self.shared.set_state(TaskState::Failed);
                TaskState::Failed
            }
        }
    }
}

/// Runs each task on the tokio runtime it was created with
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Scheduler for the runtime of the calling context.
    ///
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl BackgroundScheduler for TokioScheduler {
    fn schedule_background(&self, task: Box<dyn BackgroundTask>) -> TaskHandle {
        let shared = Arc::new(TaskShared {
            descriptor: task.descriptor().clone(),
            state: Mutex::new(TaskState::Created),
            progress: Arc::new(TaskProgress::new()),
        });

        tracing::debug!("Scheduling background task: {}", shared.descriptor.title);

        let worker = shared.clone();
        let join = self.handle.spawn(async move {
            if !worker.try_start() {
                // Cancelled before start: the task and its callbacks are dropped unused
                return worker.state();
            }

            worker.progress.set_text(&worker.descriptor.title);
            let indicator: Arc<dyn ProgressIndicator> = worker.progress.clone();
            let finished = task.run(indicator).await;
            worker.set_state(finished);
            finished
        });

        TaskHandle { shared, join }
    }
}
