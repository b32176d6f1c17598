//! Background feedback submission
//!
//! [`FeedbackSubmissionTask`] wraps one submission in a unit of work a
//! [`BackgroundScheduler`] can run. The outcome is delivered to exactly one
//! of two caller-supplied continuations.
//!
//! ## Usage
//! ```rust,ignore
//! use anonymous_feedback::task::{FeedbackSubmissionTask, TokioScheduler, BackgroundScheduler};
//!
//! let task = FeedbackSubmissionTask::new(
//!     None,
//!     "Submitting error report",
//!     true,
//!     params,
//!     |token| println!("Reported as #{}", token),
//!     |err| eprintln!("Report failed: {}", err),
//! );
//! let handle = TokioScheduler::current().schedule_background(Box::new(task));
//! handle.join().await;
//! ```

pub mod progress;
pub mod scheduler;

use crate::config::DEFAULT_ENDPOINT;
use crate::error::{FeedbackError, FeedbackResult};
use crate::feedback::{send_feedback, FeedbackParameters, SubmissionToken};
use crate::transport::{HttpConnectionFactory, ProxyHttpConnectionFactory};
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;

pub use progress::{ProgressIndicator, TaskProgress};
pub use scheduler::{BackgroundScheduler, TaskHandle, TokioScheduler};

pub type SuccessCallback = Box<dyn FnOnce(SubmissionToken) + Send>;
pub type FailureCallback = Box<dyn FnOnce(FeedbackError) + Send>;

/// Project or session a task belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub name: String,
}

impl SessionContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// How the scheduler should present and treat a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDescriptor {
    pub title: String,
    pub cancellable: bool,
    pub context: Option<SessionContext>,
}

/// Lifecycle of a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Created,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl TaskState {
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            TaskState::Succeeded | TaskState::Failed | TaskState::Cancelled
        )
    }
}

/// Runnable body handed to a [`BackgroundScheduler`]
pub trait BackgroundTask: Send + 'static {
    fn descriptor(&self) -> &TaskDescriptor;

    /// Run to completion on the worker chosen by the scheduler
    fn run(
        self: Box<Self>,
        indicator: Arc<dyn ProgressIndicator>,
    ) -> Pin<Box<dyn Future<Output = TaskState> + Send>>;
}

/// Submits one feedback report and reports the outcome through callbacks
pub struct FeedbackSubmissionTask {
    descriptor: TaskDescriptor,
    params: FeedbackParameters,
    endpoint: String,
    factory: Arc<dyn HttpConnectionFactory>,
    on_success: SuccessCallback,
    on_failure: FailureCallback,
}

impl FeedbackSubmissionTask {
    pub fn new<S, F>(
        context: Option<SessionContext>,
        title: impl Into<String>,
        cancellable: bool,
        params: FeedbackParameters,
        on_success: S,
        on_failure: F,
    ) -> Self
    where
        S: FnOnce(SubmissionToken) + Send + 'static,
        F: FnOnce(FeedbackError) + Send + 'static,
    {
        Self {
            descriptor: TaskDescriptor {
                title: title.into(),
                cancellable,
                context,
            },
            params,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            factory: Arc::new(ProxyHttpConnectionFactory::default()),
            on_success: Box::new(on_success),
            on_failure: Box::new(on_failure),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_connection_factory(mut self, factory: Arc<dyn HttpConnectionFactory>) -> Self {
        self.factory = factory;
        self
    }

    pub fn descriptor(&self) -> &TaskDescriptor {
        &self.descriptor
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Perform the submission and invoke exactly one continuation.
    ///
    /// Cancellation is not checked here: once started, the exchange runs to
    /// completion and its continuation fires. A panic inside the injected
    /// transport is reported to the failure continuation as
    /// [`FeedbackError::Unknown`].
    pub async fn execute(self, indicator: &dyn ProgressIndicator) -> TaskState {
        let FeedbackSubmissionTask {
            descriptor,
            params,
            endpoint,
            factory,
            on_success,
            on_failure,
        } = self;

        tracing::info!("{}: submitting feedback to {}", descriptor.title, endpoint);

        let outcome = AssertUnwindSafe(run_submission(
            indicator,
            factory.as_ref(),
            &endpoint,
            &params,
        ))
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(panic_error(payload)));

        match outcome {
            Ok(token) => {
                tracing::info!("{}: feedback accepted with token {}", descriptor.title, token);
                on_success(token);
                TaskState::Succeeded
            }
            Err(e) => {
                tracing::warn!("{}: feedback submission failed: {}", descriptor.title, e);
                on_failure(e);
                TaskState::Failed
            }
        }
    }
}

impl BackgroundTask for FeedbackSubmissionTask {
    fn descriptor(&self) -> &TaskDescriptor {
        &self.descriptor
    }

    fn run(
        self: Box<Self>,
        indicator: Arc<dyn ProgressIndicator>,
    ) -> Pin<Box<dyn Future<Output = TaskState> + Send>> {
        Box::pin(async move { (*self).execute(indicator.as_ref()).await })
    }
}

impl std::fmt::Debug for FeedbackSubmissionTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedbackSubmissionTask")
            .field("descriptor", &self.descriptor)
            .field("params", &self.params)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

fn panic_error(payload: Box<dyn Any + Send>) -> FeedbackError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());

    FeedbackError::Unknown(anyhow::anyhow!("feedback submission panicked: {}", message))
}

/// Mark progress indeterminate, then submit. The result-returning form of
/// [`FeedbackSubmissionTask::execute`].
pub async fn run_submission(
    indicator: &dyn ProgressIndicator,
    factory: &dyn HttpConnectionFactory,
    endpoint: &str,
    params: &FeedbackParameters,
) -> FeedbackResult<SubmissionToken> {
    indicator.set_indeterminate(true);
    send_feedback(factory, endpoint, params).await
}
