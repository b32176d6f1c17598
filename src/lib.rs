//! Anonymous Feedback Library
//!
//! This library submits anonymous error reports to a remote feedback
//! endpoint from a cancellable background task, through a proxy-aware
//! HTTP transport, reporting the outcome via success/failure callbacks.

pub mod config;
pub mod error;
pub mod feedback;
pub mod task;
pub mod transport;

// Re-export commonly used types for convenience
pub use config::{FeedbackConfig, DEFAULT_ENDPOINT};
pub use error::{FeedbackError, FeedbackResult};
pub use feedback::{send_feedback, ErrorReport, FeedbackParameters, SubmissionToken};
pub use task::{
    BackgroundScheduler, FeedbackSubmissionTask, ProgressIndicator, SessionContext,
    TaskDescriptor, TaskHandle, TaskState, TokioScheduler,
};
pub use transport::{HttpConnection, HttpConnectionFactory, ProxyHttpConnectionFactory};
