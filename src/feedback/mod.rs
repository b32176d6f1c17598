//! Anonymous feedback reports
//!
//! Building the form fields of a report and submitting them to the remote
//! collection endpoint.

pub mod params;
pub mod report;
pub mod submit;

pub use params::FeedbackParameters;
pub use report::ErrorReport;
pub use submit::{send_feedback, SubmissionToken};
