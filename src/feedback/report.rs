//! Error report assembly
//!
//! Turns a captured error into the fixed, ordered field set the feedback
//! endpoint expects.

use super::params::FeedbackParameters;

pub const FIELD_MESSAGE: &str = "error.message";
pub const FIELD_STACKTRACE: &str = "error.stacktrace";
pub const FIELD_DESCRIPTION: &str = "error.description";
pub const FIELD_PLUGIN_VERSION: &str = "plugin.version";
pub const FIELD_OS_NAME: &str = "os.name";
pub const FIELD_OS_ARCH: &str = "os.arch";
pub const FIELD_REPORTER_VERSION: &str = "reporter.version";
pub const FIELD_LAST_ACTION: &str = "last.action";

/// A user-submitted error report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub message: String,
    pub stack_trace: Option<String>,
    /// Free text the user typed into the report dialog
    pub description: Option<String>,
    pub plugin_version: Option<String>,
    pub last_action: Option<String>,
}

impl ErrorReport {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack_trace: None,
            description: None,
            plugin_version: None,
            last_action: None,
        }
    }

    /// Build a report from an error, rendering its `source()` chain as the trace
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut trace = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            trace.push(format!("Caused by: {}", cause));
            source = cause.source();
        }

        let mut report = Self::new(error.to_string());
        if !trace.is_empty() {
            report.stack_trace = Some(trace.join("\n"));
        }
        report
    }

    pub fn stack_trace(mut self, trace: impl Into<String>) -> Self {
        self.stack_trace = Some(trace.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn plugin_version(mut self, version: impl Into<String>) -> Self {
        self.plugin_version = Some(version.into());
        self
    }

    pub fn last_action(mut self, action: impl Into<String>) -> Self {
        self.last_action = Some(action.into());
        self
    }

    pub fn into_parameters(self) -> FeedbackParameters {
        let mut params = FeedbackParameters::new();
        params.insert(FIELD_MESSAGE, Some(self.message));
        params.insert(FIELD_STACKTRACE, self.stack_trace);
        params.insert(FIELD_DESCRIPTION, self.description);
        params.insert(FIELD_PLUGIN_VERSION, self.plugin_version);
        params.insert(FIELD_OS_NAME, Some(std::env::consts::OS.to_string()));
        params.insert(FIELD_OS_ARCH, Some(std::env::consts::ARCH.to_string()));
        params.insert(
            FIELD_REPORTER_VERSION,
            Some(env!("CARGO_PKG_VERSION").to_string()),
        );
        params.insert(FIELD_LAST_ACTION, self.last_action);
        params
    }
}
