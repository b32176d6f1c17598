//! Feedback submission error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("Feedback transport error: {0}")]
    Transport(String),

    #[error("Feedback endpoint returned status {status}: {body}")]
    Protocol { status: u16, body: String },

    #[error("Malformed feedback response: {0}")]
    MalformedResponse(String),

    #[error("Invalid feedback configuration: {0}")]
    Config(String),

    #[error("Unknown error: {0}")]
    Unknown(#[from] anyhow::Error),
}

impl FeedbackError {
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        FeedbackError::Transport(msg.into())
    }

    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        FeedbackError::MalformedResponse(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        FeedbackError::Config(msg.into())
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, FeedbackError::Transport(_))
    }

    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            FeedbackError::Protocol { .. } | FeedbackError::MalformedResponse(_)
        )
    }
}

// reqwest failures surface before a status line is read, so they are transport errors
impl From<reqwest::Error> for FeedbackError {
    fn from(err: reqwest::Error) -> Self {
        FeedbackError::Transport(err.to_string())
    }
}

impl From<toml::de::Error> for FeedbackError {
    fn from(err: toml::de::Error) -> Self {
        FeedbackError::Config(err.to_string())
    }
}

pub type FeedbackResult<T> = Result<T, FeedbackError>;
