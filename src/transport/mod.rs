//! HTTP transport abstraction for feedback submission
//!
//! The submission routine never configures networking itself. It asks an
//! [`HttpConnectionFactory`] for a connection to a URL and sends a single
//! request through it, so proxy handling can be swapped out (or mocked)
//! without touching the submission logic.

pub mod proxy;

use crate::error::FeedbackResult;
use async_trait::async_trait;

pub use proxy::{ProxyHttpConnectionFactory, ProxySettings};

/// A single outbound HTTP request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: reqwest::Method,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// POST with a form-urlencoded body
    pub fn form(body: String) -> Self {
        Self {
            method: reqwest::Method::POST,
            content_type: "application/x-www-form-urlencoded".to_string(),
            body: body.into_bytes(),
        }
    }
}

/// Status line and body of a completed exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// An open connection to one URL
#[async_trait]
pub trait HttpConnection: Send {
    /// Perform the request/response exchange
    async fn send(&mut self, request: HttpRequest) -> FeedbackResult<HttpResponse>;
}

/// Opens configured connections for a URL
pub trait HttpConnectionFactory: Send + Sync {
    fn open_connection(&self, url: &str) -> FeedbackResult<Box<dyn HttpConnection>>;
}

impl<F> HttpConnectionFactory for F
where
    F: Fn(&str) -> FeedbackResult<Box<dyn HttpConnection>> + Send + Sync,
{
    fn open_connection(&self, url: &str) -> FeedbackResult<Box<dyn HttpConnection>> {
        self(url)
    }
}
