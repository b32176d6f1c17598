//! Single request/response exchange with the feedback endpoint

use super::params::FeedbackParameters;
use crate::error::{FeedbackError, FeedbackResult};
use crate::transport::{HttpConnectionFactory, HttpRequest, HttpResponse};
use serde::Deserialize;

/// Identifier the remote service assigns to an accepted report
pub type SubmissionToken = i32;

/// JSON shapes the endpoint may answer with
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    number: Option<SubmissionToken>,
    #[serde(default)]
    id: Option<SubmissionToken>,
}

/// Submit `params` to `endpoint` through a connection from `factory`.
///
/// Empty parameter sets are sent as-is. Nothing is retried.
pub async fn send_feedback(
    factory: &dyn HttpConnectionFactory,
    endpoint: &str,
    params: &FeedbackParameters,
) -> FeedbackResult<SubmissionToken> {
    tracing::debug!("Submitting {} feedback fields to {}", params.len(), endpoint);

    let mut connection = factory.open_connection(endpoint)?;
    let response = connection
        .send(HttpRequest::form(params.to_form_body()))
        .await?;

    if !response.is_success() {
        return Err(FeedbackError::Protocol {
            status: response.status,
            body: response.body,
        });
    }

    parse_token(&response)
}

fn parse_token(response: &HttpResponse) -> FeedbackResult<SubmissionToken> {
    let body = response.body.trim();

    if let Ok(parsed) = serde_json::from_str::<TokenResponse>(body) {
        if let Some(token) = parsed.number.or(parsed.id) {
            return Ok(token);
        }
    }

    body.parse::<SubmissionToken>().map_err(|_| {
        FeedbackError::malformed(format!(
            "expected an integer token in response body, got {:?}",
            body
        ))
    })
}
