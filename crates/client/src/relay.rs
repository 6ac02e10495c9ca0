//! Contact relay request/response codec.
//!
//! The relay accepts `POST {relay_path}` with a JSON `ContactSubmission`
//! and answers `{success, error?, message?}`.

use folio_core::{CachedResponse, ContactSubmission, Error, Request, RequestMode};
use serde::{Deserialize, Serialize};
use url::Url;

/// Relay response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Build the relay POST for a submission.
pub fn relay_request(origin: &Url, relay_path: &str, submission: &ContactSubmission) -> Result<Request, Error> {
    let url = origin
        .join(relay_path)
        .map_err(|e| Error::InvalidUrl(format!("{relay_path}: {e}")))?;
    let body = serde_json::to_vec(submission).map_err(|e| Error::InvalidInput(e.to_string()))?;

    Ok(Request {
        method: "POST".into(),
        url,
        mode: RequestMode::SameOrigin,
        headers: vec![("Content-Type".into(), "application/json".into())],
        body: Some(body),
    })
}

/// Parse a relay response body, if it is one.
pub fn parse_relay_response(response: &CachedResponse) -> Option<RelayResponse> {
    serde_json::from_slice(&response.body).ok()
}

/// How a relay reply settles a queued submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Delivered; the submission leaves the queue.
    Accepted,
    /// The relay could not take it now (timeouts, throttling, 5xx).
    Retry(String),
    /// The relay refused it; sending it again cannot succeed.
    Rejected(String),
}

/// Classify a relay response.
///
/// A success status is accepted unless the body is a relay response with
/// `success: false`, which is a rejection like any other 4xx.
pub fn relay_outcome(response: &CachedResponse) -> RelayOutcome {
    let parsed = parse_relay_response(response);
    let reason = || match &parsed {
        Some(RelayResponse { error: Some(error), .. }) => format!("relay returned {}: {error}", response.status),
        _ => format!("relay returned {}", response.status),
    };
    match response.status {
        200..=299 if parsed.as_ref().is_none_or(|r| r.success) => RelayOutcome::Accepted,
        408 | 425 | 429 | 500..=599 => RelayOutcome::Retry(reason()),
        _ => RelayOutcome::Rejected(reason()),
    }
}
