//! Single request/response exchange against the REST backend.

use crate::error::Result;
use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;

/// Raw HTTP outcome: status code plus body text.
///
/// 4xx/5xx statuses are normal responses here; only network-level failures
/// surface as errors from [`Transport::send`].
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code of the response.
    pub status: reqwest::StatusCode,
    /// Response body as text, possibly empty.
    pub body: String,
}

impl RawResponse {
    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Thin wrapper around one `reqwest::Client`.
///
/// The inner client is the process-scoped HTTP resource; it is created once
/// by [`crate::ClientBuilder`] and owns connection pooling and TLS state for
/// every request the crate makes.
#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
}

impl Transport {
    /// Wrap an already-configured `reqwest::Client`.
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Perform one HTTP exchange.
    ///
    /// Adds `Authorization: Bearer <token>` when a token is supplied and
    /// `Content-Type: application/json` when a body is supplied. Does not
    /// retry; retry policy belongs to the caller.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        token: Option<&str>,
        body: Option<&str>,
    ) -> Result<RawResponse> {
        let mut request = self.http.request(method.clone(), url);

        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_owned());
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!("{method} {url} -> {status}");

        Ok(RawResponse { status, body })
    }
}
