//! mail.tm async API client implementation.

use crate::models::{Account, Collection, DomainEntry, MessageBody, MessageSummary};
use crate::transport::{RawResponse, Transport};
use crate::{Error, Result};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const BASE_URL: &str = "https://api.mail.tm";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Async client for the mail.tm temporary email service.
///
/// Use [`Client::new`] for defaults or [`Client::builder`] for custom
/// settings like proxies, timeouts, and an alternate backend URL.
#[derive(Debug, Clone)]
pub struct Client {
    transport: Transport,
    base_url: String,
}

#[derive(Serialize)]
struct CredentialsPayload<'a> {
    address: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

/// Error document returned by the backend on failed requests.
///
/// Depending on endpoint and deployment the human-readable part lives in
/// `detail`, `hydra:description`, or `message`.
#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    detail: Option<String>,
    #[serde(rename = "hydra:description", default)]
    description: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn error_detail(body: &str) -> Option<String> {
    let parsed: ApiError = serde_json::from_str(body).ok()?;
    parsed.detail.or(parsed.description).or(parsed.message)
}

fn status_error(response: RawResponse) -> Error {
    Error::Status {
        status: response.status,
        body: response.body,
    }
}

impl Client {
    /// Create a builder for configuring the client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a new mail.tm client with default settings.
    ///
    /// # Examples
    /// ```no_run
    /// # use mailtm_client::Client;
    /// # fn main() -> Result<(), mailtm_client::Error> {
    /// let client = Client::new()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new() -> Result<Self> {
        ClientBuilder::new().build()
    }

    /// Base URL this client sends requests to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch the first available email domain.
    ///
    /// The server's ordering is kept; there is no client-side preference.
    /// Returns [`Error::NoDomains`] when the list is empty or the response
    /// does not parse.
    ///
    /// # Examples
    /// ```no_run
    /// # use mailtm_client::Client;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), mailtm_client::Error> {
    /// let client = Client::new()?;
    /// let domain = client.available_domain().await?;
    /// println!("{domain}");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn available_domain(&self) -> Result<String> {
        let response = self
            .transport
            .send(Method::GET, &self.endpoint("/domains"), None, None)
            .await?;
        if !response.is_success() {
            return Err(status_error(response));
        }

        let collection: Collection<DomainEntry> =
            serde_json::from_str(&response.body).map_err(|_| Error::NoDomains)?;
        collection
            .member
            .first()
            .map(|entry| entry.domain.clone())
            .ok_or(Error::NoDomains)
    }

    /// Register a new account for `address` with `password`.
    ///
    /// Success is signaled by the response carrying an account identifier.
    /// A rejection because the address is already in use maps to
    /// [`Error::AddressTaken`] so callers can retry with a different name.
    ///
    /// # Examples
    /// ```no_run
    /// # use mailtm_client::Client;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), mailtm_client::Error> {
    /// let client = Client::new()?;
    /// let domain = client.available_domain().await?;
    /// let account = client.register(&format!("alice@{domain}"), "s3cret-pass").await?;
    /// println!("account id: {}", account.id);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn register(&self, address: &str, password: &str) -> Result<Account> {
        let payload = serde_json::to_string(&CredentialsPayload { address, password })
            .map_err(|err| Error::Parse(err.to_string()))?;
        let response = self
            .transport
            .send(Method::POST, &self.endpoint("/accounts"), None, Some(&payload))
            .await?;

        if response.is_success() {
            return serde_json::from_str(&response.body)
                .map_err(|_| Error::Parse("account response missing identifier".into()));
        }

        if response.status == StatusCode::UNPROCESSABLE_ENTITY {
            let taken = error_detail(&response.body).is_some_and(|detail| {
                detail.contains("already used") || detail.contains("already taken")
            });
            if taken {
                return Err(Error::AddressTaken);
            }
        }
        Err(status_error(response))
    }

    /// Exchange credentials for a bearer token.
    ///
    /// Success iff the response carries a `token` field; any other shape is
    /// [`Error::Auth`] with the server-provided detail when available. The
    /// token is not cached; each call performs a fresh exchange.
    pub async fn authenticate(&self, address: &str, password: &str) -> Result<String> {
        let payload = serde_json::to_string(&CredentialsPayload { address, password })
            .map_err(|err| Error::Parse(err.to_string()))?;
        let response = self
            .transport
            .send(Method::POST, &self.endpoint("/token"), None, Some(&payload))
            .await?;

        if response.is_success() {
            return serde_json::from_str::<TokenResponse>(&response.body)
                .map(|t| t.token)
                .map_err(|_| Error::Auth("token missing from response".into()));
        }
        let detail = error_detail(&response.body).unwrap_or_else(|| response.status.to_string());
        Err(Error::Auth(detail))
    }

    /// List the message summaries currently in the inbox.
    ///
    /// An empty inbox and an unparsable success body both yield an empty
    /// list; non-success statuses are errors so callers can observe token
    /// expiry. The list is not guaranteed to contain only new mail.
    pub async fn messages(&self, token: &str) -> Result<Vec<MessageSummary>> {
        let response = self
            .transport
            .send(Method::GET, &self.endpoint("/messages"), Some(token), None)
            .await?;
        if !response.is_success() {
            return Err(status_error(response));
        }

        let collection: Collection<MessageSummary> = match serde_json::from_str(&response.body) {
            Ok(collection) => collection,
            Err(_) => return Ok(Vec::new()),
        };
        Ok(collection.member)
    }

    /// Fetch the full content of one message.
    pub async fn message(&self, token: &str, id: &str) -> Result<MessageBody> {
        let url = self.endpoint(&format!("/messages/{id}"));
        let response = self.transport.send(Method::GET, &url, Some(token), None).await?;

        if response.status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("message {id}")));
        }
        if !response.is_success() {
            return Err(status_error(response));
        }
        serde_json::from_str::<MessageBody>(&response.body)
            .map_err(|err| Error::Parse(format!("message {id}: {err}")))
    }

    /// Resolve the account identifier behind `token` via the `me` resource.
    ///
    /// Needed when the registration result is not at hand, e.g. for a
    /// mailbox attached from stored credentials.
    pub async fn account_id(&self, token: &str) -> Result<String> {
        let response = self
            .transport
            .send(Method::GET, &self.endpoint("/me"), Some(token), None)
            .await?;
        if !response.is_success() {
            return Err(status_error(response));
        }
        serde_json::from_str::<Account>(&response.body)
            .map(|account| account.id)
            .map_err(|_| Error::Parse("me response missing identifier".into()))
    }

    /// Delete the account behind `account_id`.
    ///
    /// Success is an empty/no-content response; anything else is an error
    /// carrying the status and body for diagnostics.
    pub async fn delete_account(&self, token: &str, account_id: &str) -> Result<()> {
        let url = self.endpoint(&format!("/accounts/{account_id}"));
        let response = self
            .transport
            .send(Method::DELETE, &url, Some(token), None)
            .await?;

        if response.status == StatusCode::NO_CONTENT
            || (response.is_success() && response.body.trim().is_empty())
        {
            return Ok(());
        }
        Err(status_error(response))
    }
}

/// Builder for configuring a mail.tm client.
///
/// Start with [`Client::builder`] to override defaults.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    base_url: String,
    timeout: Duration,
    proxy: Option<String>,
    user_agent: Option<String>,
    danger_accept_invalid_certs: bool,
}

impl ClientBuilder {
    /// Create a new builder with default settings.
    ///
    /// Defaults:
    /// - Official mail.tm API endpoint
    /// - 30 second request timeout
    /// - No proxy
    /// - reqwest's default user agent
    /// - Strict TLS validation
    pub fn new() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            proxy: None,
            user_agent: None,
            danger_accept_invalid_certs: false,
        }
    }

    /// Override the backend base URL.
    ///
    /// Useful for testing against a local mock server.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a proxy URL (e.g., "http://127.0.0.1:8080").
    ///
    /// This uses reqwest's proxy support for all requests.
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Override the default user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Accept invalid TLS certificates (default: false).
    ///
    /// Only useful behind intercepting proxies during debugging.
    pub fn danger_accept_invalid_certs(mut self, value: bool) -> Self {
        self.danger_accept_invalid_certs = value;
        self
    }

    /// Build the client.
    ///
    /// Constructs the underlying HTTP client; no network request is made.
    pub fn build(self) -> Result<Client> {
        let mut builder = reqwest::Client::builder().timeout(self.timeout);

        if self.danger_accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(proxy_url) = &self.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }
        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        let http = builder.build()?;
        Ok(Client {
            transport: Transport::new(http),
            base_url: self.base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
