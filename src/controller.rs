//! Mailbox lifecycle orchestration.
//!
//! [`SessionController`] drives the full sequence a presentation layer
//! needs: resolve a username, fetch a domain, register, authenticate, and
//! poll in the background; then, in reverse, delete the account and discard
//! local state.

use crate::models::{Credentials, MessageBody};
use crate::session::{InboxSession, PollPolicy, SessionState};
use crate::{Client, Error, Result};
use log::{info, warn};
use rand::Rng;
use rand::distr::Alphanumeric;
use regex::Regex;
use std::sync::{Arc, OnceLock};

const REGISTER_RETRIES: usize = 5;
const PASSWORD_LEN: usize = 16;

/// How the controller picks the local part of a new address.
#[derive(Debug, Clone)]
pub enum UsernamePolicy {
    /// Generate a random username, retrying on collision.
    Random,
    /// Use the given name; it must satisfy the naming rules.
    Custom(String),
}

/// Mailbox names: at least three characters, leading letter, then letters,
/// digits, `.`, `_`, or `-`.
fn username_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9._-]{2,}$").unwrap())
}

fn is_valid_username(name: &str) -> bool {
    username_pattern().is_match(name)
}

fn random_username() -> String {
    let mut rng = rand::rng();
    format!("user{}", rng.random_range(1000..10000))
}

fn random_password() -> String {
    let mut rng = rand::rng();
    (0..PASSWORD_LEN)
        .map(|_| rng.sample(Alphanumeric) as char)
        .collect()
}

/// Orchestrates one disposable mailbox from creation to teardown.
///
/// All inbox reads go through snapshot accessors; the polling itself runs
/// on a background task owned by the inner [`InboxSession`].
pub struct SessionController {
    client: Arc<Client>,
    session: InboxSession,
    credentials: Option<Credentials>,
    account_id: Option<String>,
    register_retries: usize,
}

impl SessionController {
    /// Create a controller with the default polling policy.
    pub fn new(client: Client) -> Self {
        Self::with_policy(client, PollPolicy::default())
    }

    /// Create a controller with a custom polling policy.
    pub fn with_policy(client: Client, policy: PollPolicy) -> Self {
        let client = Arc::new(client);
        Self {
            session: InboxSession::new(Arc::clone(&client), policy),
            client,
            credentials: None,
            account_id: None,
            register_retries: REGISTER_RETRIES,
        }
    }

    /// Address of the active mailbox, if any.
    pub fn address(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.address.as_str())
    }

    /// Lifecycle state of the inbox session.
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Snapshot of the accumulated messages, in first-seen order.
    pub fn messages(&self) -> Vec<MessageBody> {
        self.session.messages()
    }

    /// Number of accumulated messages.
    pub fn message_count(&self) -> usize {
        self.session.message_count()
    }

    /// Create a mailbox and start polling it.
    ///
    /// Resolves a username per `policy`, fetches the first available
    /// domain, generates a password, and registers `username@domain`. Under
    /// the [`UsernamePolicy::Random`] policy a taken address is retried
    /// with a fresh name a bounded number of times; a custom name is never
    /// retried. Returns the registered address once polling is underway.
    pub async fn start(&mut self, policy: UsernamePolicy) -> Result<String> {
        let (mut username, random) = match policy {
            UsernamePolicy::Custom(name) => {
                if !is_valid_username(&name) {
                    return Err(Error::InvalidUsername(name));
                }
                (name, false)
            }
            UsernamePolicy::Random => (random_username(), true),
        };

        let domain = self.client.available_domain().await?;
        let password = random_password();

        for attempt in 1..=self.register_retries {
            let address = format!("{username}@{domain}");
            match self.client.register(&address, &password).await {
                Ok(account) => {
                    info!("registered {address}");
                    let credentials = Credentials::new(address.clone(), password);
                    self.account_id = Some(account.id);
                    // Kept even if the session fails to start: the account
                    // exists remotely and teardown must still reach it.
                    self.credentials = Some(credentials.clone());
                    self.session.start(credentials).await?;
                    return Ok(address);
                }
                Err(Error::AddressTaken) if random => {
                    warn!(
                        "address {address} already taken, retrying ({attempt}/{})",
                        self.register_retries
                    );
                    username = random_username();
                }
                Err(err) => return Err(err),
            }
        }
        Err(Error::AddressTaken)
    }

    /// Adopt an already-registered mailbox and start polling it.
    ///
    /// No registration is performed; the account identifier is resolved
    /// lazily on [`teardown`] via the `me` resource.
    ///
    /// [`teardown`]: SessionController::teardown
    pub async fn attach(
        &mut self,
        address: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<()> {
        let credentials = Credentials::new(address, password);
        self.account_id = None;
        self.session.start(credentials.clone()).await?;
        self.credentials = Some(credentials);
        Ok(())
    }

    /// Stop polling and discard all local mailbox state.
    ///
    /// The remote account is left alone; use [`teardown`] to delete it.
    ///
    /// [`teardown`]: SessionController::teardown
    pub async fn stop(&mut self) {
        self.session.stop().await;
        self.session.clear();
        self.credentials = None;
        self.account_id = None;
    }

    /// Delete the remote account, then stop and discard local state.
    ///
    /// Local state is discarded whether or not the deletion succeeds; the
    /// deletion outcome is returned for the caller to report.
    pub async fn teardown(&mut self) -> Result<()> {
        let result = self.delete_remote().await;
        self.stop().await;
        result
    }

    async fn delete_remote(&mut self) -> Result<()> {
        let credentials = self.credentials.clone().ok_or(Error::NoMailbox)?;
        // Fresh exchange; the polling task's token never crosses this
        // boundary.
        let token = self
            .client
            .authenticate(&credentials.address, &credentials.password)
            .await?;
        let account_id = match &self.account_id {
            Some(id) => id.clone(),
            None => self.client.account_id(&token).await?,
        };
        info!("deleting account {account_id}");
        self.client.delete_account(&token, &account_id).await
    }
}
