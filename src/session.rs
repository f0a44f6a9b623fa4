//! Background inbox polling session.
//!
//! An [`InboxSession`] authenticates once, then runs a supervised task that
//! periodically lists the mailbox, fetches full bodies for messages it has
//! not seen before, and accumulates them for readers. The task is owned by
//! the session and joined on [`InboxSession::stop`].

use crate::models::{Credentials, MessageBody, MessageSummary};
use crate::{Client, Result};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Interval between poll ticks unless overridden by [`PollPolicy`].
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Observable lifecycle state of an [`InboxSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, not yet started.
    Idle,
    /// Exchanging credentials for a token.
    Authenticating,
    /// Polling loop is running.
    Polling,
    /// Stopped, either externally or after a failure.
    Stopped,
}

/// Tuning knobs for the polling loop.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// Sleep between poll ticks.
    pub interval: Duration,
    /// Stop the loop on a connectivity failure instead of retrying at the
    /// next tick.
    pub stop_on_transport_error: bool,
    /// Re-run the credential exchange when the server rejects the session
    /// token mid-poll. When disabled, rejected ticks are logged and skipped.
    pub reauthenticate: bool,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            stop_on_transport_error: false,
            reauthenticate: false,
        }
    }
}

/// Seen-set and accumulated messages, guarded together so every inbox id
/// is in the seen-set and vice versa.
#[derive(Default)]
struct Inbox {
    seen: HashSet<String>,
    messages: Vec<MessageBody>,
}

struct Shared {
    inbox: Mutex<Inbox>,
    state: Mutex<SessionState>,
    stop: AtomicBool,
    wake: Notify,
}

impl Shared {
    fn lock_inbox(&self) -> MutexGuard<'_, Inbox> {
        self.inbox.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> SessionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: SessionState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

/// Authenticated polling session over one mailbox.
pub struct InboxSession {
    client: Arc<Client>,
    policy: PollPolicy,
    shared: Arc<Shared>,
    task: Option<JoinHandle<()>>,
}

impl InboxSession {
    /// Create an idle session for `client` with the given policy.
    pub fn new(client: Arc<Client>, policy: PollPolicy) -> Self {
        Self {
            client,
            policy,
            shared: Arc::new(Shared {
                inbox: Mutex::new(Inbox::default()),
                state: Mutex::new(SessionState::Idle),
                stop: AtomicBool::new(false),
                wake: Notify::new(),
            }),
            task: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Snapshot of the accumulated messages, in first-seen order.
    pub fn messages(&self) -> Vec<MessageBody> {
        self.shared.lock_inbox().messages.clone()
    }

    /// Number of accumulated messages.
    pub fn message_count(&self) -> usize {
        self.shared.lock_inbox().messages.len()
    }

    /// Authenticate and start the polling task.
    ///
    /// On authentication failure the session transitions straight to
    /// [`SessionState::Stopped`] and the error is returned; the polling
    /// loop is never entered. On success the task runs until [`stop`] or,
    /// depending on policy, an unrecoverable transport error.
    ///
    /// [`stop`]: InboxSession::stop
    pub async fn start(&mut self, credentials: Credentials) -> Result<()> {
        if self.task.is_some() {
            self.stop().await;
        }

        self.shared.set_state(SessionState::Authenticating);
        let token = match self
            .client
            .authenticate(&credentials.address, &credentials.password)
            .await
        {
            Ok(token) => token,
            Err(err) => {
                self.shared.set_state(SessionState::Stopped);
                return Err(err);
            }
        };
        info!("authenticated {}", credentials.address);

        self.shared.stop.store(false, Ordering::SeqCst);
        self.shared.set_state(SessionState::Polling);

        let client = Arc::clone(&self.client);
        let shared = Arc::clone(&self.shared);
        let policy = self.policy.clone();
        self.task = Some(tokio::spawn(async move {
            poll_loop(client, shared, policy, token, credentials).await;
        }));
        Ok(())
    }

    /// Signal the polling task to stop and wait for it to finish.
    ///
    /// An in-flight request is allowed to complete; the stop flag is
    /// honored at the top of the next iteration. Accumulated messages are
    /// kept; use [`clear`] to discard them.
    ///
    /// [`clear`]: InboxSession::clear
    pub async fn stop(&mut self) {
        self.shared.stop.store(true, Ordering::SeqCst);
        self.shared.wake.notify_one();
        if let Some(task) = self.task.take() {
            if task.await.is_err() {
                warn!("polling task aborted unexpectedly");
            }
        }
        self.shared.set_state(SessionState::Stopped);
    }

    /// Discard all accumulated messages and the seen-set together.
    pub fn clear(&self) {
        let mut inbox = self.shared.lock_inbox();
        inbox.seen.clear();
        inbox.messages.clear();
    }
}

async fn poll_loop(
    client: Arc<Client>,
    shared: Arc<Shared>,
    policy: PollPolicy,
    mut token: String,
    credentials: Credentials,
) {
    loop {
        // Stop flag is checked once per iteration, before the tick.
        if shared.stop.load(Ordering::SeqCst) {
            break;
        }

        match client.messages(&token).await {
            Ok(summaries) => fetch_unseen(&client, &shared, &token, summaries).await,
            Err(err) if err.is_unauthorized() && policy.reauthenticate => {
                info!("token rejected, re-authenticating {}", credentials.address);
                match client
                    .authenticate(&credentials.address, &credentials.password)
                    .await
                {
                    Ok(fresh) => token = fresh,
                    Err(err) => warn!("re-authentication failed: {err}"),
                }
            }
            Err(err) if err.is_transient() && policy.stop_on_transport_error => {
                warn!("transport failure, stopping poll loop: {err}");
                break;
            }
            Err(err) => warn!("poll tick failed: {err}"),
        }

        tokio::select! {
            _ = tokio::time::sleep(policy.interval) => {}
            _ = shared.wake.notified() => {}
        }
    }
    shared.set_state(SessionState::Stopped);
}

/// Fetch bodies for summaries whose id has not been recorded yet.
///
/// The inbox lock is held only while diffing and appending, never across a
/// network call. A failed fetch leaves the id unrecorded so it is retried
/// on the next tick.
async fn fetch_unseen(
    client: &Client,
    shared: &Shared,
    token: &str,
    summaries: Vec<MessageSummary>,
) {
    let unseen: Vec<MessageSummary> = {
        let inbox = shared.lock_inbox();
        summaries
            .into_iter()
            .filter(|summary| !inbox.seen.contains(&summary.id))
            .collect()
    };

    for summary in unseen {
        match client.message(token, &summary.id).await {
            Ok(body) => {
                let mut inbox = shared.lock_inbox();
                if inbox.seen.insert(body.id.clone()) {
                    debug!("new message {} from {}", body.id, body.from.address);
                    inbox.messages.push(body);
                }
            }
            Err(err) => warn!("failed to fetch message {}: {err}", summary.id),
        }
    }
}
