//! # mail.tm Client
//! Asynchronous client for the mail.tm disposable email REST API, providing account
//! registration, bearer-token authentication, deduplicated background inbox polling, and
//! account teardown via [`Client`], [`InboxSession`], and [`SessionController`].
//!
//! ## Audience and uses
//! For Rust developers who need throwaway addresses in integration tests, demos, or
//! automation scripts without running mail infrastructure: create a mailbox with
//! [`SessionController::start`], read arriving [`MessageBody`] snapshots while the
//! background poller runs, then delete the account with [`SessionController::teardown`].
//!
//! ## Runtime requirements
//! Async-only; run inside a Tokio (v1) runtime. HTTP calls use `reqwest`, and the polling
//! loop is a supervised Tokio task joined on stop.
//!
//! ## Out of scope
//! Not a general-purpose mail client, SMTP sender, or durable mailbox, and no rendering of
//! message content. It only proxies the mail.tm service and inherits its availability and
//! retention limits; presentation layers consume the message snapshots this crate exposes.
//!
//! ## Errors
//! Connectivity failures surface as [`Error::Http`]; server-signaled conditions map to
//! typed variants ([`Error::AddressTaken`], [`Error::Auth`], [`Error::NoDomains`]) and
//! unexpected statuses to [`Error::Status`]. Malformed JSON never crashes a call; it is a
//! [`Error::Parse`] value or, for list endpoints, an empty collection. The crate-wide
//! [`Result`] alias wraps these errors.
//!
//! ## Example
//! ```no_run
//! use mailtm_client::{Client, SessionController, UsernamePolicy};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mailtm_client::Error> {
//!     let client = Client::new()?;
//!     let mut controller = SessionController::new(client);
//!
//!     let address = controller.start(UsernamePolicy::Random).await?;
//!     println!("Mailbox ready: {address}");
//!
//!     tokio::time::sleep(Duration::from_secs(30)).await;
//!     for msg in controller.messages() {
//!         println!("From: {}, Subject: {}", msg.from.address, msg.subject);
//!     }
//!
//!     controller.teardown().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod controller;
pub mod error;
pub mod models;
pub mod session;
pub mod transport;

pub use client::{Client, ClientBuilder};
pub use controller::{SessionController, UsernamePolicy};
pub use error::Error;
pub use models::{Account, Credentials, HtmlBody, MessageBody, MessageSummary, Sender};
pub use session::{DEFAULT_POLL_INTERVAL, InboxSession, PollPolicy, SessionState};
pub use transport::{RawResponse, Transport};

/// Result type alias for mail.tm client operations.
///
/// This is equivalent to `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
