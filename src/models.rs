//! Public data models returned by the client.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Address and password pair identifying one disposable mailbox.
///
/// Created at registration time and held for the lifetime of the mailbox.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Full email address, `local@domain`.
    pub address: String,
    /// Account password.
    pub password: String,
}

impl Credentials {
    /// Create credentials from an address and password.
    pub fn new(address: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("address", &self.address)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Registered account as returned by the accounts endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Opaque account identifier, required for deletion.
    pub id: String,
    /// Full email address of the account.
    pub address: String,
}

/// Sender of a message (the `from` object).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sender {
    /// Sender email address.
    pub address: String,
    /// Sender display name, when provided.
    #[serde(default)]
    pub name: Option<String>,
}

/// Summary entry from the message list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSummary {
    /// Stable message identifier.
    pub id: String,
    /// Message sender.
    pub from: Sender,
    /// Subject line.
    #[serde(default)]
    pub subject: String,
    /// Short excerpt of the body.
    #[serde(default)]
    pub intro: String,
}

/// Full message as returned by the single-message endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageBody {
    /// Stable message identifier.
    pub id: String,
    /// Message sender.
    pub from: Sender,
    /// Subject line.
    #[serde(default)]
    pub subject: String,
    /// Short excerpt of the body.
    #[serde(default)]
    pub intro: String,
    /// Plaintext body, when the message carries one.
    #[serde(default)]
    pub text: Option<String>,
    /// HTML body, when the message carries one.
    #[serde(default)]
    pub html: Option<HtmlBody>,
}

/// HTML message content.
///
/// The backend serves either a single string or a list of fragments; both
/// shapes occur in the wild.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HtmlBody {
    /// A single HTML document.
    Single(String),
    /// HTML split into fragments, in document order.
    Fragments(Vec<String>),
}

impl HtmlBody {
    /// The HTML content as one string, concatenating fragments if needed.
    pub fn joined(&self) -> String {
        match self {
            HtmlBody::Single(html) => html.clone(),
            HtmlBody::Fragments(parts) => parts.concat(),
        }
    }
}

/// Hydra collection envelope wrapping list responses.
///
/// Older deployments use the `hydra:member` key, newer ones a bare `member`;
/// a missing key reads as an empty collection.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct Collection<T> {
    #[serde(rename = "hydra:member", alias = "member", default)]
    pub member: Vec<T>,
}

/// One entry of the domains collection.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DomainEntry {
    pub domain: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_accepts_both_envelope_keys() {
        let hydra: Collection<DomainEntry> =
            serde_json::from_str(r#"{"hydra:member": [{"domain": "temp.io"}]}"#).unwrap();
        assert_eq!(hydra.member[0].domain, "temp.io");

        let bare: Collection<DomainEntry> =
            serde_json::from_str(r#"{"member": [{"domain": "temp.io"}]}"#).unwrap();
        assert_eq!(bare.member[0].domain, "temp.io");

        let empty: Collection<DomainEntry> = serde_json::from_str("{}").unwrap();
        assert!(empty.member.is_empty());
    }

    #[test]
    fn html_body_joins_fragments() {
        let single: HtmlBody = serde_json::from_str(r#""<p>hi</p>""#).unwrap();
        assert_eq!(single.joined(), "<p>hi</p>");

        let parts: HtmlBody = serde_json::from_str(r#"["<p>", "hi", "</p>"]"#).unwrap();
        assert_eq!(parts.joined(), "<p>hi</p>");
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let creds = Credentials::new("alice@temp.io", "hunter2");
        let printed = format!("{creds:?}");
        assert!(printed.contains("alice@temp.io"));
        assert!(!printed.contains("hunter2"));
    }
}
