//! Upstream mail listing
//!
//! [`MailReader`] is the seam between the HTTP layer and whichever
//! provider actually stores the mail. Results come back in the shape of
//! a Mailgun events page so every backend looks the same to clients.

use crate::config::BackendConfig;
use crate::error::Result;
use crate::imap::ImapReader;
use crate::mailgun::MailgunReader;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One page of mail events for a recipient.
///
/// `items` are passed through to API clients untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventList {
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paging: Option<Paging>,
}

/// Pagination links as returned by the Mailgun events API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    pub first: Option<String>,
    pub last: Option<String>,
    pub next: Option<String>,
    pub previous: Option<String>,
}

/// A provider able to list the mail received by one address.
#[async_trait]
pub trait MailReader: Send + Sync {
    /// List mail events for the full `recipient` address.
    async fn recipient_event_list(&self, recipient: &str) -> Result<EventList>;
}

/// Build the reader selected by the configuration.
///
/// # Errors
///
/// Returns an error if the HTTP client for the Mailgun backend cannot
/// be constructed.
pub fn build_reader(backend: &BackendConfig) -> Result<Arc<dyn MailReader>> {
    Ok(match backend {
        BackendConfig::Mailgun(config) => Arc::new(MailgunReader::new(config.clone())?),
        BackendConfig::Imap(config) => Arc::new(ImapReader::new(config.clone())),
    })
}
