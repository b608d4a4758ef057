//! IMAP-backed mail listing
//!
//! Serves the same listing contract as the Mailgun backend from a plain
//! IMAP folder, e.g. a catch-all mailbox behind Proton Bridge. Each
//! message addressed to the recipient becomes a [`MessageEvent`] shaped
//! like a Mailgun `stored` event.

use crate::config::ImapConfig;
use crate::connection::{self, ImapSession};
use crate::error::{Error, Result};
use crate::reader::{EventList, MailReader};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use futures::StreamExt;
use mailparse::{MailAddr, MailHeader, MailHeaderMap};
use serde::Serialize;
use tracing::{debug, info, warn};

const RECIPIENT_HEADERS: [&str; 3] = ["To", "Cc", "Delivered-To"];

/// A received message, described the way Mailgun describes stored mail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageEvent {
    pub event: &'static str,
    /// Unix time in seconds.
    pub timestamp: f64,
    pub recipient: String,
    pub message: EventMessage,
    pub storage: EventStorage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventMessage {
    pub headers: EventHeaders,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventHeaders {
    pub from: String,
    pub to: String,
    pub subject: String,
    #[serde(rename = "message-id")]
    pub message_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventStorage {
    /// The message UID within the configured folder.
    pub key: String,
}

/// Read-only IMAP reader for a single folder.
#[derive(Debug, Clone)]
pub struct ImapReader {
    config: ImapConfig,
}

impl ImapReader {
    #[must_use]
    pub const fn new(config: ImapConfig) -> Self {
        Self { config }
    }

    /// List the newest messages addressed to `recipient`, newest first.
    ///
    /// SEARCH only narrows the candidates: header keys match substrings,
    /// so each fetched message must carry `recipient` as an exact
    /// `To`, `Cc` or `Delivered-To` address to be listed. At most
    /// `fetch_limit` such messages are returned. Messages that fail to
    /// fetch or parse are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection, SELECT, or SEARCH fails.
    pub async fn list_for_recipient(&self, recipient: &str) -> Result<Vec<MessageEvent>> {
        let mut session = connection::open_folder(&self.config).await?;

        let query = format!("TO \"{}\"", recipient.replace(['\\', '"'], ""));
        let uids = session
            .uid_search(&query)
            .await
            .map_err(|e| Error::Imap(format!("Search failed: {e}")))?;

        let mut candidates: Vec<u32> = uids.into_iter().collect();
        candidates.sort_unstable();

        if candidates.is_empty() || self.config.fetch_limit == 0 {
            session.logout().await.ok();
            return Ok(vec![]);
        }

        info!("Checking {} candidate messages for {}", candidates.len(), recipient);

        let mut events = Vec::new();
        for uid in candidates.into_iter().rev() {
            if events.len() >= self.config.fetch_limit {
                break;
            }
            let fetched = fetch_message(&mut session, uid).await;
            match fetched.and_then(|(raw, date)| parse_event(uid, &raw, date, recipient)) {
                Ok(Some(event)) => events.push(event),
                Ok(None) => debug!("UID {} is not addressed to {}", uid, recipient),
                Err(e) => warn!("Skipping UID {}: {}", uid, e),
            }
        }
        events.sort_by(|a, b| b.timestamp.total_cmp(&a.timestamp));

        session.logout().await.ok();
        Ok(events)
    }
}

#[async_trait]
impl MailReader for ImapReader {
    async fn recipient_event_list(&self, recipient: &str) -> Result<EventList> {
        let items = self
            .list_for_recipient(recipient)
            .await?
            .into_iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Parse(e.to_string()))?;
        Ok(EventList {
            items,
            paging: None,
        })
    }
}

/// Fetch the raw message and its INTERNALDATE.
///
/// The response stream is always read to the end, even after an error,
/// so the session stays in step for the next command.
async fn fetch_message(
    session: &mut ImapSession,
    uid: u32,
) -> Result<(Vec<u8>, Option<DateTime<FixedOffset>>)> {
    let mut raw = None;
    let mut internal_date = None;
    let mut failure = None;
    {
        let mut messages = session
            .uid_fetch(uid.to_string(), "(UID INTERNALDATE BODY.PEEK[])")
            .await
            .map_err(|e| Error::Imap(format!("Fetch failed: {e}")))?;

        while let Some(item) = messages.next().await {
            match item {
                Ok(msg) if raw.is_none() => {
                    raw = msg.body().map(<[u8]>::to_vec);
                    internal_date = msg.internal_date();
                }
                Ok(_) => {}
                Err(e) => {
                    failure.get_or_insert_with(|| Error::Imap(format!("Fetch error: {e}")));
                }
            }
        }
    }

    if let Some(err) = failure {
        return Err(err);
    }
    let raw = raw.ok_or_else(|| Error::Imap(format!("No body found for UID {uid}")))?;
    debug!("Fetched UID {} ({} bytes)", uid, raw.len());
    Ok((raw, internal_date))
}

/// Whether any `To`, `Cc` or `Delivered-To` address equals `recipient`,
/// ignoring ASCII case.
fn is_addressed_to(headers: &[MailHeader<'_>], recipient: &str) -> bool {
    RECIPIENT_HEADERS
        .iter()
        .flat_map(|name| headers.get_all_headers(name))
        .filter_map(|header| mailparse::addrparse_header(header).ok())
        .any(|list| {
            list.iter().any(|addr| match addr {
                MailAddr::Single(single) => single.addr.eq_ignore_ascii_case(recipient),
                MailAddr::Group(group) => group
                    .addrs
                    .iter()
                    .any(|single| single.addr.eq_ignore_ascii_case(recipient)),
            })
        })
}

/// Turn a raw RFC 5322 message into a [`MessageEvent`], or `None` when
/// it is not addressed to `recipient`.
///
/// The `Date` header wins; the server's INTERNALDATE is the fallback.
fn parse_event(
    uid: u32,
    raw: &[u8],
    internal_date: Option<DateTime<FixedOffset>>,
    recipient: &str,
) -> Result<Option<MessageEvent>> {
    let (headers, _) = mailparse::parse_headers(raw).map_err(|e| Error::Parse(e.to_string()))?;
    if !is_addressed_to(&headers, recipient) {
        return Ok(None);
    }
    let header = |name: &str| headers.get_first_value(name).unwrap_or_default();

    let date = headers
        .get_first_value("Date")
        .and_then(|value| DateTime::parse_from_rfc2822(value.trim()).ok())
        .or(internal_date);

    Ok(Some(MessageEvent {
        event: "stored",
        timestamp: date.map_or(0.0, |d| unix_seconds(&d)),
        recipient: recipient.to_string(),
        message: EventMessage {
            headers: EventHeaders {
                from: header("From"),
                to: header("To"),
                subject: header("Subject"),
                message_id: header("Message-ID"),
            },
        },
        storage: EventStorage {
            key: uid.to_string(),
        },
    }))
}

#[allow(clippy::cast_precision_loss)]
fn unix_seconds(date: &DateTime<FixedOffset>) -> f64 {
    date.timestamp_millis() as f64 / 1000.0
}
