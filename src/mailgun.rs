//! Mailgun events API reader

use crate::config::MailgunConfig;
use crate::error::{Error, Result};
use crate::reader::{EventList, MailReader};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Lists stored mail through `GET /v3/{domain}/events`.
#[derive(Debug, Clone)]
pub struct MailgunReader {
    http: reqwest::Client,
    config: MailgunConfig,
}

impl MailgunReader {
    /// Create a reader with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(config: MailgunConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, config })
    }

    fn events_url(&self) -> String {
        format!("{}/v3/{}/events", self.config.api_url, self.config.domain)
    }
}

#[async_trait]
impl MailReader for MailgunReader {
    async fn recipient_event_list(&self, recipient: &str) -> Result<EventList> {
        let url = self.events_url();
        debug!("Querying Mailgun events at {} for {}", url, recipient);

        let mut query = vec![("recipient", recipient)];
        if !self.config.event.is_empty() {
            query.push(("event", self.config.event.as_str()));
        }

        let response = self
            .http
            .get(&url)
            .basic_auth("api", Some(&self.config.api_key))
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let events: EventList = response.json().await?;
        info!("Mailgun returned {} events for {}", events.items.len(), recipient);
        Ok(events)
    }
}
