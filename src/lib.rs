//! Disposable inbox mail listing API
//!
//! Serves `GET /api/v1/mail/list?recipient=<name>`: the recipient is
//! strictly validated as a mailbox username, joined to the configured
//! inbox domain, and the mail it received is fetched from an upstream
//! provider. Two providers are supported through [`MailReader`]:
//!
//! - [`MailgunReader`] queries the Mailgun events API.
//! - [`ImapReader`] searches an IMAP folder over STARTTLS, e.g. a
//!   catch-all mailbox behind [Proton Bridge](https://proton.me/mail/bridge).
//!
//! The validation rules live in [`validate_username`].

pub mod api;
mod config;
mod connection;
mod error;
mod imap;
mod mailgun;
mod reader;
mod recipient;
mod username;

pub use config::{
    AppConfig, BackendConfig, DEFAULT_DYNAMIC_CACHE_CONTROL, ImapConfig, MailgunConfig,
};
pub use error::{Error, Result};
pub use imap::{EventHeaders, EventMessage, EventStorage, ImapReader, MessageEvent};
pub use mailgun::MailgunReader;
pub use reader::{EventList, MailReader, Paging, build_reader};
pub use recipient::{Recipient, RecipientError, resolve_recipient, strip_domain};
pub use username::{BLOCKED_USERNAMES, InvalidUsername, Rejection, Username, validate_username};
