//! `GET /api/v1/mail/list`

use super::AppState;
use super::error::ApiError;
use crate::recipient::resolve_recipient;
use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error};

#[derive(Debug, Default, Deserialize)]
pub struct MailListQuery {
    /// Bare username or full address on the configured domain.
    pub recipient: Option<String>,
}

/// List the mail received by `recipient`.
///
/// A query string that cannot be decoded, e.g. a repeated `recipient`,
/// is answered like a missing one.
pub(super) async fn mail_list(
    State(state): State<Arc<AppState>>,
    query: Result<Query<MailListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query.map_err(|rejection| {
        debug!("Unreadable query string: {}", rejection.body_text());
        ApiError::MissingRecipient
    })?;

    let recipient = resolve_recipient(query.recipient.as_deref(), &state.email_domain)
        .map_err(ApiError::from)
        .inspect_err(|e| {
            if let ApiError::InvalidUsername(invalid) = e {
                debug!("Rejected recipient {:?}: {}", query.recipient, invalid);
            }
        })?;

    let events = state
        .reader
        .recipient_event_list(recipient.address())
        .await
        .inspect_err(|e| {
            error!("Error getting list of messages for \"{}\": {}", recipient.username(), e);
        })?;

    Ok((
        [(header::CACHE_CONTROL, state.cache_control.clone())],
        Json(events.items),
    ))
}
