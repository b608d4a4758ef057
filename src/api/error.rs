//! HTTP error responses
//!
//! Every failure is answered with `{"error": "<message>"}`.

use crate::error::Error;
use crate::recipient::RecipientError;
use crate::username::InvalidUsername;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("No valid `recipient` param found")]
    MissingRecipient,

    /// The reason is kept for logging only; clients see a generic
    /// message.
    #[error("Invalid email")]
    InvalidUsername(#[source] InvalidUsername),

    #[error("{0}")]
    Upstream(#[from] Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingRecipient | Self::InvalidUsername(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RecipientError> for ApiError {
    fn from(err: RecipientError) -> Self {
        match err {
            RecipientError::Missing => Self::MissingRecipient,
            RecipientError::Invalid(invalid) => Self::InvalidUsername(invalid),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        (self.status(), body).into_response()
    }
}
