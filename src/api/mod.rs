//! HTTP routes
//!
//! | Method | Path                 | Handler                 |
//! |--------|----------------------|-------------------------|
//! | GET    | `/api/v1/mail/list`  | mail listing            |
//! | GET    | `/health`            | liveness probe          |

mod error;
mod mail_list;

pub use error::{ApiError, ErrorBody};
pub use mail_list::MailListQuery;

use crate::config::AppConfig;
use crate::reader::MailReader;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use mail_list::mail_list;

/// Shared, read-only state for every request.
pub struct AppState {
    pub reader: Arc<dyn MailReader>,
    pub email_domain: String,
    pub cache_control: HeaderValue,
}

impl AppState {
    /// Build state from loaded configuration and a ready reader.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the cache-control policy is not
    /// a valid header value.
    pub fn new(config: &AppConfig, reader: Arc<dyn MailReader>) -> crate::Result<Self> {
        let cache_control = HeaderValue::from_str(&config.cache_control).map_err(|e| {
            crate::Error::Config(format!("Invalid CACHE_CONTROL_DYNAMIC: {e}"))
        })?;
        Ok(Self {
            reader,
            email_domain: config.email_domain.clone(),
            cache_control,
        })
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("email_domain", &self.email_domain)
            .field("cache_control", &self.cache_control)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS]);

    Router::new()
        .route("/api/v1/mail/list", get(mail_list))
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
