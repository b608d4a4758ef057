#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! HTTP server for the disposable inbox mail listing API

use anyhow::Context;
use clap::{Parser, ValueEnum};
use maillist_api::{AppConfig, api, build_reader};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "maillist-server")]
#[command(about = "Serve the recipient mail listing API")]
struct Args {
    /// Address to listen on (overrides BIND_ADDR)
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Upstream mail provider (overrides MAIL_BACKEND)
    #[arg(long, value_enum)]
    backend: Option<Backend>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Backend {
    Mailgun,
    Imap,
}

impl Backend {
    const fn name(self) -> &'static str {
        match self {
            Self::Mailgun => "mailgun",
            Self::Imap => "imap",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let reader = build_reader(&config.backend)?;
    let state = Arc::new(api::AppState::new(&config, reader)?);
    let app = api::router(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(
        "Listing mail for *@{} on {}",
        config.email_domain,
        listener.local_addr()?
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn load_config(args: &Args) -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let backend = args.backend.map(Backend::name);
    let mut config = AppConfig::from_lookup(|key| match (key, backend) {
        ("MAIL_BACKEND", Some(name)) => Some(name.to_string()),
        _ => std::env::var(key).ok(),
    })?;

    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }

    Ok(config)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}
