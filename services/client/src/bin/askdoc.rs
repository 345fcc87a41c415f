//! services/client/src/bin/askdoc.rs

use std::sync::Arc;
use std::time::Duration;

use client_lib::{
    adapters::{rest::RestApi, vault::FileTokenVault},
    config::Config,
    error::ClientError,
    stores::{DocumentStore, SessionStore},
    tui,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    // Logs go to a file: stdout belongs to the TUI.
    let config = Config::from_env()?;
    std::fs::create_dir_all(&config.log_dir)?;
    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "askdoc.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .init();
    info!("Configuration loaded. Starting client...");

    // --- 2. Initialize Adapters ---
    let vault = Arc::new(FileTokenVault::new(config.token_file.clone()));
    let api = Arc::new(RestApi::new(
        config.api_base.clone(),
        Duration::from_secs(config.http_timeout_secs),
        vault.clone(),
    )?);

    // --- 3. Build the Shared Stores ---
    let session = Arc::new(SessionStore::new(
        api.clone(),
        vault,
        api.session_expiry(),
    ));
    session.bootstrap()?;
    let documents = Arc::new(DocumentStore::new(api));

    // --- 4. Run the TUI ---
    let terminal = ratatui::init();
    let result = tui::run(terminal, session, documents).await;
    ratatui::restore();
    result
}
