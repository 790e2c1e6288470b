//! StudyVault - headless session host
//!
//! Boots the session from the persisted record, optionally signs in with
//! `STUDYVAULT_EMAIL` / `STUDYVAULT_PASSWORD`, and keeps notification
//! counts and liveness current until Ctrl-C.

use anyhow::{Context, Result};
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studyvault::{
    api::ApiClient,
    config::Config,
    services::{NotificationPoller, SessionContext},
    store::create_store,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studyvault=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting StudyVault session host...");

    // Load configuration
    let config = Config::load_with_env(Path::new("studyvault.yml"))?;
    tracing::info!("Configuration loaded, API at {}", config.api.base_url);

    let store = create_store(&config.storage);
    let client = ApiClient::new(&config.api).context("Failed to build HTTP client")?;
    let session = SessionContext::builder(client, store)
        .navigation(config.navigation.clone())
        .build();

    let phase = session.boot().await?;
    tracing::info!("Session booted: {:?}", phase);

    if let (Ok(email), Ok(password)) = (
        std::env::var("STUDYVAULT_EMAIL"),
        std::env::var("STUDYVAULT_PASSWORD"),
    ) {
        if !session.snapshot().await.is_authenticated() {
            match session.sign_in(&email, &password).await {
                Ok(user) => tracing::info!("Signed in as {}", user.username),
                Err(e) => tracing::warn!("Sign-in failed: {}", e),
            }
        }
    }

    let poller = NotificationPoller::from_config(session.clone(), &config.poller).spawn();

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    tracing::info!("Shutting down...");
    poller.shutdown().await;

    let snapshot = session.snapshot().await;
    tracing::info!(
        "Unseen warnings: {}, unread messages: {}",
        snapshot.unseen_warnings,
        snapshot.unseen_inbox
    );

    Ok(())
}
