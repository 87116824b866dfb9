//! Hydroalert runner
//!
//! Run with: cargo run
//!
//! Executes one run and exits, which suits an external scheduler. Set
//! HYDROALERT_INTERVAL_SECS to keep the process alive and run on a fixed
//! interval instead.
//!
//! Environment variables:
//! - HYDROALERT_ALERTS_FILE: Alert definitions (default: alerts.json)
//! - HYDROALERT_ALERTS_PARTITION: Partition to read (default: CONFIG#ALERTS)
//! - HYDROALERT_AUDIT_FILE: Audit trail, JSON Lines (default: audit.jsonl)
//! - HYDROALERT_CREDENTIAL_REF: Env var holding the bot token (no default)
//! - HYDROALERT_SOURCE_URL: Measurement base URL (default: IMGW hydro endpoint)
//! - HYDROALERT_FETCH_TIMEOUT_MS: Per-fetch timeout (default: 10000)
//! - HYDROALERT_CHANNEL_API_URL: Bot API base URL (default: https://api.telegram.org)
//! - HYDROALERT_SEND_TIMEOUT_MS: Per-send timeout (default: 10000)
//! - HYDROALERT_AUDIT_RETENTION_DAYS: Expiry for audit records (default: none)
//! - HYDROALERT_DISPLAY_UTC_OFFSET_MINUTES: Local time offset (default: 60)
//! - HYDROALERT_INTERVAL_SECS: Built-in schedule (default: run once)
//! - RUST_LOG: Log level (default: info)

use std::sync::Arc;

use hydroalert::audit::AuditRecorder;
use hydroalert::config::AppConfig;
use hydroalert::measurement::{MeasurementClient, MeasurementConfig};
use hydroalert::notify::{CredentialCache, EnvSecretSource, TelegramDispatcher};
use hydroalert::orchestrator::RunOrchestrator;
use hydroalert::store::FileStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hydroalert=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    tracing::info!("Hydroalert configuration:");
    tracing::info!("  Alerts: {} (partition {})", config.alerts_file.display(), config.alerts_partition);
    tracing::info!("  Audit trail: {}", config.audit_file.display());
    tracing::info!("  Measurement source: {}", config.source_url);
    tracing::info!("  Fetch timeout: {} ms", config.fetch_timeout.as_millis());
    tracing::info!("  Send timeout: {} ms", config.send_timeout.as_millis());
    match &config.credential_ref {
        Some(reference) => tracing::info!("  Credential: from ${}", reference),
        None => tracing::warn!("  Credential: NOT CONFIGURED, notifications will fail"),
    }
    match config.audit_retention_days {
        Some(days) => tracing::info!("  Audit retention: {} days", days),
        None => tracing::info!("  Audit retention: unlimited"),
    }

    let orchestrator = build_orchestrator(&config)?;

    let Some(interval) = config.interval else {
        let summary = orchestrator.run().await?;
        tracing::info!(processed = summary.processed(), "Single run finished");
        return Ok(());
    };

    tracing::info!("  Schedule: every {} seconds", interval.as_secs());
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = orchestrator.run().await {
                    tracing::error!(error = %e, "Run failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}

fn build_orchestrator(config: &AppConfig) -> Result<RunOrchestrator, Box<dyn std::error::Error>> {
    let store = Arc::new(
        FileStore::new(&config.alerts_file, &config.audit_file)
            .with_partition(config.alerts_partition.clone()),
    );

    let source = Arc::new(MeasurementClient::new(
        MeasurementConfig::new(config.source_url.clone())
            .with_timeout(config.fetch_timeout)
            .with_source_offset(config.display_offset()),
    )?);

    let credentials = match &config.credential_ref {
        Some(reference) => CredentialCache::new(Arc::new(EnvSecretSource), reference.clone()),
        None => CredentialCache::unconfigured(),
    };
    let channel = Arc::new(TelegramDispatcher::with_options(
        config.channel_api_url.clone(),
        config.send_timeout,
        Arc::new(credentials),
    )?);

    let mut recorder = AuditRecorder::new(store.clone());
    if let Some(retention) = config.audit_retention() {
        recorder = recorder.with_retention(retention);
    }

    Ok(RunOrchestrator::new(store, source, channel, recorder).with_display_offset(config.display_offset()))
}
