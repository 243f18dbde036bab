//! Local sync connector.
//!
//! Runs one sync cycle and exits: plan the window from local state,
//! verify cloud credentials, export from Tally, transform, push, then
//! advance the state file. Scheduling (for example three runs a day) is
//! the host's job; the process is safe to re-run at any time.

mod config;

use chrono::Local;
use config::Config;
use dukaan_sync::{
    HttpCloudClient, Orchestrator, RetryPolicy, RunOutcome, SyncConfig, SyncStateStore,
};
use dukaan_tally::HttpExportClient;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config.rust_log);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        tally_url = %config.tally_url,
        cloud_endpoint = %config.cloud_endpoint,
        "Starting sync connector"
    );

    let export = match HttpExportClient::new(config.tally_url.clone()) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Failed to build Tally client: {}", e);
            std::process::exit(1);
        }
    };
    let cloud = match HttpCloudClient::new(config.cloud_endpoint.clone(), config.api_key.clone()) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Failed to build cloud client: {}", e);
            std::process::exit(1);
        }
    };

    let state = SyncStateStore::new(config.state_path.clone(), config.lookback_days);
    let sync_config = SyncConfig {
        max_window_days: config.max_window_days,
        connector_version: env!("CARGO_PKG_VERSION").to_string(),
        retry: RetryPolicy::default(),
    };
    let orchestrator = Orchestrator::new(export, cloud, state, sync_config);

    let today = Local::now().date_naive();
    match orchestrator.run(today).await {
        Ok(RunOutcome::NothingToSync) => {
            info!("Already up to date");
        }
        Ok(RunOutcome::Pushed {
            window,
            ack,
            record_count,
            diagnostics,
        }) => {
            for diagnostic in &diagnostics {
                error!("{}", diagnostic);
            }
            info!(
                from = %window.from,
                to = %window.to,
                records = record_count,
                sales = ack.sales_count,
                purchases = ack.purchase_count,
                "Sync complete"
            );
        }
        Err(e) => {
            error!("Sync failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
