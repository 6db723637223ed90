mod alerts;
mod app_context;
mod config;
mod dispatch;
mod health;
mod jobs;
mod monitor;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::alerts::{AlertLifecycleManager, InMemoryAlertStore};
use crate::app_context::AppContext;
use crate::config::{Config, load_config};
use crate::dispatch::{Dispatcher, TOPIC_TECHNICIANS};
use crate::health::{FsStorageHealth, HealthAggregator, InProcessCacheHealth};
use crate::jobs::start_background_jobs;
use crate::monitor::{ActiveProbe, PollingScheduler, SnapshotCache, StaticDirectory};

fn init_json_logging() {
    if let Err(error) = tracing_log::LogTracer::init() {
        eprintln!(
            "logging bridge initialization failed (continuing with existing logger): {}",
            error
        );
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .json()
        .with_current_span(false)
        .with_span_list(false)
        .finish();

    if let Err(error) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("global logger initialization failed: {}", error);
    }
}

const CONFIG_PATH: &str = "config.toml";

fn build_directory(config: &Config) -> StaticDirectory {
    if config.simulation.enabled {
        log::info!(
            "simulation_mode_enabled profile={} fleet_size={}",
            config.simulation.profile,
            config.simulation.fleet_size
        );
        return StaticDirectory::simulated(config.simulation.fleet_size);
    }

    let directory = StaticDirectory::from_entries(&config.printers);
    if directory.is_empty() {
        log::warn!("printer_directory_empty hint=add_printers_to_config_or_enable_simulation");
    }
    directory
}

/// Default technician sink: logs every event on the topic. Deployments
/// with a paging or chat integration subscribe their own forwarder.
fn start_technician_log_sink(dispatcher: &Dispatcher) {
    let dispatcher = dispatcher.clone();
    tokio::spawn(async move {
        let mut subscription = dispatcher.subscribe(TOPIC_TECHNICIANS).await;
        while let Some(event) = subscription.receiver.recv().await {
            let payload = serde_json::to_string(&event).unwrap_or_default();
            log::info!("technician_notification payload={}", payload);
        }
    });
}

#[tokio::main]
async fn main() {
    init_json_logging();

    let config: Config = match load_config(CONFIG_PATH) {
        Ok(config) => config,
        Err(error) => {
            log::error!("Configuration error: {}", error);
            return;
        }
    };

    log::info!("Printwatch fleet monitor is starting...");

    let app_context = AppContext::new(config.clone(), CONFIG_PATH);
    let dispatcher = Dispatcher::new();
    let snapshot_cache = Arc::new(SnapshotCache::new());
    let alert_manager = Arc::new(AlertLifecycleManager::new(InMemoryAlertStore::new()));

    let directory = build_directory(&config);
    let probe = Arc::new(ActiveProbe::new(
        config.simulation.enabled,
        &config.simulation.profile,
    ));

    let scheduler = PollingScheduler::new(
        directory,
        probe,
        Arc::clone(&alert_manager),
        dispatcher.clone(),
        Arc::clone(&snapshot_cache),
        Arc::clone(&app_context.runtime_config),
        Arc::clone(&app_context.runtime_update_notify),
        &config.monitor,
    );

    let aggregator = Arc::new(HealthAggregator::new(
        FsStorageHealth::new(config.health.storage_path.clone()),
        InProcessCacheHealth::new(),
        Arc::clone(&snapshot_cache),
        scheduler.run_state_handle(),
        Arc::clone(&app_context.runtime_config),
        config.health.clone(),
    ));

    start_technician_log_sink(&dispatcher);
    start_background_jobs(app_context, dispatcher.clone(), aggregator);

    if let Err(error) = scheduler.start().await {
        log::error!("monitor_start_failed error={}", error);
        return;
    }

    if let Err(error) = tokio::signal::ctrl_c().await {
        log::error!("shutdown_signal_wait_failed error={}", error);
    }
    log::info!("shutdown_signal_received action=stopping_monitor");
    scheduler.stop().await;
}
