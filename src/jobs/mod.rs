use std::sync::Arc;

use crate::app_context::AppContext;
use crate::dispatch::Dispatcher;
use crate::health::{CacheHealth, HealthAggregator, StorageHealth};

mod config_reload;
mod health_report;

pub fn start_background_jobs<S, C>(
    app_context: AppContext,
    dispatcher: Dispatcher,
    aggregator: Arc<HealthAggregator<S, C>>,
) where
    S: StorageHealth,
    C: CacheHealth,
{
    config_reload::start_config_hot_reload_job(app_context.clone());

    if app_context.config.health.enabled {
        health_report::start_health_report_job(app_context, dispatcher, aggregator);
    }
}
