use std::sync::Arc;

use tokio::time::Duration;

use crate::app_context::AppContext;
use crate::dispatch::{Dispatcher, EngineEvent, TOPIC_HEALTH};
use crate::health::{CacheHealth, HealthAggregator, HealthStatus, StorageHealth};

async fn publish_health_report<S, C>(
    aggregator: &HealthAggregator<S, C>,
    dispatcher: &Dispatcher,
) -> HealthStatus
where
    S: StorageHealth,
    C: CacheHealth,
{
    let report = aggregator.run_comprehensive_check().await;
    let status = report.overall_status;

    if status == HealthStatus::Healthy {
        tracing::info!(target: "health", module = "health", status = %status, "health_report");
    } else {
        let failing: Vec<&str> = report
            .components
            .iter()
            .filter(|component| component.status != HealthStatus::Healthy)
            .map(|component| component.component.as_str())
            .collect();
        log::warn!(
            "health_report_not_healthy status={} failing_components={}",
            status,
            failing.join(",")
        );
    }

    dispatcher.publish(TOPIC_HEALTH, EngineEvent::HealthReport { report }).await;
    status
}

pub(super) fn start_health_report_job<S, C>(
    app_context: AppContext,
    dispatcher: Dispatcher,
    aggregator: Arc<HealthAggregator<S, C>>,
) where
    S: StorageHealth,
    C: CacheHealth,
{
    tokio::spawn(async move {
        let interval = Duration::from_secs(app_context.config.health.interval_secs.max(1));
        loop {
            tokio::time::sleep(interval).await;
            publish_health_report(aggregator.as_ref(), &dispatcher).await;
        }
    });
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use tokio::sync::RwLock;

    use crate::config::{Config, Health, RuntimeConfig};
    use crate::dispatch::{Dispatcher, EngineEvent, TOPIC_HEALTH};
    use crate::health::{FsStorageHealth, HealthAggregator, InProcessCacheHealth};
    use crate::monitor::{RunStateHandle, SnapshotCache};

    use super::publish_health_report;

    #[tokio::test]
    async fn report_is_published_to_the_health_topic() {
        let config: Config = toml::from_str("").expect("default config");
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = Health {
            storage_path: dir.path().to_string_lossy().to_string(),
            probe_host: "localhost".to_string(),
            ..config.health.clone()
        };
        let run_state = RunStateHandle::default();
        run_state.set_active(true);
        run_state.record_cycle(Utc::now(), 10, 1);
        let aggregator = HealthAggregator::new(
            FsStorageHealth::new(dir.path()),
            InProcessCacheHealth::new(),
            Arc::new(SnapshotCache::new()),
            run_state,
            Arc::new(RwLock::new(RuntimeConfig::from_config(&config))),
            settings,
        );

        let dispatcher = Dispatcher::new();
        let mut subscription = dispatcher.subscribe(TOPIC_HEALTH).await;

        publish_health_report(&aggregator, &dispatcher).await;

        let event = subscription.receiver.try_recv().expect("event");
        let EngineEvent::HealthReport { report } = event else {
            panic!("expected a health report event");
        };
        assert_eq!(report.components.len(), 6);
    }
}
