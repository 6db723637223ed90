use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::net::lookup_host;
use tokio::sync::RwLock;

use crate::config::{Health, RuntimeConfig};
use crate::monitor::{RunStateHandle, SnapshotCache};

use super::checks::{CacheHealth, ResourceSampler, StorageHealth};
use super::model::{ComprehensiveHealthReport, HealthComponentReport, HealthStatus, roll_up};

const COMPONENT_STORAGE: &str = "Storage";
const COMPONENT_CACHE: &str = "Cache";
const COMPONENT_FLEET: &str = "FleetConnectivity";
const COMPONENT_BACKGROUND: &str = "BackgroundServices";
const COMPONENT_RESOURCES: &str = "Resources";
const COMPONENT_NETWORK: &str = "Network";

const MEMORY_DEGRADED_PERCENT: f32 = 90.0;
const MEMORY_UNHEALTHY_PERCENT: f32 = 97.0;
const CPU_DEGRADED_PERCENT: f32 = 95.0;
const CPU_UNHEALTHY_PERCENT: f32 = 98.0;

/// Runs every component check fresh on demand and rolls the results up
/// into one report. A failing component never aborts the aggregation;
/// it becomes an unhealthy entry in the report instead.
pub struct HealthAggregator<S, C> {
    storage: S,
    cache: C,
    snapshots: Arc<SnapshotCache>,
    run_state: RunStateHandle,
    runtime_config: Arc<RwLock<RuntimeConfig>>,
    settings: Health,
    resources: ResourceSampler,
}

impl<S, C> HealthAggregator<S, C>
where
    S: StorageHealth,
    C: CacheHealth,
{
    pub fn new(
        storage: S,
        cache: C,
        snapshots: Arc<SnapshotCache>,
        run_state: RunStateHandle,
        runtime_config: Arc<RwLock<RuntimeConfig>>,
        settings: Health,
    ) -> Self {
        Self {
            storage,
            cache,
            snapshots,
            run_state,
            runtime_config,
            settings,
            resources: ResourceSampler::new(),
        }
    }

    pub async fn run_comprehensive_check(&self) -> ComprehensiveHealthReport {
        let components = vec![
            self.check_storage().await,
            self.check_cache().await,
            self.check_fleet().await,
            self.check_background_services().await,
            self.check_resources().await,
            self.check_network().await,
        ];

        let overall_status = roll_up(&components);
        ComprehensiveHealthReport {
            timestamp: Utc::now(),
            overall_status,
            recommendations: recommendations(&components),
            components,
        }
    }

    async fn check_storage(&self) -> HealthComponentReport {
        let started = Instant::now();
        let outcome = self.storage.check().await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let report = match outcome {
            Ok(()) if elapsed_ms > self.settings.storage_slow_ms => HealthComponentReport::degraded(
                COMPONENT_STORAGE,
                format!("round trip took {}ms", elapsed_ms),
            ),
            Ok(()) => HealthComponentReport::healthy(COMPONENT_STORAGE),
            Err(error) => HealthComponentReport::unhealthy(COMPONENT_STORAGE, error.to_string()),
        };
        report.with_response_time(elapsed_ms)
    }

    async fn check_cache(&self) -> HealthComponentReport {
        let started = Instant::now();
        let report = match self.cache.check().await {
            Ok(()) => HealthComponentReport::healthy(COMPONENT_CACHE),
            Err(error) => HealthComponentReport::unhealthy(COMPONENT_CACHE, error.to_string()),
        };
        report.with_response_time(started.elapsed().as_millis() as u64)
    }

    async fn check_fleet(&self) -> HealthComponentReport {
        let counts = self.snapshots.fleet_counts().await;
        if counts.total == 0 {
            return HealthComponentReport::degraded(
                COMPONENT_FLEET,
                "no printer snapshots recorded yet",
            );
        }

        let total = counts.total as f64;
        let offline_ratio = counts.offline as f64 / total;
        let error_ratio = counts.errored as f64 / total;
        let ratios = &self.settings.fleet;

        let report = if offline_ratio >= ratios.offline_unhealthy
            || error_ratio >= ratios.error_unhealthy
        {
            HealthComponentReport::unhealthy(
                COMPONENT_FLEET,
                format!(
                    "{}/{} printers offline, {} erroring",
                    counts.offline, counts.total, counts.errored
                ),
            )
        } else if offline_ratio >= ratios.offline_degraded || error_ratio >= ratios.error_degraded {
            HealthComponentReport::degraded(
                COMPONENT_FLEET,
                format!(
                    "{}/{} printers offline, {} erroring",
                    counts.offline, counts.total, counts.errored
                ),
            )
        } else {
            HealthComponentReport::healthy(COMPONENT_FLEET)
        };

        report
            .with_detail("total", counts.total)
            .with_detail("online", counts.online)
            .with_detail("offline", counts.offline)
            .with_detail("errored", counts.errored)
    }

    async fn check_background_services(&self) -> HealthComponentReport {
        let state = self.run_state.snapshot();
        if !state.active {
            return HealthComponentReport::unhealthy(
                COMPONENT_BACKGROUND,
                "monitoring loop is not running",
            );
        }

        let Some(last_cycle_at) = state.last_cycle_at else {
            return HealthComponentReport::degraded(
                COMPONENT_BACKGROUND,
                "no monitoring cycle completed yet",
            );
        };

        let poll_interval_secs = self.runtime_config.read().await.poll_interval_secs;
        let lag_secs = Utc::now()
            .signed_duration_since(last_cycle_at)
            .num_seconds()
            .max(0);

        let report = if lag_secs > (poll_interval_secs * 2) as i64 {
            HealthComponentReport::degraded(
                COMPONENT_BACKGROUND,
                format!("last cycle {}s ago, interval {}s", lag_secs, poll_interval_secs),
            )
        } else {
            HealthComponentReport::healthy(COMPONENT_BACKGROUND)
        };
        report
            .with_detail("lag_secs", lag_secs)
            .with_detail("monitored_count", state.monitored_count)
    }

    async fn check_resources(&self) -> HealthComponentReport {
        let sample = self.resources.sample().await;

        let report = if sample.memory_percent > MEMORY_UNHEALTHY_PERCENT
            || sample.cpu_percent > CPU_UNHEALTHY_PERCENT
        {
            HealthComponentReport::unhealthy(
                COMPONENT_RESOURCES,
                format!(
                    "memory {:.1}%, cpu {:.1}%",
                    sample.memory_percent, sample.cpu_percent
                ),
            )
        } else if sample.memory_percent > MEMORY_DEGRADED_PERCENT
            || sample.cpu_percent > CPU_DEGRADED_PERCENT
        {
            HealthComponentReport::degraded(
                COMPONENT_RESOURCES,
                format!(
                    "memory {:.1}%, cpu {:.1}%",
                    sample.memory_percent, sample.cpu_percent
                ),
            )
        } else {
            HealthComponentReport::healthy(COMPONENT_RESOURCES)
        };

        report
            .with_detail("cpu_percent", sample.cpu_percent.round() as u64)
            .with_detail("memory_percent", sample.memory_percent.round() as u64)
            .with_detail("used_memory_mb", sample.used_memory_mb)
            .with_detail("total_memory_mb", sample.total_memory_mb)
    }

    async fn check_network(&self) -> HealthComponentReport {
        let host = self.settings.probe_host.as_str();
        let started = Instant::now();
        let report = match lookup_host((host, 443)).await {
            Ok(mut addresses) => {
                if addresses.next().is_some() {
                    HealthComponentReport::healthy(COMPONENT_NETWORK)
                } else {
                    HealthComponentReport::degraded(
                        COMPONENT_NETWORK,
                        format!("{} resolved no addresses", host),
                    )
                }
            }
            Err(error) => HealthComponentReport::unhealthy(
                COMPONENT_NETWORK,
                format!("lookup {} failed: {}", host, error),
            ),
        };
        report
            .with_response_time(started.elapsed().as_millis() as u64)
            .with_detail("probe_host", host)
    }
}

fn recommendations(components: &[HealthComponentReport]) -> Vec<String> {
    let mut out = Vec::new();
    for component in components {
        if component.status == HealthStatus::Healthy {
            continue;
        }
        let advice = match (component.component.as_str(), component.status) {
            (COMPONENT_STORAGE, HealthStatus::Unhealthy) => {
                "Verify the storage directory exists and is writable"
            }
            (COMPONENT_STORAGE, _) => "Investigate slow storage round trips",
            (COMPONENT_CACHE, _) => "Restart the service to rebuild the in-process cache",
            (COMPONENT_FLEET, HealthStatus::Unhealthy) => {
                "Check printer network segment and power; most of the fleet is unreachable"
            }
            (COMPONENT_FLEET, _) => "Review offline printers and recent transition alerts",
            (COMPONENT_BACKGROUND, HealthStatus::Unhealthy) => {
                "Start the monitoring engine; no polling is taking place"
            }
            (COMPONENT_BACKGROUND, _) => {
                "Monitoring cycles are overdue; check for slow probes or host contention"
            }
            (COMPONENT_RESOURCES, _) => "Reduce host load or increase available memory",
            (COMPONENT_NETWORK, _) => "Check DNS configuration and outbound connectivity",
            _ => continue,
        };
        out.push(advice.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration as ChronoDuration, Utc};
    use tokio::sync::RwLock;

    use crate::config::{Config, Health, RuntimeConfig};
    use crate::health::checks::{CacheHealth, HealthCheckError, StorageHealth};
    use crate::health::model::HealthStatus;
    use crate::monitor::snapshot::{PrinterRef, PrinterSnapshot};
    use crate::monitor::{RunStateHandle, SnapshotCache};

    use super::HealthAggregator;

    struct OkStorage;
    impl StorageHealth for OkStorage {
        async fn check(&self) -> Result<(), HealthCheckError> {
            Ok(())
        }
    }

    struct OkCache;
    impl CacheHealth for OkCache {
        async fn check(&self) -> Result<(), HealthCheckError> {
            Ok(())
        }
    }

    struct BrokenCache;
    impl CacheHealth for BrokenCache {
        async fn check(&self) -> Result<(), HealthCheckError> {
            Err(HealthCheckError::new("cache round trip mismatch"))
        }
    }

    fn settings() -> Health {
        let config: Config = toml::from_str("").expect("default config");
        Health {
            // Resolvable without leaving the host.
            probe_host: "localhost".to_string(),
            ..config.health
        }
    }

    fn runtime() -> Arc<RwLock<RuntimeConfig>> {
        let config: Config = toml::from_str("").expect("default config");
        Arc::new(RwLock::new(RuntimeConfig::from_config(&config)))
    }

    fn healthy_run_state() -> RunStateHandle {
        let handle = RunStateHandle::default();
        handle.set_active(true);
        handle.record_cycle(Utc::now(), 25, 3);
        handle
    }

    fn component<'a>(
        report: &'a crate::health::ComprehensiveHealthReport,
        name: &str,
    ) -> &'a crate::health::HealthComponentReport {
        report
            .components
            .iter()
            .find(|component| component.component == name)
            .unwrap_or_else(|| panic!("missing component {}", name))
    }

    async fn seed_fleet(cache: &SnapshotCache, online: usize, offline: usize) {
        for n in 0..online {
            let id = format!("printer-on-{}", n);
            let reference = PrinterRef {
                id: id.clone(),
                ip: "10.0.0.1".to_string(),
            };
            *cache.slot(&id).await.lock().await =
                Some(PrinterSnapshot::online(&reference, "ready"));
        }
        for n in 0..offline {
            let id = format!("printer-off-{}", n);
            let reference = PrinterRef {
                id: id.clone(),
                ip: "10.0.0.2".to_string(),
            };
            *cache.slot(&id).await.lock().await =
                Some(PrinterSnapshot::offline_from_error(&reference, "timeout"));
        }
    }

    #[tokio::test]
    async fn failing_cache_is_isolated_to_its_own_component() {
        let snapshots = Arc::new(SnapshotCache::new());
        seed_fleet(&snapshots, 3, 0).await;
        let aggregator = HealthAggregator::new(
            OkStorage,
            BrokenCache,
            snapshots,
            healthy_run_state(),
            runtime(),
            settings(),
        );

        let report = aggregator.run_comprehensive_check().await;

        assert_eq!(report.components.len(), 6);
        let cache = component(&report, "Cache");
        assert_eq!(cache.status, HealthStatus::Unhealthy);
        assert!(cache.error.as_deref().is_some_and(|e| e.contains("mismatch")));
        assert_eq!(component(&report, "Storage").status, HealthStatus::Healthy);
        // Strict roll-up: one unhealthy component dominates.
        assert_eq!(report.overall_status, HealthStatus::Unhealthy);
        assert!(!report.recommendations.is_empty());
    }

    #[tokio::test]
    async fn empty_fleet_degrades_connectivity() {
        let aggregator = HealthAggregator::new(
            OkStorage,
            OkCache,
            Arc::new(SnapshotCache::new()),
            healthy_run_state(),
            runtime(),
            settings(),
        );

        let report = aggregator.run_comprehensive_check().await;
        let fleet = component(&report, "FleetConnectivity");
        assert_eq!(fleet.status, HealthStatus::Degraded);
    }

    #[tokio::test]
    async fn fleet_ratios_drive_connectivity_status() {
        let snapshots = Arc::new(SnapshotCache::new());
        // 4 of 5 offline exceeds the 0.8 unhealthy ratio.
        seed_fleet(&snapshots, 1, 4).await;
        let aggregator = HealthAggregator::new(
            OkStorage,
            OkCache,
            snapshots,
            healthy_run_state(),
            runtime(),
            settings(),
        );

        let report = aggregator.run_comprehensive_check().await;
        let fleet = component(&report, "FleetConnectivity");
        assert_eq!(fleet.status, HealthStatus::Unhealthy);
        assert_eq!(fleet.details["offline"], 4);
    }

    #[tokio::test]
    async fn half_offline_fleet_is_degraded() {
        let snapshots = Arc::new(SnapshotCache::new());
        seed_fleet(&snapshots, 2, 2).await;
        let aggregator = HealthAggregator::new(
            OkStorage,
            OkCache,
            snapshots,
            healthy_run_state(),
            runtime(),
            settings(),
        );

        let report = aggregator.run_comprehensive_check().await;
        let fleet = component(&report, "FleetConnectivity");
        assert_eq!(fleet.status, HealthStatus::Degraded);
    }

    #[tokio::test]
    async fn inactive_engine_is_an_unhealthy_background_service() {
        let aggregator = HealthAggregator::new(
            OkStorage,
            OkCache,
            Arc::new(SnapshotCache::new()),
            RunStateHandle::default(),
            runtime(),
            settings(),
        );

        let report = aggregator.run_comprehensive_check().await;
        let background = component(&report, "BackgroundServices");
        assert_eq!(background.status, HealthStatus::Unhealthy);
        assert_eq!(report.overall_status, HealthStatus::Unhealthy);
    }

    #[tokio::test]
    async fn overdue_cycle_degrades_background_services() {
        let handle = RunStateHandle::default();
        handle.set_active(true);
        // Default interval is 120s; a cycle 10 minutes ago is overdue.
        handle.record_cycle(Utc::now() - ChronoDuration::minutes(10), 25, 3);

        let snapshots = Arc::new(SnapshotCache::new());
        seed_fleet(&snapshots, 2, 0).await;
        let aggregator =
            HealthAggregator::new(OkStorage, OkCache, snapshots, handle, runtime(), settings());

        let report = aggregator.run_comprehensive_check().await;
        let background = component(&report, "BackgroundServices");
        assert_eq!(background.status, HealthStatus::Degraded);
        assert!(background.warning.as_deref().is_some_and(|w| w.contains("overdue") || w.contains("ago")));
    }
}
