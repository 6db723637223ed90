use serde::Deserialize;

use super::defaults::*;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub monitor: Monitor,
    #[serde(default)]
    pub alerts: Alerts,
    #[serde(default)]
    pub consumables: ConsumableDefaults,
    #[serde(default)]
    pub health: Health,
    #[serde(default)]
    pub simulation: Simulation,
    #[serde(default)]
    pub printers: Vec<PrinterEntry>,
}

/// Subset of the config that may change at runtime through hot reload.
/// The scheduler re-reads it at the top of every cycle.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub poll_interval_secs: u64,
    pub probe_timeout_secs: u64,
    pub worker_limit: usize,
    pub dedup_window_hours: u32,
    pub consumables: ConsumableDefaults,
}

impl RuntimeConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_interval_secs: config.monitor.poll_interval_secs,
            probe_timeout_secs: config.monitor.probe_timeout_secs,
            worker_limit: config.monitor.worker_limit,
            dedup_window_hours: config.alerts.dedup_window_hours,
            consumables: config.consumables.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Monitor {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,
    #[serde(default = "default_worker_limit")]
    pub worker_limit: usize,
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    #[serde(default = "default_stop_grace_secs")]
    pub stop_grace_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Alerts {
    #[serde(default = "default_dedup_window_hours")]
    pub dedup_window_hours: u32,
}

/// Fallback thresholds applied when a consumable reading does not carry
/// its own warning/critical levels.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsumableDefaults {
    #[serde(default = "default_warning_level")]
    pub warning_level: Option<u8>,
    #[serde(default = "default_critical_level")]
    pub critical_level: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Health {
    #[serde(default = "default_health_enabled")]
    pub enabled: bool,
    #[serde(default = "default_health_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_storage_slow_ms")]
    pub storage_slow_ms: u64,
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
    #[serde(default = "default_probe_host")]
    pub probe_host: String,
    #[serde(default)]
    pub fleet: FleetRatios,
}

/// Fraction-of-fleet thresholds for the connectivity health component.
#[derive(Debug, Clone, Deserialize)]
pub struct FleetRatios {
    #[serde(default = "default_offline_degraded_ratio")]
    pub offline_degraded: f64,
    #[serde(default = "default_offline_unhealthy_ratio")]
    pub offline_unhealthy: f64,
    #[serde(default = "default_error_degraded_ratio")]
    pub error_degraded: f64,
    #[serde(default = "default_error_unhealthy_ratio")]
    pub error_unhealthy: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Simulation {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_simulation_profile")]
    pub profile: String,
    #[serde(default = "default_simulation_fleet_size")]
    pub fleet_size: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrinterEntry {
    pub id: String,
    pub ip: String,
}
