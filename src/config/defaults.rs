use super::schema::{Alerts, ConsumableDefaults, FleetRatios, Health, Monitor, Simulation};

pub(super) fn default_poll_interval_secs() -> u64 {
    120
}

pub(super) fn default_initial_delay_secs() -> u64 {
    10
}

pub(super) fn default_worker_limit() -> usize {
    8
}

pub(super) fn default_probe_timeout_secs() -> u64 {
    3
}

pub(super) fn default_stop_grace_secs() -> u64 {
    5
}

pub(super) fn default_dedup_window_hours() -> u32 {
    24
}

pub(super) fn default_warning_level() -> Option<u8> {
    Some(25)
}

pub(super) fn default_critical_level() -> Option<u8> {
    Some(10)
}

pub(super) fn default_health_enabled() -> bool {
    true
}

pub(super) fn default_health_interval_secs() -> u64 {
    300
}

pub(super) fn default_storage_slow_ms() -> u64 {
    5000
}

pub(super) fn default_storage_path() -> String {
    "data/health".to_string()
}

pub(super) fn default_probe_host() -> String {
    "example.com".to_string()
}

pub(super) fn default_offline_degraded_ratio() -> f64 {
    0.5
}

pub(super) fn default_offline_unhealthy_ratio() -> f64 {
    0.8
}

pub(super) fn default_error_degraded_ratio() -> f64 {
    0.2
}

pub(super) fn default_error_unhealthy_ratio() -> f64 {
    0.5
}

pub(super) fn default_simulation_profile() -> String {
    "wave".to_string()
}

pub(super) fn default_simulation_fleet_size() -> u16 {
    6
}

impl Default for Monitor {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            initial_delay_secs: default_initial_delay_secs(),
            worker_limit: default_worker_limit(),
            probe_timeout_secs: default_probe_timeout_secs(),
            stop_grace_secs: default_stop_grace_secs(),
        }
    }
}

impl Default for Alerts {
    fn default() -> Self {
        Self {
            dedup_window_hours: default_dedup_window_hours(),
        }
    }
}

impl Default for ConsumableDefaults {
    fn default() -> Self {
        Self {
            warning_level: default_warning_level(),
            critical_level: default_critical_level(),
        }
    }
}

impl Default for Health {
    fn default() -> Self {
        Self {
            enabled: default_health_enabled(),
            interval_secs: default_health_interval_secs(),
            storage_slow_ms: default_storage_slow_ms(),
            storage_path: default_storage_path(),
            probe_host: default_probe_host(),
            fleet: FleetRatios::default(),
        }
    }
}

impl Default for FleetRatios {
    fn default() -> Self {
        Self {
            offline_degraded: default_offline_degraded_ratio(),
            offline_unhealthy: default_offline_unhealthy_ratio(),
            error_degraded: default_error_degraded_ratio(),
            error_unhealthy: default_error_unhealthy_ratio(),
        }
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            enabled: false,
            profile: default_simulation_profile(),
            fleet_size: default_simulation_fleet_size(),
        }
    }
}
