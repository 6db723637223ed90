use thiserror::Error;

use super::schema::Config;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Validation(String),
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.monitor.poll_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "monitor.poll_interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.monitor.worker_limit == 0 {
            return Err(ConfigError::Validation(
                "monitor.worker_limit must be greater than 0".to_string(),
            ));
        }
        if self.monitor.probe_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "monitor.probe_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.monitor.stop_grace_secs == 0 {
            return Err(ConfigError::Validation(
                "monitor.stop_grace_secs must be greater than 0".to_string(),
            ));
        }
        if self.alerts.dedup_window_hours == 0 {
            return Err(ConfigError::Validation(
                "alerts.dedup_window_hours must be greater than 0".to_string(),
            ));
        }

        validate_level("consumables.warning_level", self.consumables.warning_level)?;
        validate_level(
            "consumables.critical_level",
            self.consumables.critical_level,
        )?;
        if let (Some(warning), Some(critical)) = (
            self.consumables.warning_level,
            self.consumables.critical_level,
        ) && warning <= critical
        {
            return Err(ConfigError::Validation(
                "consumables.warning_level must be greater than consumables.critical_level"
                    .to_string(),
            ));
        }

        if self.health.interval_secs == 0 {
            return Err(ConfigError::Validation(
                "health.interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.health.storage_slow_ms == 0 {
            return Err(ConfigError::Validation(
                "health.storage_slow_ms must be greater than 0".to_string(),
            ));
        }
        if self.health.storage_path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "health.storage_path must not be empty".to_string(),
            ));
        }
        if self.health.probe_host.trim().is_empty() {
            return Err(ConfigError::Validation(
                "health.probe_host must not be empty".to_string(),
            ));
        }

        validate_ratio("health.fleet.offline_degraded", self.health.fleet.offline_degraded)?;
        validate_ratio(
            "health.fleet.offline_unhealthy",
            self.health.fleet.offline_unhealthy,
        )?;
        validate_ratio("health.fleet.error_degraded", self.health.fleet.error_degraded)?;
        validate_ratio("health.fleet.error_unhealthy", self.health.fleet.error_unhealthy)?;
        if self.health.fleet.offline_degraded > self.health.fleet.offline_unhealthy {
            return Err(ConfigError::Validation(
                "health.fleet.offline_degraded must not exceed offline_unhealthy".to_string(),
            ));
        }
        if self.health.fleet.error_degraded > self.health.fleet.error_unhealthy {
            return Err(ConfigError::Validation(
                "health.fleet.error_degraded must not exceed error_unhealthy".to_string(),
            ));
        }

        if self.simulation.profile.trim().is_empty() {
            return Err(ConfigError::Validation(
                "simulation.profile must not be empty".to_string(),
            ));
        }
        if self.simulation.enabled && self.simulation.fleet_size == 0 {
            return Err(ConfigError::Validation(
                "simulation.fleet_size must be greater than 0 when simulation is enabled"
                    .to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for printer in &self.printers {
            if printer.id.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "printers entries must have a non-empty id".to_string(),
                ));
            }
            if printer.ip.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "printer {} must have a non-empty ip",
                    printer.id
                )));
            }
            if !seen.insert(printer.id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate printer id: {}",
                    printer.id
                )));
            }
        }

        Ok(())
    }
}

fn validate_level(field: &str, value: Option<u8>) -> Result<(), ConfigError> {
    if let Some(level) = value
        && level > 100
    {
        return Err(ConfigError::Validation(format!(
            "{} must be between 0 and 100",
            field
        )));
    }
    Ok(())
}

fn validate_ratio(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_nan() || !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::Validation(format!(
            "{} must be between 0 and 1",
            field
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::config::{Config, PrinterEntry};

    fn base_config() -> Config {
        toml::from_str("").expect("empty config should deserialize")
    }

    #[test]
    fn default_config_is_valid() {
        base_config().validate().expect("defaults should validate");
    }

    #[test]
    fn rejects_inverted_consumable_thresholds() {
        let mut config = base_config();
        config.consumables.warning_level = Some(5);
        config.consumables.critical_level = Some(10);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_duplicate_printer_ids() {
        let mut config = base_config();
        config.printers = vec![
            PrinterEntry {
                id: "p1".to_string(),
                ip: "10.0.0.1".to_string(),
            },
            PrinterEntry {
                id: "p1".to_string(),
                ip: "10.0.0.2".to_string(),
            },
        ];
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_fleet_ratio() {
        let mut config = base_config();
        config.health.fleet.offline_unhealthy = 1.4;
        assert!(config.validate().is_err());
    }
}
