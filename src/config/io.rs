use std::path::Path;

use super::{schema::Config, validate::ConfigError};

pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let path_str = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path_str.clone(),
        source,
    })?;
    let config: Config = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path_str,
        source,
    })?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::load_config;

    #[test]
    fn loads_minimal_config_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[[printers]]\nid = \"office-1\"\nip = \"10.0.0.17\"\n"
        )
        .expect("write config");

        let config = load_config(file.path()).expect("config should load");
        assert_eq!(config.monitor.poll_interval_secs, 120);
        assert_eq!(config.monitor.worker_limit, 8);
        assert_eq!(config.alerts.dedup_window_hours, 24);
        assert_eq!(config.consumables.warning_level, Some(25));
        assert_eq!(config.printers.len(), 1);
        assert_eq!(config.printers[0].id, "office-1");
    }

    #[test]
    fn rejects_malformed_toml() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[monitor\npoll_interval_secs = 60").expect("write config");

        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[monitor]\nworker_limit = 0\n").expect("write config");

        let error = load_config(file.path()).expect_err("validation should fail");
        assert!(error.to_string().contains("worker_limit"));
    }
}
