use std::sync::Arc;

use tokio::sync::{Notify, RwLock};

use crate::config::{Config, RuntimeConfig};

/// Shared handles every long-lived task gets a clone of. The boot-time
/// `config` is immutable; the hot-reloadable subset lives behind
/// `runtime_config` and changes are announced on the notify handle.
#[derive(Clone)]
pub struct AppContext {
    pub config: Config,
    pub config_path: String,
    pub runtime_config: Arc<RwLock<RuntimeConfig>>,
    pub runtime_update_notify: Arc<Notify>,
}

impl AppContext {
    pub fn new(config: Config, config_path: impl Into<String>) -> Self {
        let runtime_config = RuntimeConfig::from_config(&config);
        Self {
            config,
            config_path: config_path.into(),
            runtime_config: Arc::new(RwLock::new(runtime_config)),
            runtime_update_notify: Arc::new(Notify::new()),
        }
    }

    pub async fn update_runtime_config(&self, runtime_config: RuntimeConfig) {
        *self.runtime_config.write().await = runtime_config;
        // Wakes the scheduler out of its inter-cycle sleep so a shorter
        // interval takes effect immediately.
        self.runtime_update_notify.notify_waiters();
    }
}
