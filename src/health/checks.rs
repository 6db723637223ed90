use std::future::Future;
use std::path::PathBuf;

use chrono::Utc;
use sysinfo::{CpuExt, System, SystemExt};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

#[derive(Debug, Error, Clone)]
#[error("{message}")]
pub struct HealthCheckError {
    message: String,
}

impl HealthCheckError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Verifies the persistence layer end to end with a real write and
/// read-back, not just a connectivity ping.
pub trait StorageHealth: Send + Sync + 'static {
    fn check(&self) -> impl Future<Output = Result<(), HealthCheckError>> + Send;
}

/// Verifies the caching layer with a set/get round trip.
pub trait CacheHealth: Send + Sync + 'static {
    fn check(&self) -> impl Future<Output = Result<(), HealthCheckError>> + Send;
}

/// Filesystem-backed storage check: writes a timestamped probe file
/// under the configured directory, reads it back, and compares.
pub struct FsStorageHealth {
    directory: PathBuf,
}

impl FsStorageHealth {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

impl StorageHealth for FsStorageHealth {
    async fn check(&self) -> Result<(), HealthCheckError> {
        let path = self.directory.join(".health_probe");
        let payload = Utc::now().to_rfc3339();

        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|error| {
                HealthCheckError::new(format!(
                    "create {} failed: {}",
                    self.directory.display(),
                    error
                ))
            })?;
        tokio::fs::write(&path, &payload).await.map_err(|error| {
            HealthCheckError::new(format!("write {} failed: {}", path.display(), error))
        })?;
        let read_back = tokio::fs::read_to_string(&path).await.map_err(|error| {
            HealthCheckError::new(format!("read {} failed: {}", path.display(), error))
        })?;
        if read_back != payload {
            return Err(HealthCheckError::new("read-back mismatch"));
        }
        // Best effort; a leftover probe file is harmless.
        let _ = tokio::fs::remove_file(&path).await;
        Ok(())
    }
}

/// In-process cache check against the same map type the engine uses for
/// its own lookups.
#[derive(Default)]
pub struct InProcessCacheHealth {
    entries: RwLock<std::collections::HashMap<String, String>>,
}

impl InProcessCacheHealth {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheHealth for InProcessCacheHealth {
    async fn check(&self) -> Result<(), HealthCheckError> {
        let key = "health_check".to_string();
        let value = Utc::now().to_rfc3339();
        self.entries.write().await.insert(key.clone(), value.clone());
        let stored = self.entries.read().await.get(&key).cloned();
        if stored.as_deref() != Some(value.as_str()) {
            return Err(HealthCheckError::new("cache round trip mismatch"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResourceSample {
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub used_memory_mb: u64,
    pub total_memory_mb: u64,
}

/// Host resource sampler. Holds one `System` for the process lifetime so
/// successive CPU refreshes measure usage between samples.
pub struct ResourceSampler {
    system: Mutex<System>,
}

impl ResourceSampler {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new_all()),
        }
    }

    pub async fn sample(&self) -> ResourceSample {
        let mut system = self.system.lock().await;
        system.refresh_cpu();
        system.refresh_memory();

        let cpu_percent = system.global_cpu_info().cpu_usage();
        let used = system.used_memory();
        let total = system.total_memory();
        let memory_percent = if total > 0 {
            (used as f32 / total as f32) * 100.0
        } else {
            0.0
        };

        ResourceSample {
            cpu_percent,
            memory_percent,
            used_memory_mb: used / (1024 * 1024),
            total_memory_mb: total / (1024 * 1024),
        }
    }
}

impl Default for ResourceSampler {
    fn default() -> Self {
        Self::new()
    }
}
