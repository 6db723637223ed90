mod aggregator;
mod checks;
mod model;

pub use aggregator::HealthAggregator;
pub use checks::{CacheHealth, FsStorageHealth, HealthCheckError, InProcessCacheHealth, StorageHealth};
pub use model::{ComprehensiveHealthReport, HealthComponentReport, HealthStatus};
