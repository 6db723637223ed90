mod manager;
mod model;
mod store;

pub use manager::{AlertLifecycleManager, AlertOutcome};
pub use model::{AlertKind, AlertRecord, AlertStatus, DedupKey, EntityType, Severity};
pub use store::{AlertStore, AlertStoreError, InMemoryAlertStore};
