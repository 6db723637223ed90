mod cache;
mod consumables;
mod directory;
mod probe;
mod scheduler;
mod service;
pub(crate) mod snapshot;
mod transition;

pub use cache::{FleetCounts, SnapshotCache};
pub use consumables::{ConsumableStatus, evaluate_consumable};
pub use directory::{DirectoryError, PrinterDirectory, StaticDirectory};
pub use probe::{ActiveProbe, DeviceProbe, ProbeError, SimulatedProbe, TcpProbe};
pub use scheduler::{MonitoringRunState, PollingScheduler, RunStateHandle, StartError};
pub use snapshot::{ConsumableKind, ConsumableReading, PageCounters, PrinterRef, PrinterSnapshot};
pub use transition::{Transition, detect_transition};

#[cfg(test)]
pub(crate) use probe::MockProbe;
