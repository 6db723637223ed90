use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use super::snapshot::PrinterSnapshot;

/// Per-printer online/offline/error tally used by the fleet health check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FleetCounts {
    pub total: usize,
    pub online: usize,
    pub offline: usize,
    pub errored: usize,
}

/// Last known snapshot per printer, the engine's only shared mutable
/// state. Each printer gets its own slot lock, so one worker holding a
/// slot through its whole evaluation chain serializes writers for that
/// entity without blocking the rest of the fleet.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    slots: RwLock<HashMap<String, Arc<Mutex<Option<PrinterSnapshot>>>>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn slot(&self, printer_id: &str) -> Arc<Mutex<Option<PrinterSnapshot>>> {
        {
            let slots = self.slots.read().await;
            if let Some(slot) = slots.get(printer_id) {
                return Arc::clone(slot);
            }
        }
        let mut slots = self.slots.write().await;
        Arc::clone(
            slots
                .entry(printer_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(None))),
        )
    }

    pub async fn latest(&self, printer_id: &str) -> Option<PrinterSnapshot> {
        let slot = {
            let slots = self.slots.read().await;
            slots.get(printer_id).cloned()
        };
        match slot {
            Some(slot) => slot.lock().await.clone(),
            None => None,
        }
    }

    /// Drops printers that left the active directory.
    pub async fn retain(&self, keep: &HashSet<String>) {
        let mut slots = self.slots.write().await;
        slots.retain(|printer_id, _| keep.contains(printer_id));
    }

    pub async fn fleet_counts(&self) -> FleetCounts {
        let slots = {
            let slots = self.slots.read().await;
            slots.values().cloned().collect::<Vec<_>>()
        };

        let mut counts = FleetCounts::default();
        for slot in slots {
            let Some(snapshot) = slot.lock().await.clone() else {
                continue;
            };
            counts.total += 1;
            if snapshot.online {
                counts.online += 1;
            } else {
                counts.offline += 1;
            }
            if snapshot.error.is_some() {
                counts.errored += 1;
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::monitor::snapshot::{PrinterRef, PrinterSnapshot};

    use super::SnapshotCache;

    fn printer(id: &str) -> PrinterRef {
        PrinterRef {
            id: id.to_string(),
            ip: "10.0.0.1".to_string(),
        }
    }

    #[tokio::test]
    async fn slot_is_reused_per_printer() {
        let cache = SnapshotCache::new();
        let first = cache.slot("printer-1").await;
        let second = cache.slot("printer-1").await;
        assert!(std::sync::Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn fleet_counts_reflect_latest_snapshots() {
        let cache = SnapshotCache::new();

        *cache.slot("printer-1").await.lock().await =
            Some(PrinterSnapshot::online(&printer("printer-1"), "ready"));
        *cache.slot("printer-2").await.lock().await =
            Some(PrinterSnapshot::offline_from_error(&printer("printer-2"), "timeout"));
        // Slot exists but has never been written; it must not count.
        let _ = cache.slot("printer-3").await;

        let counts = cache.fleet_counts().await;
        assert_eq!(counts.total, 2);
        assert_eq!(counts.online, 1);
        assert_eq!(counts.offline, 1);
        assert_eq!(counts.errored, 1);
    }

    #[tokio::test]
    async fn retain_drops_departed_printers() {
        let cache = SnapshotCache::new();
        *cache.slot("printer-1").await.lock().await =
            Some(PrinterSnapshot::online(&printer("printer-1"), "ready"));
        *cache.slot("printer-2").await.lock().await =
            Some(PrinterSnapshot::online(&printer("printer-2"), "ready"));

        let keep: HashSet<String> = ["printer-1".to_string()].into();
        cache.retain(&keep).await;

        assert!(cache.latest("printer-1").await.is_some());
        assert!(cache.latest("printer-2").await.is_none());
    }
}
