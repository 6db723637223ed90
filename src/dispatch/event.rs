use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::alerts::AlertRecord;
use crate::health::ComprehensiveHealthReport;
use crate::monitor::{ConsumableKind, ConsumableStatus, Transition};

/// Fleet-wide feed.
pub const TOPIC_ALL_PRINTERS: &str = "printers:all";
/// Offline transitions and critical-consumable escalations.
pub const TOPIC_TECHNICIANS: &str = "technicians";
/// All consumable-level events.
pub const TOPIC_CONSUMABLES: &str = "consumables";
/// Periodic comprehensive health reports.
pub const TOPIC_HEALTH: &str = "health";

/// Single-device feed.
pub fn printer_topic(printer_id: &str) -> String {
    format!("printer:{}", printer_id)
}

/// Everything the engine publishes. Serializable so a transport-backed
/// subscriber (websocket hub, message queue) can forward events as-is.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    StatusChanged {
        entity_id: String,
        ip_address: String,
        online: bool,
        transition: Transition,
        status_text: String,
        observed_at: DateTime<Utc>,
    },
    AlertCreated {
        alert: AlertRecord,
    },
    AlertEscalated {
        alert: AlertRecord,
    },
    AlertResolved {
        alert: AlertRecord,
    },
    ConsumableLevel {
        printer_id: String,
        entity_id: String,
        kind: ConsumableKind,
        color: Option<String>,
        level: Option<u8>,
        status: ConsumableStatus,
        observed_at: DateTime<Utc>,
    },
    HealthReport {
        report: ComprehensiveHealthReport,
    },
}
