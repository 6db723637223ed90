use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Directory entry for one monitored printer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterRef {
    pub id: String,
    pub ip: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsumableKind {
    Toner,
    Ink,
    Fuser,
    Drum,
}

impl std::fmt::Display for ConsumableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsumableKind::Toner => write!(f, "toner"),
            ConsumableKind::Ink => write!(f, "ink"),
            ConsumableKind::Fuser => write!(f, "fuser"),
            ConsumableKind::Drum => write!(f, "drum"),
        }
    }
}

/// One consumable as reported by a probe. Levels are percentages; the
/// thresholds are the device's own, when it reports any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumableReading {
    pub kind: ConsumableKind,
    pub color: Option<String>,
    pub level: Option<u8>,
    pub warning_level: Option<u8>,
    pub critical_level: Option<u8>,
}

impl ConsumableReading {
    /// Stable suffix identifying this consumable within its printer,
    /// e.g. `toner:black` or `fuser`.
    pub fn entity_suffix(&self) -> String {
        match &self.color {
            Some(color) => format!("{}:{}", self.kind, color),
            None => self.kind.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCounters {
    pub total: u64,
    pub mono: u64,
    pub color: u64,
}

/// What one probe cycle observed about one printer. Not persisted by the
/// engine; the scheduler keeps only the latest snapshot per printer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrinterSnapshot {
    pub entity_id: String,
    pub ip_address: String,
    pub online: bool,
    pub status_text: String,
    pub consumables: Vec<ConsumableReading>,
    pub page_counters: PageCounters,
    pub observed_at: DateTime<Utc>,
    /// Set when the snapshot was synthesized from a probe failure.
    pub error: Option<String>,
}

impl PrinterSnapshot {
    pub fn online(printer: &PrinterRef, status_text: impl Into<String>) -> Self {
        Self {
            entity_id: printer.id.clone(),
            ip_address: printer.ip.clone(),
            online: true,
            status_text: status_text.into(),
            consumables: Vec::new(),
            page_counters: PageCounters::default(),
            observed_at: Utc::now(),
            error: None,
        }
    }

    /// A probe failure never aborts the cycle; it becomes this snapshot.
    pub fn offline_from_error(printer: &PrinterRef, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            entity_id: printer.id.clone(),
            ip_address: printer.ip.clone(),
            online: false,
            status_text: "unreachable".to_string(),
            consumables: Vec::new(),
            page_counters: PageCounters::default(),
            observed_at: Utc::now(),
            error: Some(error),
        }
    }
}
