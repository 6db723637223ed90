use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Offline,
    ConsumableLow,
    ConsumableCritical,
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertKind::Offline => write!(f, "offline"),
            AlertKind::ConsumableLow => write!(f, "consumable_low"),
            AlertKind::ConsumableCritical => write!(f, "consumable_critical"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Printer,
    Consumable,
}

/// Ordered by urgency, so escalation is a plain comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    New,
    InProgress,
    Resolved,
}

impl AlertStatus {
    pub fn is_active(self) -> bool {
        matches!(self, AlertStatus::New | AlertStatus::InProgress)
    }
}

/// Identity under which alerts deduplicate: one active alert per
/// entity and kind within the dedup window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub entity_id: String,
    pub kind: AlertKind,
}

impl DedupKey {
    pub fn new(entity_id: impl Into<String>, kind: AlertKind) -> Self {
        Self {
            entity_id: entity_id.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: Uuid,
    pub entity_id: String,
    pub entity_type: EntityType,
    pub kind: AlertKind,
    pub severity: Severity,
    pub status: AlertStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl AlertRecord {
    pub fn new(
        entity_id: impl Into<String>,
        entity_type: EntityType,
        kind: AlertKind,
        severity: Severity,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            entity_id: entity_id.into(),
            entity_type,
            kind,
            severity,
            status: AlertStatus::New,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }
}
