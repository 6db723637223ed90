use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ordered worst-last so the roll-up is a plain `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Outcome of one component check, produced fresh on every aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthComponentReport {
    pub component: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, serde_json::Value>,
}

impl HealthComponentReport {
    pub fn healthy(component: &str) -> Self {
        Self {
            component: component.to_string(),
            status: HealthStatus::Healthy,
            response_time_ms: None,
            warning: None,
            error: None,
            details: BTreeMap::new(),
        }
    }

    pub fn degraded(component: &str, warning: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Degraded,
            warning: Some(warning.into()),
            ..Self::healthy(component)
        }
    }

    pub fn unhealthy(component: &str, error: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            error: Some(error.into()),
            ..Self::healthy(component)
        }
    }

    pub fn with_response_time(mut self, elapsed_ms: u64) -> Self {
        self.response_time_ms = Some(elapsed_ms);
        self
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComprehensiveHealthReport {
    pub timestamp: DateTime<Utc>,
    pub overall_status: HealthStatus,
    pub components: Vec<HealthComponentReport>,
    pub recommendations: Vec<String>,
}

/// Strict severity roll-up: the overall status is the worst component
/// status, never an average.
pub fn roll_up(components: &[HealthComponentReport]) -> HealthStatus {
    components
        .iter()
        .map(|component| component.status)
        .max()
        .unwrap_or(HealthStatus::Healthy)
}
