use std::future::Future;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::model::{AlertRecord, AlertStatus, DedupKey, Severity};

#[derive(Debug, Error, Clone)]
#[error("{message}")]
pub struct AlertStoreError {
    message: String,
}

impl AlertStoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Persistence collaborator for alert records. The engine only needs the
/// recent-active lookup, creation, resolution, and severity escalation;
/// everything else about storage is the implementor's business.
pub trait AlertStore: Send + Sync + 'static {
    /// Most recent active alert for the key. With `window` set, only a
    /// record created inside the window counts (dedup lookup); with
    /// `None`, any active record matches (resolution lookup).
    fn find_active(
        &self,
        key: &DedupKey,
        window: Option<ChronoDuration>,
    ) -> impl Future<Output = Result<Option<AlertRecord>, AlertStoreError>> + Send;

    fn create(
        &self,
        record: AlertRecord,
    ) -> impl Future<Output = Result<(), AlertStoreError>> + Send;

    /// Marks the record resolved. Returns `None` when the record is
    /// missing or already resolved; resolved records are never mutated.
    fn resolve(
        &self,
        id: Uuid,
        resolved_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<Option<AlertRecord>, AlertStoreError>> + Send;

    fn escalate(
        &self,
        id: Uuid,
        severity: Severity,
    ) -> impl Future<Output = Result<Option<AlertRecord>, AlertStoreError>> + Send;
}

/// Reference store used by the binary and the tests. A real deployment
/// points the engine at its own repository implementation instead.
#[derive(Debug, Default)]
pub struct InMemoryAlertStore {
    records: RwLock<Vec<AlertRecord>>,
}

impl InMemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<AlertRecord> {
        self.records.read().await.clone()
    }
}

impl AlertStore for InMemoryAlertStore {
    async fn find_active(
        &self,
        key: &DedupKey,
        window: Option<ChronoDuration>,
    ) -> Result<Option<AlertRecord>, AlertStoreError> {
        let cutoff = window.map(|window| Utc::now() - window);
        let records = self.records.read().await;
        Ok(records
            .iter()
            .rev()
            .find(|record| {
                record.entity_id == key.entity_id
                    && record.kind == key.kind
                    && record.status.is_active()
                    && cutoff.is_none_or(|cutoff| record.created_at >= cutoff)
            })
            .cloned())
    }

    async fn create(&self, record: AlertRecord) -> Result<(), AlertStoreError> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn resolve(
        &self,
        id: Uuid,
        resolved_at: DateTime<Utc>,
    ) -> Result<Option<AlertRecord>, AlertStoreError> {
        let mut records = self.records.write().await;
        let Some(record) = records.iter_mut().find(|record| record.id == id) else {
            return Ok(None);
        };
        if !record.status.is_active() {
            return Ok(None);
        }
        record.status = AlertStatus::Resolved;
        record.resolved_at = Some(resolved_at);
        Ok(Some(record.clone()))
    }

    async fn escalate(
        &self,
        id: Uuid,
        severity: Severity,
    ) -> Result<Option<AlertRecord>, AlertStoreError> {
        let mut records = self.records.write().await;
        let Some(record) = records.iter_mut().find(|record| record.id == id) else {
            return Ok(None);
        };
        if !record.status.is_active() {
            return Ok(None);
        }
        record.severity = severity;
        Ok(Some(record.clone()))
    }
}
