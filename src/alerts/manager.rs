use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::Mutex;
#[cfg(test)]
use uuid::Uuid;

use super::model::{AlertKind, AlertRecord, DedupKey, EntityType, Severity};
use super::store::{AlertStore, AlertStoreError};

/// What an evaluation did to the alert state for one entity/kind pair.
#[derive(Debug, Clone)]
pub enum AlertOutcome {
    Created(AlertRecord),
    Escalated(AlertRecord),
    /// Condition still holds and a matching active alert already exists.
    AlreadyActive,
    Resolved(AlertRecord),
    /// Condition clear and nothing was active.
    Clear,
}

/// Creates, deduplicates, escalates, and resolves alerts. Alert state is an
/// idempotent function of the current condition: the same bad condition
/// observed repeatedly inside the dedup window never produces a second
/// record, and a cleared condition always self-resolves.
pub struct AlertLifecycleManager<S: AlertStore> {
    store: S,
    entity_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: AlertStore> AlertLifecycleManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            entity_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn evaluate(
        &self,
        entity_id: &str,
        entity_type: EntityType,
        kind: AlertKind,
        severity: Severity,
        qualifies: bool,
        dedup_window: ChronoDuration,
    ) -> Result<AlertOutcome, AlertStoreError> {
        // Single writer per entity; evaluations for different entities
        // proceed in parallel on their own locks.
        let entity_lock = self.entity_lock(entity_id).await;
        let _guard = entity_lock.lock().await;

        let key = DedupKey::new(entity_id, kind);
        if qualifies {
            self.raise(&key, entity_type, severity, dedup_window).await
        } else {
            self.clear(&key).await
        }
    }

    async fn raise(
        &self,
        key: &DedupKey,
        entity_type: EntityType,
        severity: Severity,
        dedup_window: ChronoDuration,
    ) -> Result<AlertOutcome, AlertStoreError> {
        if let Some(existing) = self.store.find_active(key, Some(dedup_window)).await? {
            if severity > existing.severity {
                if let Some(updated) = self.store.escalate(existing.id, severity).await? {
                    log::info!(
                        "alert_escalated id={} entity={} kind={} severity={:?}",
                        updated.id,
                        updated.entity_id,
                        updated.kind,
                        updated.severity
                    );
                    return Ok(AlertOutcome::Escalated(updated));
                }
            }
            return Ok(AlertOutcome::AlreadyActive);
        }

        let record = AlertRecord::new(key.entity_id.clone(), entity_type, key.kind, severity);
        self.store.create(record.clone()).await?;
        log::info!(
            "alert_created id={} entity={} kind={} severity={:?}",
            record.id,
            record.entity_id,
            record.kind,
            record.severity
        );
        Ok(AlertOutcome::Created(record))
    }

    async fn clear(&self, key: &DedupKey) -> Result<AlertOutcome, AlertStoreError> {
        // Resolution ignores the window: a stale-but-active alert still
        // self-resolves once the condition is gone.
        let Some(existing) = self.store.find_active(key, None).await? else {
            return Ok(AlertOutcome::Clear);
        };
        match self.store.resolve(existing.id, Utc::now()).await? {
            Some(resolved) => {
                log::info!(
                    "alert_resolved id={} entity={} kind={}",
                    resolved.id,
                    resolved.entity_id,
                    resolved.kind
                );
                Ok(AlertOutcome::Resolved(resolved))
            }
            None => Ok(AlertOutcome::Clear),
        }
    }

    async fn entity_lock(&self, entity_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.entity_locks.lock().await;
        Arc::clone(
            locks
                .entry(entity_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Drops per-entity locks for entities no longer monitored.
    pub async fn retain_entities(&self, keep: impl Fn(&str) -> bool) {
        let mut locks = self.entity_locks.lock().await;
        locks.retain(|entity_id, _| keep(entity_id));
    }

    #[cfg(test)]
    pub(crate) async fn resolve_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<AlertRecord>, AlertStoreError> {
        self.store.resolve(id, Utc::now()).await
    }
}
