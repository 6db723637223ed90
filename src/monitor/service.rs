use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use tokio::sync::watch;
use tokio::time::timeout;

use crate::alerts::{
    AlertKind, AlertLifecycleManager, AlertOutcome, AlertStore, EntityType, Severity,
};
use crate::config::RuntimeConfig;
use crate::dispatch::{
    Dispatcher, EngineEvent, TOPIC_ALL_PRINTERS, TOPIC_CONSUMABLES, TOPIC_TECHNICIANS,
    printer_topic,
};

use super::cache::SnapshotCache;
use super::consumables::evaluate_consumable;
use super::probe::DeviceProbe;
use super::snapshot::{PrinterRef, PrinterSnapshot};
use super::transition::{Transition, detect_transition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum WorkerOutcome {
    Processed {
        offline: bool,
        probe_failed: bool,
        transitioned: bool,
    },
    /// Cancellation arrived before the result was applied; nothing was
    /// written to the cache or the alert store.
    Discarded,
}

/// One printer's evaluation chain, strictly in order:
/// probe -> detect -> evaluate -> alert -> notify. Runs under the
/// printer's cache slot lock, so writers for one entity are serialized
/// while the rest of the fleet proceeds in parallel.
pub(super) async fn process_printer<P: DeviceProbe, S: AlertStore>(
    printer: PrinterRef,
    probe: Arc<P>,
    runtime: Arc<RuntimeConfig>,
    cache: Arc<SnapshotCache>,
    alerts: Arc<AlertLifecycleManager<S>>,
    dispatcher: Dispatcher,
    cancel: watch::Receiver<bool>,
) -> WorkerOutcome {
    let probe_timeout = Duration::from_secs(runtime.probe_timeout_secs);
    let (snapshot, probe_failed) = match timeout(probe_timeout, probe.probe(&printer)).await {
        Ok(Ok(snapshot)) => (snapshot, false),
        Ok(Err(error)) => {
            log::warn!("probe_failed printer={} error={}", printer.id, error);
            (PrinterSnapshot::offline_from_error(&printer, error.to_string()), true)
        }
        Err(_) => {
            log::warn!(
                "probe_timed_out printer={} timeout_secs={}",
                printer.id,
                runtime.probe_timeout_secs
            );
            (PrinterSnapshot::offline_from_error(&printer, "probe timed out"), true)
        }
    };

    // An abandoned probe result must not be applied, even partially.
    if *cancel.borrow() {
        return WorkerOutcome::Discarded;
    }

    let slot = cache.slot(&printer.id).await;
    let mut previous = slot.lock().await;

    let transition = detect_transition(previous.as_ref(), &snapshot);
    if let Some(transition) = transition {
        let event = EngineEvent::StatusChanged {
            entity_id: snapshot.entity_id.clone(),
            ip_address: snapshot.ip_address.clone(),
            online: snapshot.online,
            transition,
            status_text: snapshot.status_text.clone(),
            observed_at: snapshot.observed_at,
        };
        dispatcher.publish(&printer_topic(&printer.id), event.clone()).await;
        dispatcher.publish(TOPIC_ALL_PRINTERS, event.clone()).await;
        if transition == Transition::WentOffline {
            dispatcher.publish(TOPIC_TECHNICIANS, event).await;
        }
    }

    let dedup_window = ChronoDuration::hours(i64::from(runtime.dedup_window_hours));

    match alerts
        .evaluate(
            &printer.id,
            EntityType::Printer,
            AlertKind::Offline,
            Severity::High,
            !snapshot.online,
            dedup_window,
        )
        .await
    {
        Ok(outcome) => {
            publish_alert_outcome(&dispatcher, &printer.id, &outcome, true, false).await;
        }
        Err(error) => {
            log::warn!(
                "alert_evaluation_failed entity={} kind=offline error={}",
                printer.id,
                error
            );
        }
    }

    for reading in &snapshot.consumables {
        let status = evaluate_consumable(reading, &runtime.consumables);
        let entity_id = format!("{}:{}", printer.id, reading.entity_suffix());

        dispatcher
            .publish(
                TOPIC_CONSUMABLES,
                EngineEvent::ConsumableLevel {
                    printer_id: printer.id.clone(),
                    entity_id: entity_id.clone(),
                    kind: reading.kind,
                    color: reading.color.clone(),
                    level: reading.level,
                    status,
                    observed_at: snapshot.observed_at,
                },
            )
            .await;

        let critical_severity = if status == super::ConsumableStatus::Empty {
            Severity::Critical
        } else {
            Severity::High
        };
        let evaluations = [
            (AlertKind::ConsumableLow, Severity::Medium, status.is_low_or_worse(), false),
            (AlertKind::ConsumableCritical, critical_severity, status.is_critical_or_worse(), true),
        ];

        for (kind, severity, qualifies, escalate) in evaluations {
            match alerts
                .evaluate(&entity_id, EntityType::Consumable, kind, severity, qualifies, dedup_window)
                .await
            {
                Ok(outcome) => {
                    publish_alert_outcome(&dispatcher, &printer.id, &outcome, escalate, true).await;
                }
                Err(error) => {
                    log::warn!(
                        "alert_evaluation_failed entity={} kind={} error={}",
                        entity_id,
                        kind,
                        error
                    );
                }
            }
        }
    }

    let outcome = WorkerOutcome::Processed {
        offline: !snapshot.online,
        probe_failed,
        transitioned: transition.is_some(),
    };
    *previous = Some(snapshot);
    outcome
}

/// Alert events go to the device feed and the fleet feed; consumable
/// alerts additionally to the consumables feed; raised critical-path
/// alerts escalate to the technicians feed.
async fn publish_alert_outcome(
    dispatcher: &Dispatcher,
    printer_id: &str,
    outcome: &AlertOutcome,
    escalate: bool,
    consumable: bool,
) {
    let event = match outcome {
        AlertOutcome::Created(alert) => EngineEvent::AlertCreated {
            alert: alert.clone(),
        },
        AlertOutcome::Escalated(alert) => EngineEvent::AlertEscalated {
            alert: alert.clone(),
        },
        AlertOutcome::Resolved(alert) => EngineEvent::AlertResolved {
            alert: alert.clone(),
        },
        AlertOutcome::AlreadyActive | AlertOutcome::Clear => return,
    };

    dispatcher.publish(&printer_topic(printer_id), event.clone()).await;
    dispatcher.publish(TOPIC_ALL_PRINTERS, event.clone()).await;
    if consumable {
        dispatcher.publish(TOPIC_CONSUMABLES, event.clone()).await;
    }
    if escalate && !matches!(outcome, AlertOutcome::Resolved(_)) {
        dispatcher.publish(TOPIC_TECHNICIANS, event).await;
    }
}
