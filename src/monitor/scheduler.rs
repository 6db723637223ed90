use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, Notify, RwLock, Semaphore, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Duration, sleep, timeout};

use crate::alerts::{AlertLifecycleManager, AlertStore};
use crate::config::{Monitor, RuntimeConfig};
use crate::dispatch::Dispatcher;

use super::cache::SnapshotCache;
use super::directory::PrinterDirectory;
use super::probe::DeviceProbe;
use super::service::{WorkerOutcome, process_printer};

/// Operational state of one engine instance. Owned by the scheduler and
/// mutated only from its own task; everyone else reads through a
/// `RunStateHandle`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MonitoringRunState {
    pub active: bool,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub last_cycle_duration_ms: Option<u64>,
    pub monitored_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RunStateHandle {
    inner: Arc<std::sync::Mutex<MonitoringRunState>>,
}

impl RunStateHandle {
    pub fn snapshot(&self) -> MonitoringRunState {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MonitoringRunState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.lock().active = active;
    }

    pub(crate) fn record_cycle(&self, at: DateTime<Utc>, duration_ms: u64, monitored_count: usize) {
        let mut state = self.lock();
        state.last_cycle_at = Some(at);
        state.last_cycle_duration_ms = Some(duration_ms);
        state.monitored_count = monitored_count;
    }
}

/// Start attempt failed; the engine stays stopped.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("monitor.worker_limit must be greater than 0")]
    InvalidWorkerLimit,
    #[error("monitor.poll_interval_secs must be greater than 0")]
    InvalidPollInterval,
}

#[derive(Debug, Default, Clone, Copy)]
struct CycleStats {
    monitored: usize,
    offline: usize,
    probe_failures: usize,
    transitions: usize,
    discarded: usize,
}

struct EngineCore<D, P, S: AlertStore> {
    directory: D,
    probe: Arc<P>,
    alerts: Arc<AlertLifecycleManager<S>>,
    dispatcher: Dispatcher,
    cache: Arc<SnapshotCache>,
    runtime_config: Arc<RwLock<RuntimeConfig>>,
    runtime_update: Arc<Notify>,
    run_state: RunStateHandle,
}

/// Drives the monitoring loop: one cooperatively cancellable periodic
/// task per instance, each tick probing the fleet through a bounded
/// worker pool. The loop awaits the full cycle before sleeping, so
/// cycles never overlap.
pub struct PollingScheduler<D, P, S: AlertStore> {
    core: Arc<EngineCore<D, P, S>>,
    shutdown: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
    initial_delay: Duration,
    stop_grace: Duration,
}

impl<D, P, S> PollingScheduler<D, P, S>
where
    D: PrinterDirectory,
    P: DeviceProbe,
    S: AlertStore,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        directory: D,
        probe: Arc<P>,
        alerts: Arc<AlertLifecycleManager<S>>,
        dispatcher: Dispatcher,
        cache: Arc<SnapshotCache>,
        runtime_config: Arc<RwLock<RuntimeConfig>>,
        runtime_update: Arc<Notify>,
        monitor: &Monitor,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            core: Arc::new(EngineCore {
                directory,
                probe,
                alerts,
                dispatcher,
                cache,
                runtime_config,
                runtime_update,
                run_state: RunStateHandle::default(),
            }),
            shutdown,
            handle: Mutex::new(None),
            initial_delay: Duration::from_secs(monitor.initial_delay_secs),
            stop_grace: Duration::from_secs(monitor.stop_grace_secs),
        }
    }

    pub fn run_state_handle(&self) -> RunStateHandle {
        self.core.run_state.clone()
    }

    pub fn status(&self) -> MonitoringRunState {
        self.core.run_state.snapshot()
    }

    /// Begins the periodic cycle. Calling this while the engine is
    /// already active is a warning-level no-op.
    pub async fn start(&self) -> Result<(), StartError> {
        let mut handle = self.handle.lock().await;
        if handle.as_ref().is_some_and(|task| !task.is_finished()) {
            log::warn!("monitor_start_ignored reason=already_active");
            return Ok(());
        }

        let runtime = self.core.runtime_config.read().await.clone();
        if runtime.worker_limit == 0 {
            return Err(StartError::InvalidWorkerLimit);
        }
        if runtime.poll_interval_secs == 0 {
            return Err(StartError::InvalidPollInterval);
        }

        self.shutdown.send_replace(false);
        self.core.run_state.set_active(true);

        let core = Arc::clone(&self.core);
        let cancel = self.shutdown.subscribe();
        let initial_delay = self.initial_delay;
        *handle = Some(tokio::spawn(async move {
            run_loop(core, cancel, initial_delay).await;
        }));

        log::info!(
            "monitor_started poll_interval_secs={} worker_limit={} probe_timeout_secs={}",
            runtime.poll_interval_secs,
            runtime.worker_limit,
            runtime.probe_timeout_secs
        );
        Ok(())
    }

    /// Signals cancellation, waits up to the grace period for the
    /// in-flight cycle, then abandons it. Idempotent.
    pub async fn stop(&self) {
        let task = self.handle.lock().await.take();
        let Some(task) = task else {
            log::info!("monitor_stop_ignored reason=not_active");
            return;
        };

        self.shutdown.send_replace(true);
        let abort = task.abort_handle();
        match timeout(self.stop_grace, task).await {
            Ok(Ok(())) => log::info!("monitor_stopped reason=graceful"),
            Ok(Err(join_error)) => {
                log::error!("monitor_stopped reason=join_error error={}", join_error);
            }
            Err(_) => {
                abort.abort();
                log::warn!("monitor_stop_grace_elapsed action=abandon_in_flight_cycle");
            }
        }
        self.core.run_state.set_active(false);
    }
}

async fn run_loop<D, P, S>(
    core: Arc<EngineCore<D, P, S>>,
    mut cancel: watch::Receiver<bool>,
    initial_delay: Duration,
) where
    D: PrinterDirectory,
    P: DeviceProbe,
    S: AlertStore,
{
    tokio::select! {
        _ = sleep(initial_delay) => {}
        _ = cancel.changed() => return,
    }

    let mut previous_tick: Option<DateTime<Utc>> = None;
    loop {
        if *cancel.borrow() {
            return;
        }

        let runtime = Arc::new(core.runtime_config.read().await.clone());
        let now = Utc::now();

        if let Some(previous) = previous_tick {
            let elapsed_secs = now.signed_duration_since(previous).num_seconds().max(0);
            let threshold_secs = (runtime.poll_interval_secs * 2) as i64;
            if elapsed_secs > threshold_secs {
                log::warn!(
                    "monitor_cycle_delayed elapsed_secs={} threshold_secs={}",
                    elapsed_secs,
                    threshold_secs
                );
            }
        }
        previous_tick = Some(now);

        let started = Instant::now();
        let stats = run_cycle(&core, &runtime, &cancel).await;
        let duration_ms = started.elapsed().as_millis() as u64;
        core.run_state.record_cycle(now, duration_ms, stats.monitored);

        tracing::info!(
            target: "monitor",
            module = "monitor",
            printers = stats.monitored,
            offline = stats.offline,
            probe_failures = stats.probe_failures,
            transitions = stats.transitions,
            discarded = stats.discarded,
            duration_ms = duration_ms,
            "monitor_cycle"
        );

        let interval = Duration::from_secs(runtime.poll_interval_secs);
        tokio::select! {
            _ = sleep(interval) => {}
            _ = cancel.changed() => return,
            _ = core.runtime_update.notified() => {
                log::info!(
                    "monitor_interval_change_interrupt_applied previous_sleep_secs={}",
                    runtime.poll_interval_secs
                );
            }
        }
    }
}

async fn run_cycle<D, P, S>(
    core: &Arc<EngineCore<D, P, S>>,
    runtime: &Arc<RuntimeConfig>,
    cancel: &watch::Receiver<bool>,
) -> CycleStats
where
    D: PrinterDirectory,
    P: DeviceProbe,
    S: AlertStore,
{
    let printers = match core.directory.list_active_printers().await {
        Ok(printers) => printers,
        Err(error) => {
            // Shared orchestration failure: abort this cycle only, the
            // loop retries on the next tick.
            log::error!("printer_directory_unavailable error={} retry=next_tick", error);
            return CycleStats::default();
        }
    };

    let active_ids: HashSet<String> = printers.iter().map(|printer| printer.id.clone()).collect();
    core.cache.retain(&active_ids).await;
    core.alerts
        .retain_entities(|entity_id| {
            let printer_id = entity_id.split(':').next().unwrap_or(entity_id);
            active_ids.contains(printer_id)
        })
        .await;

    let semaphore = Arc::new(Semaphore::new(runtime.worker_limit));
    let mut workers = JoinSet::new();
    for printer in printers {
        let semaphore = Arc::clone(&semaphore);
        let probe = Arc::clone(&core.probe);
        let runtime = Arc::clone(runtime);
        let cache = Arc::clone(&core.cache);
        let alerts = Arc::clone(&core.alerts);
        let dispatcher = core.dispatcher.clone();
        let cancel = cancel.clone();
        workers.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return WorkerOutcome::Discarded;
            };
            process_printer(printer, probe, runtime, cache, alerts, dispatcher, cancel).await
        });
    }

    // Cancellation inside the cycle is strictly cooperative: each worker
    // checks the flag after its probe returns and discards its own result,
    // so a result is applied whole or not at all. If draining outlasts the
    // stop grace period, stop() aborts the loop task and the JoinSet drop
    // takes the stragglers down with it.
    let mut stats = CycleStats::default();
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(outcome) => tally(&mut stats, outcome),
            Err(join_error) => {
                log::error!("monitor_worker_failed error={}", join_error);
            }
        }
    }
    stats
}

fn tally(stats: &mut CycleStats, outcome: WorkerOutcome) {
    match outcome {
        WorkerOutcome::Processed {
            offline,
            probe_failed,
            transitioned,
        } => {
            stats.monitored += 1;
            if offline {
                stats.offline += 1;
            }
            if probe_failed {
                stats.probe_failures += 1;
            }
            if transitioned {
                stats.transitions += 1;
            }
        }
        WorkerOutcome::Discarded => stats.discarded += 1,
    }
}
