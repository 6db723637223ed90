use std::future::Future;
use std::time::Instant;

use thiserror::Error;
use tokio::net::TcpStream;

use super::snapshot::{ConsumableKind, ConsumableReading, PageCounters, PrinterRef, PrinterSnapshot};

#[derive(Debug, Error, Clone)]
#[error("{message}")]
pub struct ProbeError {
    message: String,
}

impl ProbeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Queries one printer. The wire protocol behind an implementation is its
/// own business; the engine only needs a snapshot or an error. The caller
/// applies the per-probe timeout.
pub trait DeviceProbe: Send + Sync + 'static {
    fn probe(
        &self,
        printer: &PrinterRef,
    ) -> impl Future<Output = Result<PrinterSnapshot, ProbeError>> + Send;
}

pub enum ActiveProbe {
    Tcp(TcpProbe),
    Simulated(SimulatedProbe),
}

impl ActiveProbe {
    pub fn new(simulation_enabled: bool, profile: &str) -> Self {
        if simulation_enabled {
            Self::Simulated(SimulatedProbe::new(profile))
        } else {
            Self::Tcp(TcpProbe::default())
        }
    }
}

impl DeviceProbe for ActiveProbe {
    async fn probe(&self, printer: &PrinterRef) -> Result<PrinterSnapshot, ProbeError> {
        match self {
            ActiveProbe::Tcp(probe) => probe.probe(printer).await,
            ActiveProbe::Simulated(probe) => probe.probe(printer).await,
        }
    }
}

/// Reachability probe against the printer's raw-print port. It can tell
/// online from offline but reports no consumable levels; deployments with
/// an SNMP stack plug in their own `DeviceProbe` instead.
pub struct TcpProbe {
    port: u16,
}

impl TcpProbe {
    pub const JETDIRECT_PORT: u16 = 9100;

    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

impl Default for TcpProbe {
    fn default() -> Self {
        Self::new(Self::JETDIRECT_PORT)
    }
}

impl DeviceProbe for TcpProbe {
    async fn probe(&self, printer: &PrinterRef) -> Result<PrinterSnapshot, ProbeError> {
        match TcpStream::connect((printer.ip.as_str(), self.port)).await {
            Ok(_stream) => Ok(PrinterSnapshot::online(printer, "reachable")),
            Err(error) => Err(ProbeError::new(format!(
                "connect {}:{} failed: {}",
                printer.ip, self.port, error
            ))),
        }
    }
}

/// Deterministic wave-profile probe for running the daemon without
/// hardware: toner drains and refills on a sine wave and every printer
/// periodically drops offline on its own beat.
pub struct SimulatedProbe {
    started: Instant,
    period_secs: u64,
}

impl SimulatedProbe {
    pub fn new(profile: &str) -> Self {
        if profile != "wave" {
            log::warn!(
                "simulation_profile_unknown profile={} fallback=wave",
                profile
            );
        }
        Self {
            started: Instant::now(),
            period_secs: 30,
        }
    }

    fn beat(&self, printer: &PrinterRef) -> u64 {
        let tick = self.started.elapsed().as_secs() / self.period_secs;
        let phase: u64 = printer.id.bytes().map(u64::from).sum();
        tick.wrapping_add(phase)
    }
}

impl DeviceProbe for SimulatedProbe {
    async fn probe(&self, printer: &PrinterRef) -> Result<PrinterSnapshot, ProbeError> {
        let beat = self.beat(printer);

        if beat % 13 == 0 {
            return Err(ProbeError::new("simulated outage"));
        }

        let wave = ((beat as f32 / 6.0).sin() + 1.0) / 2.0;
        let toner_level = (wave * 100.0).round().clamp(0.0, 100.0) as u8;

        let mut snapshot = PrinterSnapshot::online(printer, "ready");
        snapshot.consumables = vec![
            ConsumableReading {
                kind: ConsumableKind::Toner,
                color: Some("black".to_string()),
                level: Some(toner_level),
                warning_level: None,
                critical_level: None,
            },
            ConsumableReading {
                kind: ConsumableKind::Drum,
                color: None,
                level: Some(80),
                warning_level: None,
                critical_level: None,
            },
        ];
        snapshot.page_counters = PageCounters {
            total: beat * 12,
            mono: beat * 9,
            color: beat * 3,
        };
        Ok(snapshot)
    }
}

#[cfg(test)]
pub(crate) struct MockProbe {
    responses: std::sync::Mutex<
        std::collections::HashMap<String, std::collections::VecDeque<Result<PrinterSnapshot, ProbeError>>>,
    >,
    delays: std::sync::Mutex<std::collections::HashMap<String, std::time::Duration>>,
    active: std::sync::atomic::AtomicUsize,
    peak: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockProbe {
    pub(crate) fn new() -> Self {
        Self {
            responses: std::sync::Mutex::new(std::collections::HashMap::new()),
            delays: std::sync::Mutex::new(std::collections::HashMap::new()),
            active: std::sync::atomic::AtomicUsize::new(0),
            peak: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Highest number of probes ever in flight at once.
    pub(crate) fn peak_concurrency(&self) -> usize {
        self.peak.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub(crate) fn script(&self, printer_id: &str, result: Result<PrinterSnapshot, ProbeError>) {
        self.responses
            .lock()
            .expect("mock probe lock")
            .entry(printer_id.to_string())
            .or_default()
            .push_back(result);
    }

    pub(crate) fn set_delay(&self, printer_id: &str, delay: std::time::Duration) {
        self.delays
            .lock()
            .expect("mock probe lock")
            .insert(printer_id.to_string(), delay);
    }
}

#[cfg(test)]
impl DeviceProbe for MockProbe {
    async fn probe(&self, printer: &PrinterRef) -> Result<PrinterSnapshot, ProbeError> {
        use std::sync::atomic::Ordering;

        let live = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(live, Ordering::SeqCst);

        let delay = self
            .delays
            .lock()
            .expect("mock probe lock")
            .get(&printer.id)
            .copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let result = self
            .responses
            .lock()
            .expect("mock probe lock")
            .get_mut(&printer.id)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Err(ProbeError::new("mock probe exhausted")));
        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
