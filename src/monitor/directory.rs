use std::future::Future;

use thiserror::Error;

use crate::config::PrinterEntry;

use super::snapshot::PrinterRef;

#[derive(Debug, Error, Clone)]
#[error("{message}")]
pub struct DirectoryError {
    message: String,
}

impl DirectoryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Source of the active-printer list. A real deployment backs this with
/// its device repository; the binary uses the static list from config.
pub trait PrinterDirectory: Send + Sync + 'static {
    fn list_active_printers(
        &self,
    ) -> impl Future<Output = Result<Vec<PrinterRef>, DirectoryError>> + Send;
}

#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    printers: Vec<PrinterRef>,
}

impl StaticDirectory {
    pub fn new(printers: Vec<PrinterRef>) -> Self {
        Self { printers }
    }

    pub fn from_entries(entries: &[PrinterEntry]) -> Self {
        Self {
            printers: entries
                .iter()
                .map(|entry| PrinterRef {
                    id: entry.id.clone(),
                    ip: entry.ip.clone(),
                })
                .collect(),
        }
    }

    /// Synthetic fleet for simulation mode: printer-1..printer-n on a
    /// documentation-range subnet.
    pub fn simulated(fleet_size: u16) -> Self {
        Self {
            printers: (1..=fleet_size)
                .map(|n| PrinterRef {
                    id: format!("printer-{}", n),
                    ip: format!("192.0.2.{}", n),
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.printers.is_empty()
    }
}

impl PrinterDirectory for StaticDirectory {
    async fn list_active_printers(&self) -> Result<Vec<PrinterRef>, DirectoryError> {
        Ok(self.printers.clone())
    }
}

#[cfg(test)]
pub(crate) struct FailingDirectory;

#[cfg(test)]
impl PrinterDirectory for FailingDirectory {
    async fn list_active_printers(&self) -> Result<Vec<PrinterRef>, DirectoryError> {
        Err(DirectoryError::new("directory unavailable"))
    }
}
