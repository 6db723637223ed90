use serde::{Deserialize, Serialize};

use super::snapshot::PrinterSnapshot;

/// The direction a printer moved between two consecutive polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    CameOnline,
    WentOffline,
}

/// Compares the previously recorded snapshot against the current one.
/// Pure; the caller owns the "previous" cache. A printer that is offline
/// on first sight counts as a transition so first-seen-down devices still
/// alert.
pub fn detect_transition(
    previous: Option<&PrinterSnapshot>,
    current: &PrinterSnapshot,
) -> Option<Transition> {
    match previous {
        Some(previous) if previous.online == current.online => None,
        Some(_) | None if !current.online => Some(Transition::WentOffline),
        Some(_) => Some(Transition::CameOnline),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use crate::monitor::snapshot::{PrinterRef, PrinterSnapshot};

    use super::{Transition, detect_transition};

    fn printer() -> PrinterRef {
        PrinterRef {
            id: "printer-1".to_string(),
            ip: "10.0.0.17".to_string(),
        }
    }

    fn snapshot(online: bool) -> PrinterSnapshot {
        if online {
            PrinterSnapshot::online(&printer(), "ready")
        } else {
            PrinterSnapshot::offline_from_error(&printer(), "connection refused")
        }
    }

    #[test]
    fn no_transition_when_state_unchanged() {
        assert_eq!(detect_transition(Some(&snapshot(false)), &snapshot(false)), None);
        assert_eq!(detect_transition(Some(&snapshot(true)), &snapshot(true)), None);
    }

    #[test]
    fn online_to_offline_is_went_offline() {
        assert_eq!(
            detect_transition(Some(&snapshot(true)), &snapshot(false)),
            Some(Transition::WentOffline)
        );
    }

    #[test]
    fn offline_to_online_is_came_online() {
        assert_eq!(
            detect_transition(Some(&snapshot(false)), &snapshot(true)),
            Some(Transition::CameOnline)
        );
    }

    #[test]
    fn first_seen_down_still_transitions() {
        assert_eq!(
            detect_transition(None, &snapshot(false)),
            Some(Transition::WentOffline)
        );
    }

    #[test]
    fn first_seen_up_is_quiet() {
        assert_eq!(detect_transition(None, &snapshot(true)), None);
    }
}
