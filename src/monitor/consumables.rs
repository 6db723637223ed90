use serde::{Deserialize, Serialize};

use crate::config::ConsumableDefaults;

use super::snapshot::ConsumableReading;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumableStatus {
    Ok,
    Low,
    Critical,
    Empty,
    Unknown,
}

impl ConsumableStatus {
    /// At or below the warning tier, i.e. a Low alert condition holds.
    pub fn is_low_or_worse(self) -> bool {
        matches!(
            self,
            ConsumableStatus::Low | ConsumableStatus::Critical | ConsumableStatus::Empty
        )
    }

    pub fn is_critical_or_worse(self) -> bool {
        matches!(self, ConsumableStatus::Critical | ConsumableStatus::Empty)
    }
}

/// Pure threshold evaluation, first match wins: no level reading means
/// Unknown, a drained consumable is Empty, then the critical and warning
/// tiers with boundary equality counting as breached. Thresholds come from
/// the reading itself, falling back to the configured defaults; a tier with
/// no threshold anywhere is never reached.
pub fn evaluate_consumable(
    reading: &ConsumableReading,
    defaults: &ConsumableDefaults,
) -> ConsumableStatus {
    let Some(level) = reading.level else {
        return ConsumableStatus::Unknown;
    };
    if level == 0 {
        return ConsumableStatus::Empty;
    }

    let critical = reading.critical_level.or(defaults.critical_level);
    if let Some(critical) = critical
        && level <= critical
    {
        return ConsumableStatus::Critical;
    }

    let warning = reading.warning_level.or(defaults.warning_level);
    if let Some(warning) = warning
        && level <= warning
    {
        return ConsumableStatus::Low;
    }

    ConsumableStatus::Ok
}
