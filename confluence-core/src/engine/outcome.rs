//! What a single analysis pass concluded.

use serde::{Deserialize, Serialize};

use crate::domain::{Resolution, Signal, Trend};

/// Coordinator progress through the top-down confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CoordinatorState {
    /// Warming up, or the macro trend is neutral.
    #[default]
    Idle,
    /// Macro trend is directional; meso not yet confirmed.
    MacroReady,
    /// Macro and meso agree; structures are being detected.
    Aligned,
    /// Searching the micro resolution for an entry near a structure.
    EntrySearch,
}

/// Why a pass that reached the risk stage produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The stop landed on the wrong side of the entry, or the risk was zero.
    DegenerateRisk,
}

/// Result of one pass, ending either in a signal or at the stage that stopped it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PassOutcome {
    /// A buffer holds fewer bars than the pass needs.
    Warmup {
        resolution: Resolution,
        have: usize,
        need: usize,
    },
    MacroNeutral,
    Misaligned {
        macro_trend: Trend,
        meso_trend: Trend,
    },
    NoNearbyStructure {
        trend: Trend,
        surfaced: usize,
    },
    BelowGate {
        score: f64,
    },
    Skipped {
        reason: SkipReason,
    },
    Emitted(Signal),
}

impl PassOutcome {
    pub fn signal(&self) -> Option<&Signal> {
        match self {
            PassOutcome::Emitted(signal) => Some(signal),
            _ => None,
        }
    }

    pub fn into_signal(self) -> Option<Signal> {
        match self {
            PassOutcome::Emitted(signal) => Some(signal),
            _ => None,
        }
    }

    /// Short label for diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            PassOutcome::Warmup { .. } => "warmup",
            PassOutcome::MacroNeutral => "macro_neutral",
            PassOutcome::Misaligned { .. } => "misaligned",
            PassOutcome::NoNearbyStructure { .. } => "no_nearby_structure",
            PassOutcome::BelowGate { .. } => "below_gate",
            PassOutcome::Skipped { .. } => "skipped",
            PassOutcome::Emitted(_) => "emitted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_emitting_outcomes_carry_no_signal() {
        let outcome = PassOutcome::BelowGate { score: 55.0 };
        assert!(outcome.signal().is_none());
        assert_eq!(outcome.label(), "below_gate");
        assert!(outcome.into_signal().is_none());
    }

    #[test]
    fn default_state_is_idle() {
        assert_eq!(CoordinatorState::default(), CoordinatorState::Idle);
    }
}
