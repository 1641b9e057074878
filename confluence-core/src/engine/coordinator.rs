//! Top-down multi-timeframe coordinator.
//!
//! Every accepted bar triggers one synchronous pass:
//! 1. All buffers must hold their minimum bar count.
//! 2. Macro trend must be directional.
//! 3. Meso trend must agree with macro.
//! 4. Order blocks and gaps are detected on macro and meso.
//! 5. The micro close must sit near a structure supporting the trend.
//! 6. Confluence must clear the emission gate and the risk plan must be sound.
//!
//! Detection only runs once step 3 passes. A pass never blocks, never logs and
//! leaves the buffers intact whatever it concludes.

use crate::analysis::{
    annotate, classify_trend, detect_fair_value_gaps, detect_order_blocks, find_nearby,
    plan_risk, score_confluence, RiskParams,
};
use crate::config::{AnalyzerConfig, ConfigError, ThresholdSet};
use crate::domain::{Bar, BarError, Resolution, Signal, SignalDirection, Structure};
use crate::store::BarStore;

use super::emitter::{SignalEmitter, SignalSink};
use super::outcome::{CoordinatorState, PassOutcome, SkipReason};

/// Stateful analysis pipeline for one instrument.
///
/// Callers must serialize access: one bar at a time, in arrival order.
#[derive(Debug)]
pub struct Analyzer {
    config: AnalyzerConfig,
    config_id: String,
    store: BarStore,
    state: CoordinatorState,
    last_structures: Vec<Structure>,
    emitter: SignalEmitter,
}

impl Analyzer {
    /// Validate `config` and build empty buffers from it.
    pub fn new(config: AnalyzerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config_id: config.fingerprint(),
            store: BarStore::new(&config),
            config,
            state: CoordinatorState::Idle,
            last_structures: Vec::new(),
            emitter: SignalEmitter::new(),
        })
    }

    pub fn subscribe(&mut self, sink: impl SignalSink + 'static) {
        self.emitter.subscribe(sink);
    }

    /// Buffer a closed bar and run one pass.
    ///
    /// Open, malformed or mis-tagged bars are refused before touching any
    /// buffer and no pass runs.
    pub fn submit_bar(&mut self, bar: Bar) -> Result<PassOutcome, BarError> {
        self.store.append(bar.resolution, bar)?;
        Ok(self.run_pass())
    }

    /// Bars a historical backfill should fetch for `resolution`.
    pub fn required_bar_count(&self, resolution: Resolution) -> usize {
        self.store.required_count(resolution)
    }

    /// Furthest state reached by the most recent pass.
    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    /// Structures surfaced by the most recent pass that reached detection.
    pub fn last_structures(&self) -> &[Structure] {
        &self.last_structures
    }

    pub fn store(&self) -> &BarStore {
        &self.store
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn config_id(&self) -> &str {
        &self.config_id
    }

    fn run_pass(&mut self) -> PassOutcome {
        self.state = CoordinatorState::Idle;
        self.last_structures.clear();

        let config = &self.config;
        if let Some(resolution) = self
            .store
            .first_short(|r| config.resolution(r).min_bars())
        {
            return PassOutcome::Warmup {
                resolution,
                have: self.store.len(resolution),
                need: config.resolution(resolution).min_bars(),
            };
        }

        let macro_bars = self.store.snapshot(Resolution::Macro);
        let macro_trend = classify_trend(&macro_bars, config.thresholds(Resolution::Macro));
        let (Some(kind), Some(direction)) = (
            macro_trend.supporting_kind(),
            SignalDirection::from_trend(macro_trend),
        ) else {
            return PassOutcome::MacroNeutral;
        };
        self.state = CoordinatorState::MacroReady;

        let meso_bars = self.store.snapshot(Resolution::Meso);
        let meso_trend = classify_trend(&meso_bars, config.thresholds(Resolution::Meso));
        if meso_trend != macro_trend {
            return PassOutcome::Misaligned {
                macro_trend,
                meso_trend,
            };
        }
        self.state = CoordinatorState::Aligned;

        let mut structures = detect_structures(
            &macro_bars,
            config.thresholds(Resolution::Macro),
            config.max_structures,
        );
        structures.extend(detect_structures(
            &meso_bars,
            config.thresholds(Resolution::Meso),
            config.max_structures,
        ));
        self.state = CoordinatorState::EntrySearch;

        let micro_bars = self.store.snapshot(Resolution::Micro);
        let [.., previous, current] = micro_bars.as_slice() else {
            return PassOutcome::Warmup {
                resolution: Resolution::Micro,
                have: micro_bars.len(),
                need: config.resolution(Resolution::Micro).min_bars(),
            };
        };

        let nearby = find_nearby(
            &structures,
            kind,
            current.close,
            config.proximity_buffer_ratio,
        );
        let surfaced = structures.len();
        self.last_structures = structures;
        if nearby.is_empty() {
            return PassOutcome::NoNearbyStructure {
                trend: macro_trend,
                surfaced,
            };
        }

        let score = score_confluence(&nearby);
        if score <= config.emission_gate {
            return PassOutcome::BelowGate { score };
        }

        let Some(plan) = plan_risk(
            direction,
            current,
            previous,
            &self.last_structures,
            &RiskParams::from(config),
        ) else {
            return PassOutcome::Skipped {
                reason: SkipReason::DegenerateRisk,
            };
        };

        let signal = Signal::new(
            current.close_time,
            direction,
            score,
            plan,
            annotate(&micro_bars, &config.annotations),
            self.config_id.clone(),
        );
        self.emitter.publish(&signal);
        PassOutcome::Emitted(signal)
    }
}

/// Order blocks then gaps for one resolution's bars.
fn detect_structures(bars: &[Bar], thresholds: &ThresholdSet, cap: usize) -> Vec<Structure> {
    detect_order_blocks(bars, thresholds, cap)
        .into_iter()
        .map(Structure::from)
        .chain(
            detect_fair_value_gaps(bars, thresholds, cap)
                .into_iter()
                .map(Structure::from),
        )
        .collect()
}
