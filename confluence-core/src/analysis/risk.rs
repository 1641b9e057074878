//! Risk planning: protective stop and a staged take-profit ladder.
//!
//! The stop starts at the previous bar's swing extreme and is pulled in to the
//! nearest same-side structure beyond the current bar, then pushed out by a
//! small buffer. Targets sit just short of opposing structures; without any,
//! they fall back to fixed multiples of the risk.

use crate::config::AnalyzerConfig;
use crate::domain::{Bar, RiskPlan, SignalDirection, Structure, TakeProfit, ZoneKind};

/// Close-out split when all three rungs are present.
pub const LADDER_PERCENTS: [u8; 3] = [50, 30, 20];

/// Risk multiples used when no opposing structure is available.
pub const FALLBACK_MULTIPLES: [f64; 3] = [2.0, 3.0, 4.0];

/// Buffers applied around stop and target levels, in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskParams {
    pub stop_buffer_percent: f64,
    pub target_offset_percent: f64,
}

impl Default for RiskParams {
    fn default() -> Self {
        Self {
            stop_buffer_percent: 0.3,
            target_offset_percent: 0.3,
        }
    }
}

impl From<&AnalyzerConfig> for RiskParams {
    fn from(config: &AnalyzerConfig) -> Self {
        Self {
            stop_buffer_percent: config.stop_buffer_percent,
            target_offset_percent: config.target_offset_percent,
        }
    }
}

/// Percent split for `n` targets: 50 to the first, 30 to the second, the
/// remainder to the last, so the split always totals 100.
pub fn ladder_percents(n: usize) -> Vec<u8> {
    match n {
        0 => Vec::new(),
        1 => vec![100],
        2 => vec![50, 50],
        _ => LADDER_PERCENTS.to_vec(),
    }
}

/// Derive a plan for an entry at `current.close`.
///
/// Returns `None` when the stop would not sit on the protective side of the
/// entry or the risk distance is zero.
pub fn plan_risk(
    direction: SignalDirection,
    current: &Bar,
    previous: &Bar,
    structures: &[Structure],
    params: &RiskParams,
) -> Option<RiskPlan> {
    let entry = current.close;
    let stop = stop_loss(direction, current, previous, structures, params);
    if !(entry.is_finite() && stop.is_finite()) {
        return None;
    }
    let protected = match direction {
        SignalDirection::Long => stop < entry,
        SignalDirection::Short => stop > entry,
    };
    if !protected {
        return None;
    }
    let risk = (entry - stop).abs();

    let structure_prices = structure_targets(direction, entry, structures, params);
    let targets: Vec<TakeProfit> = if structure_prices.is_empty() {
        FALLBACK_MULTIPLES
            .iter()
            .zip(LADDER_PERCENTS)
            .map(|(multiple, percent)| TakeProfit {
                price: match direction {
                    SignalDirection::Long => entry + risk * multiple,
                    SignalDirection::Short => entry - risk * multiple,
                },
                percent,
            })
            .collect()
    } else {
        let percents = ladder_percents(structure_prices.len());
        structure_prices
            .into_iter()
            .zip(percents)
            .map(|(price, percent)| TakeProfit { price, percent })
            .collect()
    };

    let weighted_target: f64 = targets
        .iter()
        .map(|t| t.price * f64::from(t.percent) / 100.0)
        .sum();
    let risk_reward = (weighted_target - entry).abs() / risk;

    Some(RiskPlan {
        entry,
        stop_loss: stop,
        targets,
        risk_reward,
    })
}

fn stop_loss(
    direction: SignalDirection,
    current: &Bar,
    previous: &Bar,
    structures: &[Structure],
    params: &RiskParams,
) -> f64 {
    let buffer = params.stop_buffer_percent / 100.0;
    match direction {
        SignalDirection::Long => {
            let protective = structures
                .iter()
                .filter(|s| s.kind() == ZoneKind::Bullish)
                .map(Structure::low)
                .filter(|&bound| bound < current.low)
                .max_by(f64::total_cmp);
            let level = match protective {
                Some(bound) if bound > previous.low => bound,
                _ => previous.low,
            };
            level * (1.0 - buffer)
        }
        SignalDirection::Short => {
            let protective = structures
                .iter()
                .filter(|s| s.kind() == ZoneKind::Bearish)
                .map(Structure::high)
                .filter(|&bound| bound > current.high)
                .min_by(f64::total_cmp);
            let level = match protective {
                Some(bound) if bound < previous.high => bound,
                _ => previous.high,
            };
            level * (1.0 + buffer)
        }
    }
}

/// Up to three target prices from opposing structures, nearest first.
fn structure_targets(
    direction: SignalDirection,
    entry: f64,
    structures: &[Structure],
    params: &RiskParams,
) -> Vec<f64> {
    let offset = params.target_offset_percent / 100.0;
    let mut prices: Vec<f64> = match direction {
        SignalDirection::Long => structures
            .iter()
            .filter(|s| s.kind() == ZoneKind::Bearish)
            .map(|s| s.low() * (1.0 - offset))
            .filter(|&p| p > entry)
            .collect(),
        SignalDirection::Short => structures
            .iter()
            .filter(|s| s.kind() == ZoneKind::Bullish)
            .map(|s| s.high() * (1.0 + offset))
            .filter(|&p| p < entry)
            .collect(),
    };
    prices.sort_by(|a, b| (a - entry).abs().total_cmp(&(b - entry).abs()));
    prices.dedup();
    prices.truncate(LADDER_PERCENTS.len());
    prices
}
