//! Order-block detection.
//!
//! A 5-bar window slides over the last `max_lookback` bars. The middle bar is a
//! candidate when the 3-bar close trend into it and the 3-bar close trend out of
//! it are opposite: a drop then a rally marks a bullish block, a rally then a
//! drop a bearish one. Candidates must carry outsized volume and a large enough
//! move away from the bar.

use crate::config::ThresholdSet;
use crate::domain::{Bar, OrderBlock, Trend, ZoneKind};

use super::{mean, pct_change};

/// Bars per detection window.
pub const WINDOW: usize = 5;

/// Close-to-close percent change needed for a 3-bar mini trend.
pub const MINI_TREND_PERCENT: f64 = 0.5;

/// Close trend between two bars, with the percent move.
fn mini_trend(from: &Bar, to: &Bar) -> Option<(Trend, f64)> {
    let change = pct_change(from.close, to.close)?;
    let trend = if change >= MINI_TREND_PERCENT {
        Trend::Up
    } else if change <= -MINI_TREND_PERCENT {
        Trend::Down
    } else {
        Trend::Neutral
    };
    Some((trend, change))
}

/// Find order blocks still valid against the latest close.
///
/// Results are sorted by strength, strongest first, and capped at
/// `max_results`. Fewer than [`WINDOW`] bars yields nothing.
pub fn detect_order_blocks(
    bars: &[Bar],
    thresholds: &ThresholdSet,
    max_results: usize,
) -> Vec<OrderBlock> {
    let Some(latest) = bars.last() else {
        return Vec::new();
    };
    if bars.len() < WINDOW {
        return Vec::new();
    }

    let start = bars.len().saturating_sub(thresholds.max_lookback.max(WINDOW));
    let lookback = &bars[start..];

    let Some(avg_volume) = mean(lookback.iter().map(|b| b.volume)) else {
        return Vec::new();
    };
    if !(avg_volume.is_finite() && avg_volume > 0.0) {
        return Vec::new();
    }
    let min_volume = avg_volume * thresholds.min_volume_magnitude;

    let mut blocks = Vec::new();
    for w in lookback.windows(WINDOW) {
        let (Some((before, _)), Some((after, rejection))) =
            (mini_trend(&w[0], &w[2]), mini_trend(&w[2], &w[4]))
        else {
            continue;
        };
        let kind = match (before, after) {
            (Trend::Down, Trend::Up) => ZoneKind::Bullish,
            (Trend::Up, Trend::Down) => ZoneKind::Bearish,
            _ => continue,
        };

        let candidate = &w[2];
        if candidate.volume <= min_volume {
            continue;
        }
        if rejection.abs() < thresholds.min_price_rejection_percent {
            continue;
        }

        let range = candidate.range();
        if range <= 0.0 {
            continue;
        }
        let (low, high) = match kind {
            ZoneKind::Bullish => (candidate.low, candidate.body_mid()),
            ZoneKind::Bearish => (candidate.body_mid(), candidate.high),
        };
        if high <= low {
            continue;
        }

        let block = OrderBlock {
            kind,
            low,
            high,
            volume: candidate.volume,
            strength: strength(candidate, avg_volume, thresholds.structure_weight),
            formed_at: candidate.open_time,
            resolution: candidate.resolution,
        };
        if block.is_valid(latest.close) {
            blocks.push(block);
        }
    }

    blocks.sort_by(|a, b| b.strength.total_cmp(&a.strength));
    blocks.truncate(max_results);
    blocks
}

/// 50 + 10 per unit of excess volume ratio + up to 20 for body dominance,
/// scaled by the resolution weight and clamped to 0..=100.
fn strength(candidate: &Bar, avg_volume: f64, weight: f64) -> f64 {
    let volume_ratio = candidate.volume / avg_volume;
    let body_ratio = candidate.body() / candidate.range();
    let raw = (50.0 + (volume_ratio - 1.0) * 10.0 + body_ratio * 20.0) * weight;
    if raw.is_nan() {
        return 0.0;
    }
    raw.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::assert_approx;
    use crate::domain::bar::test_bar;
    use crate::domain::Resolution;

    /// Bars from closes: open = previous close, wicks 0.5 beyond the body.
    fn series(closes: &[f64], volumes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .zip(volumes)
            .enumerate()
            .map(|(i, (&close, &volume))| {
                let open = if i == 0 { close } else { closes[i - 1] };
                let high = open.max(close) + 0.5;
                let low = open.min(close) - 0.5;
                test_bar(Resolution::Macro, i as i64, open, high, low, close, volume)
            })
            .collect()
    }

    fn thresholds() -> ThresholdSet {
        ThresholdSet {
            structure_weight: 1.0,
            ..ThresholdSet::defaults_for(Resolution::Macro)
        }
    }

    const VOLUMES: [f64; 7] = [100.0, 100.0, 100.0, 400.0, 100.0, 100.0, 100.0];

    #[test]
    fn detects_bullish_block_after_drop_and_rally() {
        let bars = series(&[100.0, 100.0, 99.0, 98.0, 99.5, 101.0, 102.0], &VOLUMES);
        let blocks = detect_order_blocks(&bars, &thresholds(), 10);
        assert_eq!(blocks.len(), 1);
        let ob = blocks[0];
        assert_eq!(ob.kind, ZoneKind::Bullish);
        assert_eq!(ob.low, 97.5);
        assert_eq!(ob.high, 98.5);
        assert_eq!(ob.volume, 400.0);
        assert_eq!(ob.resolution, Resolution::Macro);
        assert_eq!(ob.formed_at, bars[3].open_time);
        // ratio 2.8 -> 68, body/range 0.5 -> +10
        assert_approx(ob.strength, 78.0, 1e-9);
    }

    #[test]
    fn detects_bearish_block_after_rally_and_drop() {
        let bars = series(&[100.0, 100.0, 101.0, 102.0, 100.5, 99.0, 98.0], &VOLUMES);
        let blocks = detect_order_blocks(&bars, &thresholds(), 10);
        assert_eq!(blocks.len(), 1);
        let ob = blocks[0];
        assert_eq!(ob.kind, ZoneKind::Bearish);
        assert_eq!(ob.low, 101.5);
        assert_eq!(ob.high, 102.5);
    }

    #[test]
    fn weight_scales_and_clamps_strength() {
        let bars = series(&[100.0, 100.0, 99.0, 98.0, 99.5, 101.0, 102.0], &VOLUMES);
        let t = ThresholdSet {
            structure_weight: 1.3,
            ..thresholds()
        };
        let blocks = detect_order_blocks(&bars, &t, 10);
        assert_eq!(blocks[0].strength, 100.0);
    }

    #[test]
    fn ordinary_volume_is_rejected() {
        let mut volumes = VOLUMES;
        volumes[3] = 150.0;
        let bars = series(&[100.0, 100.0, 99.0, 98.0, 99.5, 101.0, 102.0], &volumes);
        assert!(detect_order_blocks(&bars, &thresholds(), 10).is_empty());
    }

    #[test]
    fn weak_rejection_is_rejected() {
        let bars = series(&[100.0, 100.0, 99.0, 98.0, 99.5, 101.0, 102.0], &VOLUMES);
        let t = ThresholdSet {
            min_price_rejection_percent: 5.0,
            ..thresholds()
        };
        assert!(detect_order_blocks(&bars, &t, 10).is_empty());
    }

    #[test]
    fn block_invalidated_by_latest_close_is_dropped() {
        let bars = series(&[100.0, 100.0, 99.0, 98.0, 99.5, 101.0, 98.2], &VOLUMES);
        assert!(detect_order_blocks(&bars, &thresholds(), 10).is_empty());
    }

    #[test]
    fn lookback_limits_scan() {
        let bars = series(&[100.0, 100.0, 99.0, 98.0, 99.5, 101.0, 102.0], &VOLUMES);
        let t = ThresholdSet {
            max_lookback: 5,
            ..thresholds()
        };
        assert!(detect_order_blocks(&bars, &t, 10).is_empty());
    }

    #[test]
    fn sorted_by_strength_and_capped() {
        let closes = [
            100.0, 100.0, 99.0, 98.0, 99.5, 101.0, 100.0, 99.0, 99.5, 101.5, 103.0,
        ];
        let mut volumes = [100.0; 11];
        volumes[3] = 400.0;
        volumes[7] = 800.0;
        let bars = series(&closes, &volumes);

        let blocks = detect_order_blocks(&bars, &thresholds(), 10);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].volume, 800.0);
        assert_eq!(blocks[1].volume, 400.0);
        assert!(blocks[0].strength >= blocks[1].strength);

        let capped = detect_order_blocks(&bars, &thresholds(), 1);
        assert_eq!(capped.len(), 1);
        assert_eq!(capped[0].volume, 800.0);
    }

    #[test]
    fn too_few_bars_yield_nothing() {
        let bars = series(&[100.0, 99.0, 98.0, 99.5], &[100.0, 100.0, 400.0, 100.0]);
        assert!(detect_order_blocks(&bars, &thresholds(), 10).is_empty());
        assert!(detect_order_blocks(&[], &thresholds(), 10).is_empty());
    }

    #[test]
    fn zero_volume_yields_nothing() {
        let bars = series(&[100.0, 100.0, 99.0, 98.0, 99.5, 101.0, 102.0], &[0.0; 7]);
        assert!(detect_order_blocks(&bars, &thresholds(), 10).is_empty());
    }
}
