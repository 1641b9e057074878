//! Trend classification from the three most recent bars.
//!
//! Up requires strictly rising highs and lows with each high-to-high step of at
//! least `min_price_change_percent`, Down the mirror on lows, and both require
//! the current volume to stand out against the recent mean.

use crate::config::ThresholdSet;
use crate::domain::{Bar, Trend};

use super::{mean, pct_change};

/// Bars averaged for the volume ratio, current bar included.
pub const VOLUME_WINDOW: usize = 5;

/// Classify the trend of a resolution's buffered bars (oldest first).
///
/// Returns Neutral when fewer than `max(3, min_swing_points)` bars are
/// available or the inputs are degenerate.
pub fn classify_trend(bars: &[Bar], thresholds: &ThresholdSet) -> Trend {
    let required = thresholds.min_swing_points.max(3);
    if bars.len() < required {
        return Trend::Neutral;
    }
    let n = bars.len();
    let (pre, prev, cur) = (&bars[n - 3], &bars[n - 2], &bars[n - 1]);

    let Some(volume_ratio) = volume_ratio(bars) else {
        return Trend::Neutral;
    };
    if volume_ratio < thresholds.min_volume_multiplier {
        return Trend::Neutral;
    }

    let min_change = thresholds.min_price_change_percent;

    let rising = cur.high > prev.high
        && prev.high > pre.high
        && cur.low > prev.low
        && prev.low > pre.low;
    if rising {
        let (Some(first), Some(second)) =
            (pct_change(pre.high, prev.high), pct_change(prev.high, cur.high))
        else {
            return Trend::Neutral;
        };
        if first >= min_change && second >= min_change {
            return Trend::Up;
        }
    }

    let falling = cur.high < prev.high
        && prev.high < pre.high
        && cur.low < prev.low
        && prev.low < pre.low;
    if falling {
        let (Some(first), Some(second)) =
            (pct_change(pre.low, prev.low), pct_change(prev.low, cur.low))
        else {
            return Trend::Neutral;
        };
        if -first >= min_change && -second >= min_change {
            return Trend::Down;
        }
    }

    Trend::Neutral
}

/// Current volume over the mean volume of the last [`VOLUME_WINDOW`] bars.
pub fn volume_ratio(bars: &[Bar]) -> Option<f64> {
    let cur = bars.last()?;
    let start = bars.len().saturating_sub(VOLUME_WINDOW);
    let avg = mean(bars[start..].iter().map(|b| b.volume))?;
    if !(avg.is_finite() && avg > 0.0) {
        return None;
    }
    Some(cur.volume / avg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::assert_approx;
    use crate::domain::bar::test_bar;
    use crate::domain::Resolution;

    fn thresholds() -> ThresholdSet {
        ThresholdSet {
            min_price_change_percent: 1.0,
            min_volume_multiplier: 1.5,
            ..ThresholdSet::defaults_for(Resolution::Macro)
        }
    }

    fn bars(highs: [f64; 3], lows: [f64; 3], volumes: [f64; 3]) -> Vec<Bar> {
        (0..3)
            .map(|i| {
                let mid = (highs[i] + lows[i]) / 2.0;
                test_bar(Resolution::Macro, i as i64, mid, highs[i], lows[i], mid, volumes[i])
            })
            .collect()
    }

    #[test]
    fn rising_highs_and_lows_with_volume_is_up() {
        // mean(100, 100, 250) = 150, ratio = 1.667
        let b = bars([100.0, 102.0, 104.0], [95.0, 97.0, 99.0], [100.0, 100.0, 250.0]);
        assert_eq!(classify_trend(&b, &thresholds()), Trend::Up);
    }

    #[test]
    fn same_pattern_without_volume_is_neutral() {
        let b = bars([100.0, 102.0, 104.0], [95.0, 97.0, 99.0], [100.0, 100.0, 100.0]);
        assert_eq!(classify_trend(&b, &thresholds()), Trend::Neutral);
    }

    #[test]
    fn falling_highs_and_lows_with_volume_is_down() {
        let b = bars([104.0, 102.0, 100.0], [99.0, 97.0, 95.0], [100.0, 100.0, 250.0]);
        assert_eq!(classify_trend(&b, &thresholds()), Trend::Down);
    }

    #[test]
    fn small_steps_are_neutral() {
        // +0.5% per step, below the 1% threshold
        let b = bars([100.0, 100.5, 101.0025], [95.0, 96.0, 97.0], [100.0, 100.0, 250.0]);
        assert_eq!(classify_trend(&b, &thresholds()), Trend::Neutral);
    }

    #[test]
    fn mixed_highs_and_lows_are_neutral() {
        let b = bars([100.0, 102.0, 104.0], [95.0, 94.0, 99.0], [100.0, 100.0, 250.0]);
        assert_eq!(classify_trend(&b, &thresholds()), Trend::Neutral);
    }

    #[test]
    fn fewer_than_three_bars_is_neutral() {
        let b = bars([100.0, 102.0, 104.0], [95.0, 97.0, 99.0], [100.0, 100.0, 250.0]);
        assert_eq!(classify_trend(&b[1..], &thresholds()), Trend::Neutral);
    }

    #[test]
    fn swing_point_requirement_extends_minimum() {
        let b = bars([100.0, 102.0, 104.0], [95.0, 97.0, 99.0], [100.0, 100.0, 250.0]);
        let t = ThresholdSet {
            min_swing_points: 4,
            ..thresholds()
        };
        assert_eq!(classify_trend(&b, &t), Trend::Neutral);
    }

    #[test]
    fn zero_volume_is_neutral() {
        let b = bars([100.0, 102.0, 104.0], [95.0, 97.0, 99.0], [0.0, 0.0, 0.0]);
        assert_eq!(classify_trend(&b, &thresholds()), Trend::Neutral);
    }

    #[test]
    fn volume_ratio_uses_last_five_bars() {
        let b: Vec<Bar> = [50.0, 100.0, 100.0, 100.0, 100.0, 225.0]
            .iter()
            .enumerate()
            .map(|(i, &v)| test_bar(Resolution::Meso, i as i64, 10.0, 11.0, 9.0, 10.0, v))
            .collect();
        // mean(100, 100, 100, 100, 225) = 125
        assert_approx(volume_ratio(&b).unwrap(), 1.8, 1e-12);
    }

    #[test]
    fn classification_is_deterministic() {
        let b = bars([100.0, 102.0, 104.0], [95.0, 97.0, 99.0], [100.0, 100.0, 250.0]);
        let t = thresholds();
        let first = classify_trend(&b, &t);
        for _ in 0..10 {
            assert_eq!(classify_trend(&b, &t), first);
        }
    }
}
