//! Fair-value-gap detection over consecutive bar triples.
//!
//! With bars (first, second, third) oldest to newest:
//! - bullish: second drops from first, third trades entirely below second
//!   (`second.low > third.high`) and closes above its open. The unfilled
//!   interval `[third.high, second.low]` sits above price.
//! - bearish: second rallies from first, third trades entirely above second
//!   (`second.high < third.low`) and closes below its open. The interval
//!   `[second.high, third.low]` sits below price.

use crate::config::ThresholdSet;
use crate::domain::{Bar, FairValueGap, ZoneKind};

use super::pct_change;

/// Bars required before gaps are searched at all.
pub const MIN_BARS: usize = 5;

/// Find gaps still open against the latest close, widest first, capped at
/// `max_results`.
pub fn detect_fair_value_gaps(
    bars: &[Bar],
    thresholds: &ThresholdSet,
    max_results: usize,
) -> Vec<FairValueGap> {
    let Some(latest) = bars.last() else {
        return Vec::new();
    };
    if bars.len() < MIN_BARS {
        return Vec::new();
    }

    let mut gaps = Vec::new();
    for w in bars.windows(3) {
        let (first, second, third) = (&w[0], &w[1], &w[2]);
        let Some(approach) = pct_change(first.close, second.close) else {
            continue;
        };

        let (kind, low, high) = if second.low > third.high && approach < 0.0 && third.is_bullish()
        {
            (ZoneKind::Bullish, third.high, second.low)
        } else if second.high < third.low && approach > 0.0 && third.is_bearish() {
            (ZoneKind::Bearish, second.high, third.low)
        } else {
            continue;
        };

        let mid = (low + high) / 2.0;
        if mid <= 0.0 {
            continue;
        }
        let strength = (high - low) / mid * 100.0;
        if !(strength > thresholds.min_gap_percent) {
            continue;
        }

        let gap = FairValueGap {
            kind,
            low,
            high,
            strength,
            formed_at: third.open_time,
            resolution: third.resolution,
        };
        if gap.is_valid(latest.close) {
            gaps.push(gap);
        }
    }

    gaps.sort_by(|a, b| b.width().total_cmp(&a.width()));
    gaps.truncate(max_results);
    gaps
}
