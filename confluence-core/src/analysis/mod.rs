//! Pure analysis stages run by the coordinator on every pass.
//!
//! Nothing here holds state between passes. Each function takes buffered bars
//! and thresholds and returns values; degenerate numeric inputs (zero range,
//! zero volume, non-positive prices) make a candidate drop out instead of
//! producing NaN or infinite scores.

pub mod annotations;
pub mod fair_value_gap;
pub mod order_block;
pub mod risk;
pub mod scoring;
pub mod trend;

pub use annotations::annotate;
pub use fair_value_gap::detect_fair_value_gaps;
pub use order_block::detect_order_blocks;
pub use risk::{plan_risk, RiskParams};
pub use scoring::{find_nearby, score_confluence, NearbyStructure};
pub use trend::classify_trend;

/// Percent change from `from` to `to`, or `None` if `from` is not a usable base.
pub(crate) fn pct_change(from: f64, to: f64) -> Option<f64> {
    if !(from.is_finite() && to.is_finite()) || from <= 0.0 {
        return None;
    }
    Some((to - from) / from * 100.0)
}

/// Arithmetic mean, `None` for an empty input.
pub(crate) fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub(crate) fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pct_change_guards_bad_base() {
        assert_eq!(pct_change(100.0, 102.0), Some(2.0));
        assert_eq!(pct_change(0.0, 1.0), None);
        assert_eq!(pct_change(f64::NAN, 1.0), None);
    }

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(mean(Vec::<f64>::new()), None);
        assert_eq!(mean(vec![1.0, 2.0, 3.0]), Some(2.0));
    }
}
