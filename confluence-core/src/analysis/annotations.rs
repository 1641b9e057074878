//! Market-state notes describing the bar that triggered a signal.

use crate::config::AnnotationConfig;
use crate::domain::{Annotation, Bar};

use super::mean;

/// Notes for the latest bar of `bars` (oldest first): volume regime against
/// the buffer mean, candle-body dominance, and proximity to a round level.
pub fn annotate(bars: &[Bar], config: &AnnotationConfig) -> Vec<Annotation> {
    let Some(current) = bars.last() else {
        return Vec::new();
    };
    let mut notes = Vec::new();

    if let Some(avg) = mean(bars.iter().map(|b| b.volume)).filter(|v| *v > 0.0) {
        let ratio = current.volume / avg;
        if ratio >= config.high_volume_ratio {
            notes.push(Annotation::HighVolume { ratio });
        } else if ratio <= config.low_volume_ratio {
            notes.push(Annotation::LowVolume { ratio });
        }
    }

    let range = current.range();
    if range > 0.0 {
        let body_ratio = current.body() / range;
        if body_ratio >= config.strong_body_ratio {
            if current.is_bullish() {
                notes.push(Annotation::StrongBullishBody { body_ratio });
            } else if current.is_bearish() {
                notes.push(Annotation::StrongBearishBody { body_ratio });
            }
        } else if body_ratio <= config.indecision_body_ratio {
            notes.push(Annotation::Indecision { body_ratio });
        }
    }

    if let Some((level, distance_percent)) = nearest_round_level(current.close) {
        if distance_percent <= config.round_level_percent {
            notes.push(Annotation::NearRoundLevel {
                level,
                distance_percent,
            });
        }
    }

    notes
}

/// Nearest multiple of one order of magnitude below the price's leading digit
/// (10 for prices in the hundreds, 1000 in the tens of thousands), with the
/// distance as a percent of price.
pub fn nearest_round_level(price: f64) -> Option<(f64, f64)> {
    if !(price.is_finite() && price > 0.0) {
        return None;
    }
    let step = 10f64.powi(price.log10().floor() as i32 - 1);
    let level = (price / step).round() * step;
    Some((level, (price - level).abs() / price * 100.0))
}
