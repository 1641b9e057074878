//! Entry proximity search and confluence scoring.

use serde::{Deserialize, Serialize};

use crate::domain::{Structure, ZoneKind};

use super::mean;

/// A structure close enough to the entry price to count towards confluence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NearbyStructure {
    pub structure: Structure,
    /// Distance from price to the structure midpoint, percent of price.
    pub distance_percent: f64,
}

/// Structures of `kind` whose interval, widened on both sides by
/// `buffer_ratio` of its width, contains `price`.
///
/// Zero-width structures and non-positive prices never match.
pub fn find_nearby(
    structures: &[Structure],
    kind: ZoneKind,
    price: f64,
    buffer_ratio: f64,
) -> Vec<NearbyStructure> {
    if !(price.is_finite() && price > 0.0) {
        return Vec::new();
    }
    structures
        .iter()
        .filter(|s| s.kind() == kind)
        .filter_map(|s| {
            let width = s.width();
            if !(width > 0.0) {
                return None;
            }
            let buffer = width * buffer_ratio;
            if price < s.low() - buffer || price > s.high() + buffer {
                return None;
            }
            Some(NearbyStructure {
                structure: *s,
                distance_percent: (price - s.mid()).abs() / price * 100.0,
            })
        })
        .collect()
}

/// Confluence score in 0..=100.
///
/// `50 + 5 * count - 2 * avg distance + avg gap strength / 2 + avg block
/// strength / 2`, with each average taken as 0 over an empty set.
pub fn score_confluence(nearby: &[NearbyStructure]) -> f64 {
    let count = nearby.len() as f64;
    let avg_distance = mean(nearby.iter().map(|n| n.distance_percent)).unwrap_or(0.0);
    let avg_gap = mean(nearby.iter().filter_map(|n| match n.structure {
        Structure::FairValueGap(gap) => Some(gap.strength),
        Structure::OrderBlock(_) => None,
    }))
    .unwrap_or(0.0);
    let avg_block = mean(nearby.iter().filter_map(|n| match n.structure {
        Structure::OrderBlock(ob) => Some(ob.strength),
        Structure::FairValueGap(_) => None,
    }))
    .unwrap_or(0.0);

    let score = 50.0 + 5.0 * count - 2.0 * avg_distance + avg_gap / 2.0 + avg_block / 2.0;
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 100.0)
}
