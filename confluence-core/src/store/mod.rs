//! Per-resolution bar buffers.

mod ring;

use crate::config::{AnalyzerConfig, BACKFILL_MARGIN};
use crate::domain::{Bar, BarError, PerResolution, Resolution};
use ring::BarRing;

/// One ring buffer of closed bars per resolution.
///
/// Not safe under concurrent writers; callers feed bars one at a time in
/// arrival order.
#[derive(Debug, Clone)]
pub struct BarStore {
    rings: PerResolution<BarRing>,
}

impl BarStore {
    /// Build buffers sized from the configured capacities.
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self::with_capacities(PerResolution::from_fn(|r| config.resolution(r).capacity))
    }

    /// Build buffers with explicit capacities. A zero capacity is raised to one.
    pub fn with_capacities(capacities: PerResolution<usize>) -> Self {
        Self {
            rings: PerResolution::from_fn(|r| BarRing::new(capacities[r])),
        }
    }

    /// Insert a closed bar at the tail, evicting the oldest bar when full.
    ///
    /// Returns the evicted bar, if any. Open, malformed and mis-tagged bars are
    /// refused and leave the buffer untouched.
    pub fn append(&mut self, resolution: Resolution, bar: Bar) -> Result<Option<Bar>, BarError> {
        if bar.resolution != resolution {
            return Err(BarError::ResolutionMismatch {
                expected: resolution,
                actual: bar.resolution,
            });
        }
        if !bar.closed {
            return Err(BarError::NotClosed {
                open_time: bar.open_time,
            });
        }
        if !bar.is_sane() {
            return Err(BarError::Malformed {
                open_time: bar.open_time,
            });
        }
        Ok(self.rings[resolution].push(bar))
    }

    /// Buffered bars, oldest first.
    pub fn snapshot(&self, resolution: Resolution) -> Vec<Bar> {
        self.rings[resolution].iter().copied().collect()
    }

    pub fn latest(&self, resolution: Resolution) -> Option<&Bar> {
        self.rings[resolution].latest()
    }

    pub fn len(&self, resolution: Resolution) -> usize {
        self.rings[resolution].len()
    }

    pub fn is_empty(&self, resolution: Resolution) -> bool {
        self.len(resolution) == 0
    }

    pub fn capacity(&self, resolution: Resolution) -> usize {
        self.rings[resolution].capacity()
    }

    /// Bars a backfill should request to fill this buffer: capacity plus margin.
    pub fn required_count(&self, resolution: Resolution) -> usize {
        self.capacity(resolution) + BACKFILL_MARGIN
    }

    /// First resolution holding fewer bars than `minimum` demands, if any.
    pub fn first_short(&self, minimum: impl Fn(Resolution) -> usize) -> Option<Resolution> {
        Resolution::ALL
            .into_iter()
            .find(|&r| self.len(r) < minimum(r))
    }
}
