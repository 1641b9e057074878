//! Bar: the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Resolution;

/// OHLCV bar for one resolution of the tracked instrument.
///
/// Only bars with `closed == true` enter the analyzer. Once closed a bar is
/// never modified, so it is `Copy` and buffers hold it by value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub resolution: Resolution,
    pub open_time: DateTime<Utc>,
    pub close_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub trades: u64,
    pub closed: bool,
}

impl Bar {
    /// Returns true if any price or volume field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite())
    }

    /// Basic OHLCV sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.low > 0.0
            && self.volume >= 0.0
    }

    /// High minus low.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Absolute open-to-close distance.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Midpoint of the open/close body.
    pub fn body_mid(&self) -> f64 {
        (self.open + self.close) / 2.0
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Why a bar was refused at the door of the bar store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("bar opened at {open_time} is not closed yet")]
    NotClosed { open_time: DateTime<Utc> },
    #[error("malformed bar opened at {open_time}: OHLCV fails sanity checks")]
    Malformed { open_time: DateTime<Utc> },
    #[error("bar tagged {actual} submitted to the {expected} buffer")]
    ResolutionMismatch {
        expected: Resolution,
        actual: Resolution,
    },
}

/// Build a closed bar for tests. Bars are spaced one minute apart by `index`.
#[cfg(test)]
pub(crate) fn test_bar(
    resolution: Resolution,
    index: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
) -> Bar {
    let base = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
    Bar {
        resolution,
        open_time: base + chrono::Duration::minutes(index),
        close_time: base + chrono::Duration::minutes(index + 1) - chrono::Duration::milliseconds(1),
        open,
        high,
        low,
        close,
        volume,
        trades: 100,
        closed: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> Bar {
        test_bar(Resolution::Micro, 0, 100.0, 105.0, 98.0, 103.0, 50_000.0)
    }

    #[test]
    fn bar_is_sane() {
        assert!(sample_bar().is_sane());
    }

    #[test]
    fn bar_detects_void() {
        let mut bar = sample_bar();
        bar.open = f64::NAN;
        assert!(bar.is_void());
        assert!(!bar.is_sane());

        let mut bar = sample_bar();
        bar.volume = f64::INFINITY;
        assert!(bar.is_void());
    }

    #[test]
    fn bar_detects_insane_high_low() {
        let mut bar = sample_bar();
        bar.high = 97.0; // below low
        assert!(!bar.is_sane());
    }

    #[test]
    fn body_and_range() {
        let bar = sample_bar();
        assert_eq!(bar.range(), 7.0);
        assert_eq!(bar.body(), 3.0);
        assert_eq!(bar.body_mid(), 101.5);
        assert!(bar.is_bullish());
        assert!(!bar.is_bearish());
    }

    #[test]
    fn bar_deserializes_from_json() {
        let json = r#"{
            "resolution": "macro",
            "open_time": "2024-03-01T00:00:00Z",
            "close_time": "2024-03-01T03:59:59.999Z",
            "open": 100.0, "high": 101.0, "low": 99.0, "close": 100.5,
            "volume": 1234.5, "trades": 42, "closed": true
        }"#;
        let bar: Bar = serde_json::from_str(json).unwrap();
        assert_eq!(bar.resolution, Resolution::Macro);
        assert_eq!(bar.trades, 42);
        assert!(bar.closed);
        assert!(bar.is_sane());
    }
}
