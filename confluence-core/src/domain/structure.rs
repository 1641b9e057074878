//! Market structure: trend labels, order blocks and fair value gaps.
//!
//! Structures are recomputed from the buffers on every analysis pass. They are
//! never stored between passes and never mutated after detection: a pass either
//! finds a zone valid against the latest close or does not surface it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Resolution;

/// Directional label produced by the trend classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

impl Trend {
    pub fn is_neutral(&self) -> bool {
        matches!(self, Trend::Neutral)
    }

    /// Zone kind that supports this trend (bullish for Up, bearish for Down).
    pub fn supporting_kind(&self) -> Option<ZoneKind> {
        match self {
            Trend::Up => Some(ZoneKind::Bullish),
            Trend::Down => Some(ZoneKind::Bearish),
            Trend::Neutral => None,
        }
    }
}

/// Side a zone favours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneKind {
    Bullish,
    Bearish,
}

impl ZoneKind {
    pub fn opposite(&self) -> Self {
        match self {
            ZoneKind::Bullish => ZoneKind::Bearish,
            ZoneKind::Bearish => ZoneKind::Bullish,
        }
    }
}

/// Price zone around a high-volume reversal bar.
///
/// Bullish blocks span `[bar low, body midpoint]` and sit below price; bearish
/// blocks span `[body midpoint, bar high]` and sit above it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderBlock {
    pub kind: ZoneKind,
    pub low: f64,
    pub high: f64,
    pub volume: f64,
    /// 0 to 100.
    pub strength: f64,
    pub formed_at: DateTime<Utc>,
    pub resolution: Resolution,
}

impl OrderBlock {
    /// A bullish block dies once price closes below its upper bound, a bearish
    /// block once price closes above its lower bound.
    pub fn is_valid(&self, close: f64) -> bool {
        match self.kind {
            ZoneKind::Bullish => close >= self.high,
            ZoneKind::Bearish => close <= self.low,
        }
    }
}

/// Price interval skipped by a fast move, expected to be revisited.
///
/// A bullish gap is left above price by a sharp drop and is filled once price
/// trades back up through its upper bound; bearish gaps mirror this below.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FairValueGap {
    pub kind: ZoneKind,
    pub low: f64,
    pub high: f64,
    /// Gap width as a percent of the gap midpoint.
    pub strength: f64,
    pub formed_at: DateTime<Utc>,
    pub resolution: Resolution,
}

impl FairValueGap {
    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    pub fn is_valid(&self, close: f64) -> bool {
        match self.kind {
            ZoneKind::Bullish => close < self.high,
            ZoneKind::Bearish => close > self.low,
        }
    }
}

/// Either kind of detected zone, with the accessors shared by both.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Structure {
    OrderBlock(OrderBlock),
    FairValueGap(FairValueGap),
}

impl Structure {
    pub fn kind(&self) -> ZoneKind {
        match self {
            Structure::OrderBlock(ob) => ob.kind,
            Structure::FairValueGap(gap) => gap.kind,
        }
    }

    pub fn low(&self) -> f64 {
        match self {
            Structure::OrderBlock(ob) => ob.low,
            Structure::FairValueGap(gap) => gap.low,
        }
    }

    pub fn high(&self) -> f64 {
        match self {
            Structure::OrderBlock(ob) => ob.high,
            Structure::FairValueGap(gap) => gap.high,
        }
    }

    pub fn width(&self) -> f64 {
        self.high() - self.low()
    }

    pub fn mid(&self) -> f64 {
        (self.low() + self.high()) / 2.0
    }

    pub fn strength(&self) -> f64 {
        match self {
            Structure::OrderBlock(ob) => ob.strength,
            Structure::FairValueGap(gap) => gap.strength,
        }
    }

    pub fn resolution(&self) -> Resolution {
        match self {
            Structure::OrderBlock(ob) => ob.resolution,
            Structure::FairValueGap(gap) => gap.resolution,
        }
    }

    pub fn is_valid(&self, close: f64) -> bool {
        match self {
            Structure::OrderBlock(ob) => ob.is_valid(close),
            Structure::FairValueGap(gap) => gap.is_valid(close),
        }
    }
}

impl From<OrderBlock> for Structure {
    fn from(ob: OrderBlock) -> Self {
        Structure::OrderBlock(ob)
    }
}

impl From<FairValueGap> for Structure {
    fn from(gap: FairValueGap) -> Self {
        Structure::FairValueGap(gap)
    }
}
