//! Signal and risk plan: the values handed to downstream collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Trend;

/// Directional intent of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalDirection {
    Long,
    Short,
}

impl SignalDirection {
    pub fn from_trend(trend: Trend) -> Option<Self> {
        match trend {
            Trend::Up => Some(SignalDirection::Long),
            Trend::Down => Some(SignalDirection::Short),
            Trend::Neutral => None,
        }
    }
}

/// One rung of the take-profit ladder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TakeProfit {
    pub price: f64,
    /// Share of the position closed at this target, in whole percent.
    pub percent: u8,
}

/// Entry, protective stop and staged targets for one signal.
///
/// Target percents always sum to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskPlan {
    pub entry: f64,
    pub stop_loss: f64,
    pub targets: Vec<TakeProfit>,
    pub risk_reward: f64,
}

impl RiskPlan {
    /// Distance between entry and stop (one R).
    pub fn risk(&self) -> f64 {
        (self.entry - self.stop_loss).abs()
    }

    pub fn total_percent(&self) -> u32 {
        self.targets.iter().map(|t| u32::from(t.percent)).sum()
    }
}

/// Human-readable market-state note attached to a signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "note", rename_all = "snake_case")]
pub enum Annotation {
    HighVolume { ratio: f64 },
    LowVolume { ratio: f64 },
    StrongBullishBody { body_ratio: f64 },
    StrongBearishBody { body_ratio: f64 },
    Indecision { body_ratio: f64 },
    NearRoundLevel { level: f64, distance_percent: f64 },
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Annotation::HighVolume { ratio } => write!(f, "high volume ({ratio:.2}x average)"),
            Annotation::LowVolume { ratio } => write!(f, "low volume ({ratio:.2}x average)"),
            Annotation::StrongBullishBody { body_ratio } => {
                write!(f, "strong bullish body ({:.0}% of range)", body_ratio * 100.0)
            }
            Annotation::StrongBearishBody { body_ratio } => {
                write!(f, "strong bearish body ({:.0}% of range)", body_ratio * 100.0)
            }
            Annotation::Indecision { body_ratio } => {
                write!(f, "indecision candle ({:.0}% body)", body_ratio * 100.0)
            }
            Annotation::NearRoundLevel {
                level,
                distance_percent,
            } => write!(f, "near round level {level} ({distance_percent:.2}% away)"),
        }
    }
}

/// A finalized trade signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Close time of the Micro bar that triggered the signal.
    pub timestamp: DateTime<Utc>,
    pub direction: SignalDirection,
    /// Confluence score, 0 to 100.
    pub score: f64,
    pub entry: f64,
    pub stop_loss: f64,
    pub targets: Vec<TakeProfit>,
    pub risk_reward: f64,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    /// Fingerprint of the analyzer configuration that produced this signal.
    pub config_id: String,
}

impl Signal {
    pub fn new(
        timestamp: DateTime<Utc>,
        direction: SignalDirection,
        score: f64,
        plan: RiskPlan,
        annotations: Vec<Annotation>,
        config_id: String,
    ) -> Self {
        Self {
            timestamp,
            direction,
            score,
            entry: plan.entry,
            stop_loss: plan.stop_loss,
            targets: plan.targets,
            risk_reward: plan.risk_reward,
            annotations,
            config_id,
        }
    }
}
