//! Analyzer configuration: per-resolution buffer sizes and threshold tables.
//!
//! The default tables are empirical tuning, not protocol constants. Every value
//! can be overridden from TOML; fields left out fall back to the defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::domain::{PerResolution, Resolution};

/// Extra bars a backfill request asks for beyond buffer capacity.
pub const BACKFILL_MARGIN: usize = 5;

/// Gating thresholds for one resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSet {
    /// Minimum high-to-high (or low-to-low) percent change for a trend.
    pub min_price_change_percent: f64,
    /// Minimum current volume relative to the mean of the last 5 bars.
    pub min_volume_multiplier: f64,
    /// Bars required before the trend classifier answers anything but Neutral.
    pub min_swing_points: usize,
    /// Order-block volume must exceed the lookback average times this.
    pub min_volume_magnitude: f64,
    /// Bars scanned for order blocks, also the window for average volume.
    pub max_lookback: usize,
    /// Minimum percent move away from an order block after it formed.
    pub min_price_rejection_percent: f64,
    /// Minimum fair-value-gap width as a percent of its midpoint.
    pub min_gap_percent: f64,
    /// Multiplier applied to order-block strength for this resolution.
    pub structure_weight: f64,
}

impl ThresholdSet {
    pub fn defaults_for(resolution: Resolution) -> Self {
        match resolution {
            Resolution::Macro => Self {
                min_price_change_percent: 0.5,
                min_volume_multiplier: 1.5,
                min_swing_points: 3,
                min_volume_magnitude: 1.5,
                max_lookback: 20,
                min_price_rejection_percent: 1.0,
                min_gap_percent: 0.3,
                structure_weight: 1.3,
            },
            Resolution::Meso => Self {
                min_price_change_percent: 0.3,
                min_volume_multiplier: 1.3,
                min_swing_points: 3,
                min_volume_magnitude: 1.3,
                max_lookback: 30,
                min_price_rejection_percent: 0.8,
                min_gap_percent: 0.2,
                structure_weight: 1.1,
            },
            Resolution::Micro => Self {
                min_price_change_percent: 0.2,
                min_volume_multiplier: 1.2,
                min_swing_points: 3,
                min_volume_magnitude: 1.2,
                max_lookback: 50,
                min_price_rejection_percent: 0.5,
                min_gap_percent: 0.1,
                structure_weight: 1.0,
            },
        }
    }
}

/// Buffer capacity and thresholds for one resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionConfig {
    pub capacity: usize,
    pub thresholds: ThresholdSet,
}

impl ResolutionConfig {
    pub fn defaults_for(resolution: Resolution) -> Self {
        let capacity = match resolution {
            Resolution::Macro => 50,
            Resolution::Meso => 50,
            Resolution::Micro => 100,
        };
        Self {
            capacity,
            thresholds: ThresholdSet::defaults_for(resolution),
        }
    }

    /// Bars needed before the resolution takes part in a pass.
    pub fn min_bars(&self) -> usize {
        self.thresholds.min_swing_points.max(3)
    }
}

/// Thresholds for the market-state notes attached to signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    pub high_volume_ratio: f64,
    pub low_volume_ratio: f64,
    pub strong_body_ratio: f64,
    pub indecision_body_ratio: f64,
    pub round_level_percent: f64,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            high_volume_ratio: 2.0,
            low_volume_ratio: 0.5,
            strong_body_ratio: 0.7,
            indecision_body_ratio: 0.3,
            round_level_percent: 0.2,
        }
    }
}

/// Complete analyzer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Scores must be strictly above this to emit.
    pub emission_gate: f64,
    /// Proximity buffer around a structure, as a fraction of its width.
    pub proximity_buffer_ratio: f64,
    /// Distance placed beyond the chosen stop level, in percent.
    pub stop_buffer_percent: f64,
    /// Distance kept short of a structure used as a target, in percent.
    pub target_offset_percent: f64,
    /// Cap on surfaced structures per detector and resolution.
    pub max_structures: usize,
    pub annotations: AnnotationConfig,
    pub resolutions: PerResolution<ResolutionConfig>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            emission_gate: 60.0,
            proximity_buffer_ratio: 0.1,
            stop_buffer_percent: 0.3,
            target_offset_percent: 0.3,
            max_structures: 10,
            annotations: AnnotationConfig::default(),
            resolutions: PerResolution::from_fn(ResolutionConfig::defaults_for),
        }
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config: {field} {reason}")]
    Invalid { field: String, reason: String },
}

impl AnalyzerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn resolution(&self, resolution: Resolution) -> &ResolutionConfig {
        &self.resolutions[resolution]
    }

    pub fn thresholds(&self, resolution: Resolution) -> &ThresholdSet {
        &self.resolutions[resolution].thresholds
    }

    /// Capacity plus the backfill margin.
    pub fn required_bar_count(&self, resolution: Resolution) -> usize {
        self.resolutions[resolution].capacity + BACKFILL_MARGIN
    }

    /// Deterministic identity of this configuration: the first 16 hex digits
    /// of a blake3 hash over its JSON rendering.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().as_str()[..16].to_string()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (resolution, rc) in self.resolutions.iter() {
            let prefix = format!("resolutions.{resolution}");
            if rc.capacity < 5 {
                return Err(invalid(
                    format!("{prefix}.capacity"),
                    "must hold at least 5 bars for structure detection",
                ));
            }
            let t = &rc.thresholds;
            if t.min_swing_points > rc.capacity {
                return Err(invalid(
                    format!("{prefix}.thresholds.min_swing_points"),
                    "cannot exceed capacity",
                ));
            }
            if t.max_lookback < 5 {
                return Err(invalid(
                    format!("{prefix}.thresholds.max_lookback"),
                    "must cover at least one 5-bar window",
                ));
            }
            let non_negative = [
                ("min_price_change_percent", t.min_price_change_percent),
                ("min_volume_multiplier", t.min_volume_multiplier),
                ("min_volume_magnitude", t.min_volume_magnitude),
                ("min_price_rejection_percent", t.min_price_rejection_percent),
                ("min_gap_percent", t.min_gap_percent),
                ("structure_weight", t.structure_weight),
            ];
            for (name, value) in non_negative {
                if !value.is_finite() || value < 0.0 {
                    return Err(invalid(
                        format!("{prefix}.thresholds.{name}"),
                        "must be a finite, non-negative number",
                    ));
                }
            }
        }
        if !(0.0..=100.0).contains(&self.emission_gate) {
            return Err(invalid("emission_gate", "must be within 0..=100"));
        }
        let fractions = [
            ("proximity_buffer_ratio", self.proximity_buffer_ratio),
            ("stop_buffer_percent", self.stop_buffer_percent),
            ("target_offset_percent", self.target_offset_percent),
        ];
        for (name, value) in fractions {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(name, "must be a finite, non-negative number"));
            }
        }
        if self.stop_buffer_percent >= 100.0 {
            return Err(invalid("stop_buffer_percent", "must stay below 100"));
        }
        if self.target_offset_percent >= 100.0 {
            return Err(invalid("target_offset_percent", "must stay below 100"));
        }
        if self.max_structures == 0 {
            return Err(invalid("max_structures", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(field: impl Into<String>, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.into(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AnalyzerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.emission_gate, 60.0);
        assert_eq!(config.thresholds(Resolution::Macro).structure_weight, 1.3);
        assert_eq!(config.thresholds(Resolution::Meso).structure_weight, 1.1);
        assert_eq!(config.thresholds(Resolution::Micro).structure_weight, 1.0);
    }

    #[test]
    fn required_bar_count_adds_margin() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.required_bar_count(Resolution::Macro), 55);
        assert_eq!(config.required_bar_count(Resolution::Micro), 105);
    }

    #[test]
    fn toml_round_trip_preserves_config() {
        let config = AnalyzerConfig::default();
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("[resolutions.macro]"));
        let back = AnalyzerConfig::from_toml_str(&text).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config = AnalyzerConfig::from_toml_str("emission_gate = 70.0\n").unwrap();
        assert_eq!(config.emission_gate, 70.0);
        assert_eq!(config.resolutions, AnalyzerConfig::default().resolutions);
    }

    #[test]
    fn rejects_tiny_capacity() {
        let mut config = AnalyzerConfig::default();
        config.resolutions[Resolution::Meso].capacity = 4;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("resolutions.meso.capacity"));
    }

    #[test]
    fn rejects_negative_threshold() {
        let mut config = AnalyzerConfig::default();
        config.resolutions[Resolution::Micro].thresholds.min_gap_percent = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn rejects_gate_out_of_range() {
        let config = AnalyzerConfig::from_toml_str("emission_gate = 150.0\n");
        assert!(config.is_err());
    }

    #[test]
    fn fingerprint_tracks_parameters() {
        let a = AnalyzerConfig::default();
        let mut b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());
        b.emission_gate = 65.0;
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 16);
    }
}
