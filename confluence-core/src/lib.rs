//! Confluence Core: multi-timeframe market-structure analysis.
//!
//! This crate turns a stream of closed OHLCV bars into trade signals:
//! - Bounded bar buffers at three resolutions (macro, meso, micro)
//! - Trend classification from swing highs and lows with volume confirmation
//! - Order-block and fair-value-gap detection
//! - Top-down gating, confluence scoring and a structure-aware risk plan
//!
//! The core does no I/O and no logging. Callers feed bars one at a time through
//! [`Analyzer::submit_bar`] and read the [`PassOutcome`] it returns.

pub mod analysis;
pub mod config;
pub mod domain;
pub mod engine;
pub mod store;

pub use config::{AnalyzerConfig, ConfigError, ThresholdSet};
pub use domain::{Bar, BarError, Resolution, Signal, SignalDirection, Structure, Trend};
pub use engine::{Analyzer, CoordinatorState, PassOutcome, SignalSink};
