//! Domain types for the confluence analyzer.

pub mod bar;
pub mod resolution;
pub mod signal;
pub mod structure;

pub use bar::{Bar, BarError};
pub use resolution::{PerResolution, Resolution};
pub use signal::{Annotation, RiskPlan, Signal, SignalDirection, TakeProfit};
pub use structure::{FairValueGap, OrderBlock, Structure, Trend, ZoneKind};
