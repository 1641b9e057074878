//! Analysis engine: the per-bar coordinator and its outputs.
//!
//! [`Analyzer`] owns the bar buffers and runs one top-down pass per accepted
//! bar. Each pass returns a [`PassOutcome`]; emitted signals are also
//! delivered to every subscribed [`SignalSink`].

pub mod coordinator;
pub mod emitter;
pub mod outcome;

pub use coordinator::Analyzer;
pub use emitter::{SignalEmitter, SignalSink};
pub use outcome::{CoordinatorState, PassOutcome, SkipReason};
