//! Stochastic simulation of a two-party communication channel.
//!
//! A source signal and a noise level evolve as coupled logistic SDEs; their
//! trajectory is averaged into a feedback value, from which the receiver value
//! is decoded.

#![forbid(unsafe_code, unused_must_use)]
#![warn(clippy::all, missing_docs)]

/// Default dialogue parameters.
pub mod common;

/// Error taxonomy.
pub mod error;

/// Correlation metric.
pub mod correlation;

/// Gaussian samplers.
pub mod sampler;

/// Shared channel record.
pub mod channel;

/// Integration trace observers.
pub mod trace;

/// Channel stages.
pub mod layers;

/// Configuration loading.
pub mod config;

/// Session and ensemble drivers.
pub mod simulation;

pub use channel::ChannelState;
pub use config::SimConfig;
pub use correlation::correlation;
pub use error::{Result, SimError};
pub use layers::{
    feedback::{FeedbackParams, FeedbackRun, iteration_count, simulate},
    receiver::update_receiver,
};
pub use sampler::{BoxMullerSampler, GaussianSource, SequenceSampler};
pub use simulation::{EnsembleSummary, SessionReport, Stats, run_ensemble, run_session};
pub use trace::{LogTrace, NoTrace, TraceRow, TraceSink};
