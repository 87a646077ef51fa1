//! Session and ensemble drivers.

use indicatif::ProgressBar;
use rayon::prelude::*;
use tracing::{info, instrument};

use crate::{
    channel::ChannelState,
    config::SimConfig,
    error::{Result, SimError},
    layers::{feedback::simulate, receiver::update_receiver},
    sampler::BoxMullerSampler,
    trace::{NoTrace, TraceSink},
};

/// Result of one source → feedback → receiver pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionReport {
    /// Seed the sampler was built from.
    pub seed: u64,
    /// Integration steps taken.
    pub steps: u64,
    /// Channel after both stages ran.
    pub state: ChannelState,
}

/// Runs the full pipeline once: build the channel from `config`, simulate the
/// feedback with a sampler seeded by `seed`, then update the receiver.
#[instrument(skip(config, sink))]
pub fn run_session<S: TraceSink>(config: &SimConfig, seed: u64, sink: S) -> Result<SessionReport> {
    config.validate()?;

    let mut state = ChannelState::new(config.source, config.noise);
    let mut sampler = BoxMullerSampler::seeded(seed);

    let run = simulate(&config.params, &mut state, &mut sampler, sink)?;
    update_receiver(config.params.receiver_word_count, &mut state)?;

    info!(
        seed,
        steps = run.steps(),
        feedback = state.feedback,
        receiver = state.receiver,
        "Session finished"
    );

    Ok(SessionReport {
        seed,
        steps: run.steps(),
        state,
    })
}

/// Summary statistics over a set of samples.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stats {
    /// Arithmetic mean
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// Smallest sample
    pub min: f64,
    /// Largest sample
    pub max: f64,
}

impl Stats {
    /// Computes the statistics of a non-empty slice.
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;

        Self {
            mean,
            std_dev: variance.sqrt(),
            min: samples.iter().copied().fold(f64::INFINITY, f64::min),
            max: samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// Aggregate of many independently seeded sessions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnsembleSummary {
    /// Number of sessions
    pub runs: usize,
    /// Seed of the first session; session `i` used `base_seed + i`.
    pub base_seed: u64,
    /// Feedback across sessions
    pub feedback: Stats,
    /// Receiver across sessions
    pub receiver: Stats,
}

/// Runs `runs` sessions in parallel, session `i` seeded with `base_seed + i`.
///
/// Every session owns its channel and sampler, so the summary does not depend
/// on how the work is scheduled.
#[instrument(skip(config, progress))]
pub fn run_ensemble(
    config: &SimConfig,
    runs: usize,
    base_seed: u64,
    progress: Option<&ProgressBar>,
) -> Result<EnsembleSummary> {
    if runs == 0 {
        return Err(SimError::InvalidParameter {
            name: "runs",
            value: 0.0,
        });
    }

    let reports = (0..runs)
        .into_par_iter()
        .map(|i| {
            let report = run_session(config, base_seed.wrapping_add(i as u64), NoTrace);
            if let Some(progress) = progress {
                progress.inc(1);
            }
            report
        })
        .collect::<Result<Vec<_>>>()?;

    let feedback: Vec<f64> = reports.iter().map(|r| r.state.feedback).collect();
    let receiver: Vec<f64> = reports.iter().map(|r| r.state.receiver).collect();

    let summary = EnsembleSummary {
        runs,
        base_seed,
        feedback: Stats::from_samples(&feedback),
        receiver: Stats::from_samples(&receiver),
    };

    info!(
        runs,
        feedback_mean = summary.feedback.mean,
        receiver_mean = summary.receiver.mean,
        "Ensemble finished"
    );

    Ok(summary)
}
