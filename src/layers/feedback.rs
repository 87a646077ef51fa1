use tracing::{debug, instrument};

use crate::{
    channel::ChannelState,
    common::*,
    correlation::correlation,
    error::{Result, SimError},
    sampler::GaussianSource,
    trace::{TraceRow, TraceSink},
};

/// Coefficients of the coupled source/noise SDEs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeedbackParams {
    /// Source growth rate
    pub alpha: f64,
    /// Source self-limitation
    pub beta: f64,
    /// Noise growth rate
    pub gamma: f64,
    /// Noise self-limitation
    pub delta: f64,
    /// Source volatility
    pub sigma_x: f64,
    /// Noise volatility
    pub sigma_y: f64,
    /// Words sent by the source
    pub word_count: i64,
    /// Words decoded by the receiver
    pub receiver_word_count: i64,
    /// Time step
    pub dt: f64,
}

impl Default for FeedbackParams {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            beta: DEFAULT_BETA,
            gamma: DEFAULT_GAMMA,
            delta: DEFAULT_DELTA,
            sigma_x: DEFAULT_SIGMA_X,
            sigma_y: DEFAULT_SIGMA_Y,
            word_count: DEFAULT_WORD_COUNT,
            receiver_word_count: DEFAULT_RECEIVER_WORD_COUNT,
            dt: DEFAULT_DT,
        }
    }
}

/// Outcome of one feedback simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeedbackRun {
    /// Derived iteration count; the loop ran `iter_count + 1` steps.
    pub iter_count: u64,
    /// Averaged feedback, also written to the channel.
    pub feedback: f64,
    /// Source process value after the last step.
    pub final_source: f64,
    /// Noise process value after the last step.
    pub final_noise: f64,
}

impl FeedbackRun {
    /// Number of integration steps taken.
    pub fn steps(&self) -> u64 {
        self.iter_count + 1
    }
}

/// Derives the simulated horizon from the noise level and word-count alignment.
///
/// `round(noise / correlation(wc, rwc, wc + rwc) / dt)`, clamped at zero.
/// Horizons that do not fit in a `u64` step count are rejected.
///
/// The zero-correlation check is a guard only: no small integer pair of word
/// counts satisfies `6 (rwc - wc)^2 = n (n^2 - 1)`.
pub fn iteration_count(params: &FeedbackParams, noise: f64) -> Result<u64> {
    if !(params.dt.is_finite() && params.dt > 0.0) {
        return Err(SimError::InvalidParameter {
            name: "dt",
            value: params.dt,
        });
    }

    let sample_size = params
        .word_count
        .checked_add(params.receiver_word_count)
        .ok_or(SimError::InvalidParameter {
            name: "word_count",
            value: params.word_count as f64,
        })?;

    let alignment = correlation(
        params.word_count as f64,
        params.receiver_word_count as f64,
        sample_size,
    )?;

    if alignment == 0.0 {
        return Err(SimError::DivisionByZero {
            context: "word counts have zero correlation",
        });
    }

    let horizon = (noise / alignment / params.dt).round();
    if !horizon.is_finite() || horizon >= u64::MAX as f64 {
        return Err(SimError::InvalidParameter {
            name: "horizon",
            value: horizon,
        });
    }

    Ok(horizon.max(0.0) as u64)
}

/// Integrates the coupled logistic SDEs with Euler-Maruyama and stores the
/// mean feedback in `state.feedback`.
///
/// The source and noise processes start from `state.source` and `state.noise`
/// but evolve in local copies; the channel keeps its inputs.
#[instrument(skip(state, sampler, sink))]
pub fn simulate<G, S>(
    params: &FeedbackParams,
    state: &mut ChannelState,
    sampler: &mut G,
    mut sink: S,
) -> Result<FeedbackRun>
where
    G: GaussianSource + ?Sized,
    S: TraceSink,
{
    let iter_count = iteration_count(params, state.noise)?;
    debug!(iter_count, noise = state.noise, "Derived horizon");

    let FeedbackParams {
        alpha,
        beta,
        gamma,
        delta,
        sigma_x,
        sigma_y,
        dt,
        ..
    } = *params;
    let sqrt_dt = dt.sqrt();

    let mut x = state.source;
    let mut y = state.noise;
    let mut feedback_sum = 0.0;

    for step in 0..=iter_count {
        sink.record(TraceRow {
            component: "feedback",
            step,
            source: x,
            noise: y,
        });

        let epsilon_x = sampler.sample();
        let epsilon_y = sampler.sample();

        x += (alpha * x - beta * x * x) * dt + sigma_x * x * sqrt_dt * epsilon_x;
        y += (gamma * y - delta * y * y) * dt + sigma_y * y * sqrt_dt * epsilon_y;

        feedback_sum += x * (1.0 / (1.0 + y));
    }

    let feedback = feedback_sum / (iter_count + 1) as f64;
    state.feedback = feedback;
    debug!(feedback, final_source = x, final_noise = y, "Feedback averaged");

    Ok(FeedbackRun {
        iter_count,
        feedback,
        final_source: x,
        final_noise: y,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        sampler::{BoxMullerSampler, SequenceSampler},
        trace::NoTrace,
    };

    fn reference_state() -> ChannelState {
        ChannelState::new(DEFAULT_SOURCE, DEFAULT_NOISE)
    }

    #[test_log::test]
    fn test_reference_horizon() {
        let params = FeedbackParams::default();

        // correlation(7, 7, 14) == 1, round(6.69942) == 7
        assert_eq!(iteration_count(&params, DEFAULT_NOISE).unwrap(), 7);
    }

    #[test_log::test]
    fn test_unequal_word_counts_stretch_horizon() {
        let params = FeedbackParams {
            word_count: 3,
            receiver_word_count: 9,
            ..Default::default()
        };

        // correlation(3, 9, 12) = 1 - 216 / 1716
        let alignment = 1.0 - 216.0 / 1716.0;
        let expected = (DEFAULT_NOISE / alignment / DEFAULT_DT).round() as u64;

        assert_eq!(iteration_count(&params, DEFAULT_NOISE).unwrap(), expected);
        assert_eq!(expected, 8);
    }

    #[test_log::test]
    fn test_negative_horizon_clamps_to_zero() {
        let params = FeedbackParams::default();
        assert_eq!(iteration_count(&params, -5.0).unwrap(), 0);
    }

    #[test_log::test]
    fn test_invalid_time_step() {
        for dt in [0.0, -0.01, f64::NAN, f64::INFINITY] {
            let params = FeedbackParams {
                dt,
                ..Default::default()
            };
            assert!(matches!(
                iteration_count(&params, DEFAULT_NOISE),
                Err(SimError::InvalidParameter { name: "dt", .. })
            ));
        }
    }

    #[test_log::test]
    fn test_degenerate_word_counts() {
        // wc + rwc == 1 leaves the correlation undefined
        let params = FeedbackParams {
            word_count: 1,
            receiver_word_count: 0,
            ..Default::default()
        };

        assert!(matches!(
            iteration_count(&params, DEFAULT_NOISE),
            Err(SimError::DivisionByZero { .. })
        ));
    }

    #[test_log::test]
    fn test_word_count_overflow() {
        let params = FeedbackParams {
            word_count: i64::MAX,
            receiver_word_count: 1,
            ..Default::default()
        };

        assert!(matches!(
            iteration_count(&params, DEFAULT_NOISE),
            Err(SimError::InvalidParameter {
                name: "word_count",
                ..
            })
        ));
    }

    #[test_log::test]
    fn test_horizon_beyond_step_range() {
        let params = FeedbackParams::default();

        for noise in [1e300, 2e17] {
            assert!(matches!(
                iteration_count(&params, noise),
                Err(SimError::InvalidParameter {
                    name: "horizon",
                    ..
                })
            ));
        }

        // 1e19 steps still fit
        assert!(iteration_count(&params, 1e17).is_ok());
    }

    #[test_log::test]
    fn test_zero_epsilon_reference_run() {
        let params = FeedbackParams::default();
        let mut state = reference_state();
        let mut sampler = SequenceSampler::constant(0.0);

        let run = simulate(&params, &mut state, &mut sampler, NoTrace).unwrap();

        assert_eq!(run.iter_count, 7);
        assert_eq!(run.steps(), 8);
        assert_eq!(sampler.drawn(), 16);
        assert!((run.feedback - 0.967_372_714_539_914_5).abs() < 1e-12);
        assert!((run.final_source - 1.035_819_366_785_253_3).abs() < 1e-12);
        assert!((run.final_noise - 0.068_066_307_851_707_13).abs() < 1e-12);
        assert_eq!(state.feedback, run.feedback);
    }

    #[test_log::test]
    fn test_unit_epsilon_reference_run() {
        let params = FeedbackParams::default();
        let mut state = reference_state();
        let mut sampler = SequenceSampler::constant(1.0);

        let run = simulate(&params, &mut state, &mut sampler, NoTrace).unwrap();

        assert!((run.feedback - 1.102_419_687_194_209_8).abs() < 1e-12);
    }

    #[test_log::test]
    fn test_inputs_are_not_mutated() {
        let params = FeedbackParams::default();
        let mut state = reference_state();
        state.receiver = 42.0;

        simulate(&params, &mut state, &mut BoxMullerSampler::seeded(3), NoTrace).unwrap();

        assert_eq!(state.source, DEFAULT_SOURCE);
        assert_eq!(state.noise, DEFAULT_NOISE);
        assert_eq!(state.receiver, 42.0);
    }

    #[test_log::test]
    fn test_single_step_horizon() {
        let params = FeedbackParams::default();
        // 0.004 / 1 / 0.01 rounds to 0
        let mut state = ChannelState::new(DEFAULT_SOURCE, 0.004);

        let run = simulate(&params, &mut state, &mut SequenceSampler::constant(0.0), NoTrace)
            .unwrap();

        let (x0, y0) = (DEFAULT_SOURCE, 0.004);
        let x = x0 + (DEFAULT_ALPHA * x0 - DEFAULT_BETA * x0 * x0) * DEFAULT_DT;
        let y = y0 + (DEFAULT_GAMMA * y0 - DEFAULT_DELTA * y0 * y0) * DEFAULT_DT;

        assert_eq!(run.iter_count, 0);
        assert_eq!(run.feedback, x * (1.0 / (1.0 + y)));
        assert!((run.feedback - 1.025_601_457_262_073_7).abs() < 1e-12);
    }

    #[test_log::test]
    fn test_seeded_runs_are_reproducible() {
        let params = FeedbackParams::default();

        let mut first_state = reference_state();
        let mut first_trace = Vec::new();
        simulate(
            &params,
            &mut first_state,
            &mut BoxMullerSampler::seeded(2024),
            &mut first_trace,
        )
        .unwrap();

        let mut second_state = reference_state();
        let mut second_trace = Vec::new();
        simulate(
            &params,
            &mut second_state,
            &mut BoxMullerSampler::seeded(2024),
            &mut second_trace,
        )
        .unwrap();

        assert_eq!(first_state.feedback, second_state.feedback);
        assert_eq!(first_trace, second_trace);
    }

    #[test_log::test]
    fn test_trace_starts_from_channel_state() {
        let params = FeedbackParams::default();
        let mut state = reference_state();
        let mut rows = Vec::new();

        simulate(&params, &mut state, &mut SequenceSampler::constant(0.0), &mut rows).unwrap();

        assert_eq!(rows.len(), 8);
        assert_eq!(rows[0].step, 0);
        assert_eq!(rows[0].source, DEFAULT_SOURCE);
        assert_eq!(rows[0].noise, DEFAULT_NOISE);
        assert!(rows.iter().all(|row| row.component == "feedback"));
        assert_eq!(rows.last().unwrap().step, 7);
    }

    #[test_log::test]
    fn test_rerun_overwrites_feedback() {
        let params = FeedbackParams::default();
        let mut state = reference_state();
        state.feedback = -100.0;

        simulate(&params, &mut state, &mut SequenceSampler::constant(0.0), NoTrace).unwrap();
        let first = state.feedback;
        simulate(&params, &mut state, &mut SequenceSampler::constant(0.0), NoTrace).unwrap();

        assert_eq!(state.feedback, first);
    }
}
