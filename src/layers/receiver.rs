use tracing::{debug, instrument};

use crate::{
    channel::ChannelState,
    correlation::correlation,
    error::{Result, SimError},
};

/// Share of the averaged feedback that reaches the receiver directly.
const FEEDBACK_WEIGHT: f64 = 0.5;

/// Decodes the receiver value from the channel's source and feedback.
///
/// `receiver_word_count` scales the word-count term and doubles as the sample
/// size of the final correlation. On error the channel is left untouched.
#[instrument(skip(state))]
pub fn update_receiver(receiver_word_count: i64, state: &mut ChannelState) -> Result<f64> {
    if state.source == 0.0 {
        return Err(SimError::DivisionByZero {
            context: "receiver update requires a non-zero source",
        });
    }

    let words = receiver_word_count as f64;
    let feedback = state.feedback;

    let mut receiver = state.source + feedback * FEEDBACK_WEIGHT;
    receiver += (words + words * feedback * feedback / state.source) / 100.0;
    receiver += correlation(state.source, receiver, receiver_word_count)?;

    state.receiver = receiver;
    debug!(receiver, "Receiver updated");

    Ok(receiver)
}
