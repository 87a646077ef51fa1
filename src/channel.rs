/// Numeric state of a two-party channel.
///
/// The caller owns the record and sets `source` and `noise`. The feedback
/// stage only writes `feedback`, the receiver stage only writes `receiver`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ChannelState {
    /// Signal level of the sending party.
    pub source: f64,
    /// Latest decoded value at the receiving party.
    pub receiver: f64,
    /// Ambient disturbance level.
    pub noise: f64,
    /// Averaged feedback from the last simulation.
    pub feedback: f64,
}

impl ChannelState {
    /// Creates a channel with the given source and noise levels and zeroed outputs.
    pub fn new(source: f64, noise: f64) -> Self {
        Self {
            source,
            noise,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn test_new_zeroes_outputs() {
        let state = ChannelState::new(1.5, 0.25);

        assert_eq!(state.source, 1.5);
        assert_eq!(state.noise, 0.25);
        assert_eq!(state.feedback, 0.0);
        assert_eq!(state.receiver, 0.0);
    }
}
