use crate::capture::{ChannelState, ThresholdPair};
use crate::processing::units::PhysicalTrace;

/// Stateless threshold classifier; every cycle is judged from scratch.
pub struct Classifier;

impl Classifier {
    pub fn classify(trace: &PhysicalTrace, thresholds: ThresholdPair) -> ChannelState {
        Self::classify_scalar(trace.total(), thresholds)
    }

    /// `[lower, upper)` is moderate; below is good, at or above `upper` is bad.
    /// A NaN total cannot be judged and is reported unavailable.
    pub fn classify_scalar(scalar: f64, thresholds: ThresholdPair) -> ChannelState {
        if scalar.is_nan() {
            ChannelState::Unavailable
        } else if scalar < thresholds.lower {
            ChannelState::Good
        } else if scalar < thresholds.upper {
            ChannelState::Moderate
        } else {
            ChannelState::Bad
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Unit;

    fn pair() -> ThresholdPair {
        ThresholdPair::new(-1.0, 1.0)
    }

    #[test]
    fn bands_follow_half_open_intervals() {
        assert_eq!(Classifier::classify_scalar(-1.5, pair()), ChannelState::Good);
        assert_eq!(Classifier::classify_scalar(-1.0, pair()), ChannelState::Moderate);
        assert_eq!(Classifier::classify_scalar(0.0, pair()), ChannelState::Moderate);
        assert_eq!(Classifier::classify_scalar(1.0, pair()), ChannelState::Bad);
        assert_eq!(Classifier::classify_scalar(f64::INFINITY, pair()), ChannelState::Bad);
    }

    #[test]
    fn trace_summing_to_zero_is_moderate() {
        let trace = PhysicalTrace {
            unit: Unit::Volts,
            values: vec![0.25, -0.5, 0.25],
        };
        assert_eq!(Classifier::classify(&trace, pair()), ChannelState::Moderate);
    }

    #[test]
    fn nan_total_is_unavailable() {
        assert_eq!(
            Classifier::classify_scalar(f64::NAN, pair()),
            ChannelState::Unavailable
        );
    }
}
