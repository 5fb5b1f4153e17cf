pub struct StatsHelper;

impl StatsHelper {
    pub fn sum(samples: &[f64]) -> f64 {
        samples.iter().sum()
    }

    pub fn mean(samples: &[f64]) -> Option<f64> {
        if samples.is_empty() {
            return None;
        }
        Some(Self::sum(samples) / samples.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sum_of_empty_sequence_is_zero() {
        assert_eq!(StatsHelper::sum(&[]), 0.0);
        assert_eq!(StatsHelper::sum(&[1.0, -1.0, 0.5]), 0.5);
    }

    #[test]
    fn mean_handles_empty_input() {
        assert_eq!(StatsHelper::mean(&[]), None);
        assert_eq!(StatsHelper::mean(&[2.0, 4.0]), Some(3.0));
    }
}
