/// Trapezoidal integration primitives over sampled traces.
pub struct IntegrationHelper;

impl IntegrationHelper {
    /// Running sum of trapezoid areas between consecutive samples.
    ///
    /// Yields `N - 1` values for `N` samples; `x` and `y` must have equal length.
    pub fn cumulative_trapezoid(y: &[f64], x: &[f64]) -> Vec<f64> {
        debug_assert_eq!(x.len(), y.len());
        let mut total = 0.0;
        y.windows(2)
            .zip(x.windows(2))
            .map(|(ys, xs)| {
                total += (xs[1] - xs[0]) * (ys[0] + ys[1]) * 0.5;
                total
            })
            .collect()
    }

    /// Converts a running total into per-step increments, keeping the first total.
    pub fn first_difference(cumulative: &[f64]) -> Vec<f64> {
        let Some(&first) = cumulative.first() else {
            return Vec::new();
        };
        std::iter::once(first)
            .chain(cumulative.windows(2).map(|pair| pair[1] - pair[0]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn cumulative_trapezoid_of_ramp() {
        let cumulative =
            IntegrationHelper::cumulative_trapezoid(&[0.0, 1.0, 2.0, 3.0], &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(cumulative.len(), 3);
        assert_abs_diff_eq!(cumulative[0], 0.5);
        assert_abs_diff_eq!(cumulative[1], 2.0);
        assert_abs_diff_eq!(cumulative[2], 4.5);
    }

    #[test]
    fn cumulative_trapezoid_honours_uneven_spacing() {
        let cumulative = IntegrationHelper::cumulative_trapezoid(&[2.0, 2.0, 2.0], &[0.0, 0.5, 2.0]);
        assert_abs_diff_eq!(cumulative[0], 1.0);
        assert_abs_diff_eq!(cumulative[1], 4.0);
    }

    #[test]
    fn first_difference_keeps_leading_total() {
        assert_eq!(
            IntegrationHelper::first_difference(&[0.5, 1.5, 2.5]),
            vec![0.5, 1.0, 1.0]
        );
        assert!(IntegrationHelper::first_difference(&[]).is_empty());
    }
}
