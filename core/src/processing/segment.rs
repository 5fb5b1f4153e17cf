use ndarray::s;
use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::capture::Waveform;
use crate::math::interp::linspace;
use crate::prelude::{PipelineError, PipelineResult};
use crate::telemetry::LogManager;

/// Physical sampling domain of a capture, in milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
    pub points: usize,
}

impl TimeWindow {
    pub fn new(start: f64, end: f64, points: usize) -> PipelineResult<Self> {
        let window = Self { start, end, points };
        window.validate()?;
        Ok(window)
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if !(self.end > self.start) || !self.start.is_finite() || !self.end.is_finite() {
            return Err(PipelineError::InvalidInput(format!(
                "time window end {} must exceed start {}",
                self.end, self.start
            )));
        }
        if self.points < 2 {
            return Err(PipelineError::InvalidInput(format!(
                "time window needs at least 2 points, got {}",
                self.points
            )));
        }
        Ok(())
    }

    pub fn span(&self) -> f64 {
        self.end - self.start
    }

    pub fn points_per_ms(&self) -> f64 {
        self.points as f64 / self.span()
    }

    /// Sample times of the window grid.
    pub fn axis(&self) -> Vec<f64> {
        linspace(self.start, self.end, self.points)
    }

    /// Sample index of a physical time; ties round to even.
    pub fn index_of(&self, t: f64) -> i64 {
        ((t - self.start) / self.span() * self.points as f64).round_ties_even() as i64
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self {
            start: -0.5,
            end: 10.5,
            points: 2200,
        }
    }
}

/// Ordered physical-time boundaries; each adjacent pair is one sub-window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct IntervalSpec {
    boundaries: Vec<f64>,
}

impl IntervalSpec {
    pub fn new(boundaries: Vec<f64>) -> PipelineResult<Self> {
        if boundaries.len() < 2 {
            return Err(PipelineError::InvalidInterval(format!(
                "need at least two boundaries, got {}",
                boundaries.len()
            )));
        }
        if let Some(bad) = boundaries.iter().find(|t| !t.is_finite()) {
            return Err(PipelineError::InvalidInterval(format!(
                "boundary {} is not a finite time",
                bad
            )));
        }
        Ok(Self { boundaries })
    }

    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }
}

impl TryFrom<Vec<f64>> for IntervalSpec {
    type Error = PipelineError;

    fn try_from(boundaries: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(boundaries)
    }
}

impl From<IntervalSpec> for Vec<f64> {
    fn from(spec: IntervalSpec) -> Self {
        spec.boundaries
    }
}

/// Half-open sample-index range `[lo, hi)`; may fall outside the capture.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexRange {
    pub lo: i64,
    pub hi: i64,
}

impl IndexRange {
    pub fn new(lo: i64, hi: i64) -> Self {
        Self { lo, hi }
    }

    pub fn len(&self) -> usize {
        usize::try_from(self.hi.saturating_sub(self.lo)).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Portion of the range inside `0..len`; out-of-bounds parts are dropped.
    pub fn clip(&self, len: usize) -> Range<usize> {
        let len = len as i64;
        let lo = self.lo.clamp(0, len);
        let hi = self.hi.clamp(lo, len);
        lo as usize..hi as usize
    }

    pub fn fits(&self, len: usize) -> bool {
        self.lo >= 0 && self.hi >= self.lo && self.hi <= len as i64
    }
}

/// Maps physical time windows to index ranges and slices captures by them.
pub struct Segmenter;

impl Segmenter {
    pub fn compute_ranges(
        window: &TimeWindow,
        spec: &IntervalSpec,
    ) -> PipelineResult<Vec<IndexRange>> {
        let indices: Vec<i64> = spec
            .boundaries()
            .iter()
            .map(|&t| window.index_of(t))
            .collect();
        Self::pair_indices(indices)
    }

    /// Same as [`Segmenter::compute_ranges`] for boundaries given as window fractions.
    pub fn compute_fraction_ranges(
        window: &TimeWindow,
        fractions: &[f64],
    ) -> PipelineResult<Vec<IndexRange>> {
        if let Some(bad) = fractions.iter().find(|f| !f.is_finite()) {
            return Err(PipelineError::InvalidInterval(format!(
                "fraction {} is not finite",
                bad
            )));
        }
        let indices = fractions
            .iter()
            .map(|&f| (f * window.points as f64).round_ties_even() as i64)
            .collect();
        Self::pair_indices(indices)
    }

    fn pair_indices(indices: Vec<i64>) -> PipelineResult<Vec<IndexRange>> {
        if indices.len() < 2 {
            return Err(PipelineError::InvalidInterval(format!(
                "need at least two boundaries, got {}",
                indices.len()
            )));
        }
        if let Some(pair) = indices.windows(2).find(|pair| pair[1] < pair[0]) {
            return Err(PipelineError::InvalidInterval(format!(
                "boundary indices must not decrease ({} then {})",
                pair[0], pair[1]
            )));
        }
        Ok(indices
            .windows(2)
            .map(|pair| IndexRange::new(pair[0], pair[1]))
            .collect())
    }

    /// Extracts every channel over each range.
    ///
    /// Ranges reaching past the capture yield shorter or empty slices.
    pub fn slice(waveform: &Waveform, ranges: &[IndexRange]) -> Vec<Waveform> {
        let samples = waveform.samples();
        ranges
            .iter()
            .map(|range| {
                if !range.fits(samples) {
                    LogManager::new().warn(&format!(
                        "interval [{}, {}) truncated to capture of {} samples",
                        range.lo, range.hi, samples
                    ));
                }
                let clipped = range.clip(samples);
                Waveform::new(
                    waveform
                        .data()
                        .slice(s![.., clipped.start..clipped.end])
                        .to_owned(),
                )
            })
            .collect()
    }

    /// Sum of one trace over each range.
    pub fn sum_ranges(trace: &[f64], ranges: &[IndexRange]) -> Vec<f64> {
        ranges
            .iter()
            .map(|range| trace[range.clip(trace.len())].iter().sum())
            .collect()
    }

    /// Share of the window spanned from the first range start to the last range end.
    pub fn proportion_of_window(window: &TimeWindow, ranges: &[IndexRange]) -> Option<f64> {
        let first = ranges.first()?;
        let last = ranges.last()?;
        Some((last.hi as f64 - first.lo as f64) / window.points as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn window() -> TimeWindow {
        TimeWindow::new(-0.5, 10.5, 2200).unwrap()
    }

    #[test]
    fn full_window_is_identity_segmentation() {
        let spec = IntervalSpec::new(vec![-0.5, 10.5]).unwrap();
        let ranges = Segmenter::compute_ranges(&window(), &spec).unwrap();
        assert_eq!(ranges, vec![IndexRange::new(0, 2200)]);
    }

    #[test]
    fn boundaries_map_to_consecutive_ranges() {
        let spec = IntervalSpec::new(vec![0.0, 5.0, 10.0]).unwrap();
        let ranges = Segmenter::compute_ranges(&window(), &spec).unwrap();
        assert_eq!(
            ranges,
            vec![IndexRange::new(100, 1100), IndexRange::new(1100, 2100)]
        );
    }

    #[test]
    fn fewer_than_two_boundaries_is_invalid() {
        assert!(matches!(
            IntervalSpec::new(vec![1.0]),
            Err(PipelineError::InvalidInterval(_))
        ));
        assert!(matches!(
            Segmenter::compute_fraction_ranges(&window(), &[0.5]),
            Err(PipelineError::InvalidInterval(_))
        ));
    }

    #[test]
    fn decreasing_boundaries_are_invalid() {
        let spec = IntervalSpec::new(vec![5.0, 1.0]).unwrap();
        assert!(Segmenter::compute_ranges(&window(), &spec).is_err());
    }

    #[test]
    fn fraction_ranges_scale_by_points() {
        let ranges = Segmenter::compute_fraction_ranges(&window(), &[0.0, 0.25, 1.0]).unwrap();
        assert_eq!(
            ranges,
            vec![IndexRange::new(0, 550), IndexRange::new(550, 2200)]
        );
    }

    #[test]
    fn out_of_range_boundaries_are_not_clamped() {
        let spec = IntervalSpec::new(vec![-1.5, 11.5]).unwrap();
        let ranges = Segmenter::compute_ranges(&window(), &spec).unwrap();
        assert_eq!(ranges, vec![IndexRange::new(-200, 2400)]);
    }

    #[test]
    fn non_finite_boundaries_are_invalid() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                IntervalSpec::new(vec![0.0, bad]),
                Err(PipelineError::InvalidInterval(_))
            ));
        }
        assert!(Segmenter::compute_fraction_ranges(&window(), &[0.0, f64::NAN]).is_err());
    }

    #[test]
    fn huge_boundaries_saturate_without_overflow() {
        let spec = IntervalSpec::new(vec![-1e300, 1e300]).unwrap();
        let ranges = Segmenter::compute_ranges(&window(), &spec).unwrap();
        assert_eq!(ranges, vec![IndexRange::new(i64::MIN, i64::MAX)]);
        assert_eq!(ranges[0].len(), i64::MAX as usize);
        assert_eq!(ranges[0].clip(2200), 0..2200);
        let coverage = Segmenter::proportion_of_window(&window(), &ranges).unwrap();
        assert!(coverage.is_finite() && coverage > 1.0);
        assert_eq!(IndexRange::new(5, 2).len(), 0);
    }

    #[test]
    fn slice_truncates_out_of_bounds_ranges() {
        let data = Array2::from_shape_fn((2, 6), |(c, i)| (c * 10 + i) as f64);
        let waveform = Waveform::new(data);
        let slices = Segmenter::slice(
            &waveform,
            &[
                IndexRange::new(1, 3),
                IndexRange::new(4, 9),
                IndexRange::new(7, 9),
            ],
        );
        assert_eq!(slices[0].channel(1).unwrap().to_vec(), vec![11.0, 12.0]);
        assert_eq!(slices[1].samples(), 2);
        assert_eq!(slices[2].samples(), 0);
        assert_eq!(slices[2].channels(), 2);
    }

    #[test]
    fn sum_ranges_and_coverage() {
        let trace = [1.0, 2.0, 3.0, 4.0];
        let ranges = [IndexRange::new(0, 2), IndexRange::new(2, 6)];
        assert_eq!(Segmenter::sum_ranges(&trace, &ranges), vec![3.0, 7.0]);

        let window = TimeWindow::new(0.0, 1.0, 8).unwrap();
        assert_eq!(
            Segmenter::proportion_of_window(&window, &ranges),
            Some(0.75)
        );
        assert_eq!(Segmenter::proportion_of_window(&window, &[]), None);
    }

    #[test]
    fn window_rejects_degenerate_bounds() {
        assert!(TimeWindow::new(1.0, 1.0, 10).is_err());
        assert!(TimeWindow::new(0.0, 1.0, 1).is_err());
        assert_eq!(window().axis().len(), 2200);
    }
}
