use ndarray::{s, Axis};
use serde::{Deserialize, Serialize};

use crate::capture::Waveform;
use crate::prelude::WaveformFilter;
use crate::processing::segment::TimeWindow;

/// Leaves the capture untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl WaveformFilter for PassThrough {
    fn name(&self) -> &str {
        "none"
    }

    fn apply(&self, waveform: Waveform) -> Waveform {
        waveform
    }
}

/// Subtracts each channel's mean over its leading pre-injection samples.
#[derive(Debug, Clone, Copy)]
pub struct BaselineFilter {
    samples: usize,
}

impl BaselineFilter {
    pub fn new(samples: usize) -> Self {
        Self { samples }
    }

    /// Baseline over every sample recorded before t = 0.
    pub fn for_window(window: &TimeWindow) -> Self {
        let before_zero = window.index_of(0.0).clamp(0, window.points as i64);
        Self::new(before_zero as usize)
    }

    pub fn samples(&self) -> usize {
        self.samples
    }
}

impl WaveformFilter for BaselineFilter {
    fn name(&self) -> &str {
        "baseline"
    }

    fn apply(&self, mut waveform: Waveform) -> Waveform {
        let count = self.samples.min(waveform.samples());
        if count == 0 {
            return waveform;
        }
        for mut row in waveform.data_mut().axis_iter_mut(Axis(0)) {
            let baseline = row.slice(s![..count]).sum() / count as f64;
            row.mapv_inplace(|v| v - baseline);
        }
        waveform
    }
}

/// Filter selection as it appears in configuration files.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    #[default]
    None,
    Baseline,
}

impl FilterKind {
    pub fn build(self, window: &TimeWindow) -> Box<dyn WaveformFilter> {
        match self {
            FilterKind::None => Box::new(PassThrough),
            FilterKind::Baseline => Box::new(BaselineFilter::for_window(window)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn pass_through_keeps_samples() {
        let waveform = Waveform::new(array![[1.0, 2.0]]);
        assert_eq!(PassThrough.apply(waveform.clone()), waveform);
    }

    #[test]
    fn baseline_filter_removes_leading_offset() {
        let waveform = Waveform::new(array![[2.0, 2.0, 5.0, 2.0], [-1.0, 1.0, 0.0, 3.0]]);
        let filtered = BaselineFilter::new(2).apply(waveform);
        assert_eq!(filtered.channel(0).unwrap().to_vec(), vec![0.0, 0.0, 3.0, 0.0]);
        assert_eq!(filtered.channel(1).unwrap().to_vec(), vec![-1.0, 1.0, 0.0, 3.0]);
    }

    #[test]
    fn baseline_window_covers_pre_injection_samples() {
        let window = TimeWindow::new(-0.5, 10.5, 2200).unwrap();
        assert_eq!(BaselineFilter::for_window(&window).samples(), 100);
        let late = TimeWindow::new(1.0, 2.0, 100).unwrap();
        assert_eq!(BaselineFilter::for_window(&late).samples(), 0);
    }

    #[test]
    fn filter_kind_builds_named_filters() {
        let window = TimeWindow::default();
        assert_eq!(FilterKind::None.build(&window).name(), "none");
        assert_eq!(FilterKind::Baseline.build(&window).name(), "baseline");
    }
}
