use std::sync::OnceLock;

use crate::math::interp::NewtonPolynomial;
use crate::prelude::{PipelineError, PipelineResult};
use crate::processing::segment::TimeWindow;

/// Beam energy of the fixed-energy operating mode, in MeV.
pub const BASELINE_ENERGY_MEV: f64 = 70.0;

/// End of the calibrated region; calibration times start at 0 ms.
pub const CALIBRATED_UNTIL_MS: f64 = 10.0;

/// Saturated coefficient used past the calibrated region (interpolated 800 MeV value).
pub const MAX_CALIBRATION: f64 = 4.63e-14;

const CAL_TIMES_MS: [f64; 5] = [0.0, 3.0, 5.0, 7.0, 9.0];
// V·s per proton
const CAL_COEFFICIENTS: [f64; 5] = [2.22e-16, 2.59e-16, 4.31e-15, 1.60e-14, 3.50e-14];

/// Measured detector response: (time, signal-per-particle) pairs plus the saturation value.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationTable {
    times: Vec<f64>,
    coefficients: Vec<f64>,
    saturation: f64,
}

impl CalibrationTable {
    pub fn new(times: Vec<f64>, coefficients: Vec<f64>, saturation: f64) -> PipelineResult<Self> {
        if times.is_empty() || times.len() != coefficients.len() {
            return Err(PipelineError::Configuration(format!(
                "calibration table needs matching points, got {} times and {} coefficients",
                times.len(),
                coefficients.len()
            )));
        }
        if coefficients.iter().chain([&saturation]).any(|&c| !(c > 0.0)) {
            return Err(PipelineError::Configuration(
                "calibration coefficients must be positive".into(),
            ));
        }
        Ok(Self {
            times,
            coefficients,
            saturation,
        })
    }

    /// The detector table, built once per process.
    pub fn standard() -> &'static CalibrationTable {
        static TABLE: OnceLock<CalibrationTable> = OnceLock::new();
        TABLE.get_or_init(|| CalibrationTable {
            times: CAL_TIMES_MS.to_vec(),
            coefficients: CAL_COEFFICIENTS.to_vec(),
            saturation: MAX_CALIBRATION,
        })
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn first_coefficient(&self) -> f64 {
        self.coefficients[0]
    }

    pub fn saturation(&self) -> f64 {
        self.saturation
    }
}

/// Sample counts before, inside and after the calibrated region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurveSpans {
    pub pre: usize,
    pub calibrated: usize,
    pub post: usize,
}

impl CurveSpans {
    pub fn total(&self) -> usize {
        self.pre + self.calibrated + self.post
    }
}

/// Per-sample conversion coefficients aligned to a window's sample grid.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationCurve {
    values: Vec<f64>,
    spans: Option<CurveSpans>,
}

impl CalibrationCurve {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `None` for the constant fixed-energy curve.
    pub fn spans(&self) -> Option<CurveSpans> {
        self.spans
    }

    /// Builds the curve for `window` at extraction energy `max_energy` (MeV).
    ///
    /// At the baseline energy the curve is flat at the first coefficient. Otherwise
    /// the table is interpolated over 0..10 ms and held flat on either side.
    pub fn build(
        window: &TimeWindow,
        table: &CalibrationTable,
        max_energy: f64,
    ) -> PipelineResult<Self> {
        window
            .validate()
            .map_err(|err| PipelineError::Configuration(err.to_string()))?;

        if max_energy == BASELINE_ENERGY_MEV {
            return Ok(Self {
                values: vec![table.first_coefficient(); window.points],
                spans: None,
            });
        }

        let spans = partition(window)?;
        let polynomial = NewtonPolynomial::fit(table.times(), table.coefficients())?;

        let mut values = Vec::with_capacity(window.points);
        values.extend(std::iter::repeat(table.first_coefficient()).take(spans.pre));
        values.extend(polynomial.evaluate_linspace(0.0, CALIBRATED_UNTIL_MS, spans.calibrated));
        values.extend(std::iter::repeat(table.saturation()).take(spans.post));

        Ok(Self {
            values,
            spans: Some(spans),
        })
    }
}

fn partition(window: &TimeWindow) -> PipelineResult<CurveSpans> {
    let per_ms = window.points_per_ms();
    let count = |ms: f64, what: &str| -> PipelineResult<usize> {
        let samples = (ms * per_ms).round();
        if samples < 0.0 {
            return Err(PipelineError::Configuration(format!(
                "window [{}, {}] leaves a negative {what} span",
                window.start, window.end
            )));
        }
        Ok(samples as usize)
    };

    let spans = CurveSpans {
        pre: count(-window.start, "pre-calibration")?,
        calibrated: count(CALIBRATED_UNTIL_MS, "calibrated")?,
        post: count(window.end - CALIBRATED_UNTIL_MS, "post-calibration")?,
    };
    if spans.total() != window.points {
        return Err(PipelineError::Configuration(format!(
            "calibration spans {} + {} + {} do not cover {} points",
            spans.pre, spans.calibrated, spans.post, window.points
        )));
    }
    Ok(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn window() -> TimeWindow {
        TimeWindow::new(-0.5, 10.5, 2200).unwrap()
    }

    #[test]
    fn ramp_curve_covers_every_point() {
        let curve = CalibrationCurve::build(&window(), CalibrationTable::standard(), 800.0).unwrap();
        assert_eq!(curve.len(), 2200);
        let spans = curve.spans().unwrap();
        assert_eq!(
            spans,
            CurveSpans {
                pre: 100,
                calibrated: 2000,
                post: 100
            }
        );
        assert_eq!(spans.total(), 2200);
    }

    #[test]
    fn ramp_curve_is_flat_outside_calibrated_region() {
        let curve = CalibrationCurve::build(&window(), CalibrationTable::standard(), 800.0).unwrap();
        let values = curve.values();
        assert!(values[..100].iter().all(|&v| v == 2.22e-16));
        assert!(values[2100..].iter().all(|&v| v == MAX_CALIBRATION));
        assert_relative_eq!(values[100], 2.22e-16, max_relative = 1e-9);
    }

    #[test]
    fn baseline_energy_gives_constant_curve() {
        let curve = CalibrationCurve::build(
            &window(),
            CalibrationTable::standard(),
            BASELINE_ENERGY_MEV,
        )
        .unwrap();
        assert_eq!(curve.len(), 2200);
        assert!(curve.values().iter().all(|&v| v == 2.22e-16));
        assert!(curve.spans().is_none());
    }

    #[test]
    fn window_without_pre_region_partitions_cleanly() {
        let window = TimeWindow::new(0.0, 10.0, 1000).unwrap();
        let curve = CalibrationCurve::build(&window, CalibrationTable::standard(), 800.0).unwrap();
        assert_eq!(
            curve.spans(),
            Some(CurveSpans {
                pre: 0,
                calibrated: 1000,
                post: 0
            })
        );
    }

    #[test]
    fn window_starting_after_zero_is_a_configuration_error() {
        let window = TimeWindow::new(1.0, 10.5, 950).unwrap();
        let err =
            CalibrationCurve::build(&window, CalibrationTable::standard(), 800.0).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }

    #[test]
    fn window_ending_before_calibrated_region_is_a_configuration_error() {
        let window = TimeWindow::new(-0.5, 5.0, 1100).unwrap();
        assert!(CalibrationCurve::build(&window, CalibrationTable::standard(), 800.0).is_err());
    }

    #[test]
    fn table_rejects_mismatched_or_non_positive_points() {
        assert!(CalibrationTable::new(vec![0.0, 1.0], vec![1.0], 2.0).is_err());
        assert!(CalibrationTable::new(vec![0.0], vec![0.0], 2.0).is_err());
        assert!(CalibrationTable::new(vec![0.0], vec![1.0], 2.0).is_ok());
    }
}
