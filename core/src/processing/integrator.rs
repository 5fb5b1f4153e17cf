use crate::capture::Waveform;
use crate::math::integrate::IntegrationHelper;
use crate::prelude::{PipelineError, PipelineResult};

/// Per-sample incremental integral of one raw trace.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegratedTrace {
    values: Vec<f64>,
}

impl IntegratedTrace {
    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Cumulative trapezoidal integration followed by first-differencing.
///
/// The trace is taken to rise from zero at a leading edge one sample before the
/// first sample, so `N` samples yield `N` increments. The edge is `x[0]` when the
/// axis is one longer than the trace, otherwise it is extrapolated from the first
/// axis step.
pub struct Integrator;

impl Integrator {
    pub fn integrate(raw: &[f64], x_axis: &[f64]) -> PipelineResult<IntegratedTrace> {
        let n = raw.len();
        if n == 0 && x_axis.len() <= 1 {
            return Ok(IntegratedTrace::from_values(Vec::new()));
        }

        let padded_x: Vec<f64> = if x_axis.len() == n + 1 {
            x_axis.to_vec()
        } else if x_axis.len() == n && n >= 2 {
            let edge = x_axis[0] - (x_axis[1] - x_axis[0]);
            std::iter::once(edge).chain(x_axis.iter().copied()).collect()
        } else {
            return Err(PipelineError::ShapeMismatch(format!(
                "axis of {} points cannot integrate a trace of {} samples",
                x_axis.len(),
                n
            )));
        };
        let padded_y: Vec<f64> = std::iter::once(0.0).chain(raw.iter().copied()).collect();

        let cumulative = IntegrationHelper::cumulative_trapezoid(&padded_y, &padded_x);
        Ok(IntegratedTrace::from_values(
            IntegrationHelper::first_difference(&cumulative),
        ))
    }

    /// Integrates each channel independently; one result per channel.
    pub fn integrate_waveform(
        waveform: &Waveform,
        x_axis: &[f64],
    ) -> Vec<PipelineResult<IntegratedTrace>> {
        waveform
            .data()
            .rows()
            .into_iter()
            .map(|row| Self::integrate(&row.to_vec(), x_axis))
            .collect()
    }
}
