use serde::{Deserialize, Serialize};

use crate::capture::Unit;
use crate::math::stats::StatsHelper;
use crate::prelude::{PipelineError, PipelineResult};
use crate::processing::calibration::CalibrationCurve;
use crate::processing::integrator::IntegratedTrace;

/// Elementary charge in coulombs.
pub const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;

/// Calibration coefficients are tabulated per milli-unit of integrated signal.
pub const PROTON_SCALE: f64 = 1e-3;

/// Integrated trace expressed in a physical unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalTrace {
    pub unit: Unit,
    pub values: Vec<f64>,
}

impl PhysicalTrace {
    pub fn total(&self) -> f64 {
        StatsHelper::sum(&self.values)
    }
}

pub struct UnitConverter;

impl UnitConverter {
    pub fn convert(
        trace: &IntegratedTrace,
        unit: Unit,
        curve: Option<&CalibrationCurve>,
    ) -> PipelineResult<PhysicalTrace> {
        Self::convert_with(trace, unit, curve.map(CalibrationCurve::values))
    }

    /// Like [`UnitConverter::convert`] with coefficients already aligned to the trace.
    pub fn convert_with(
        trace: &IntegratedTrace,
        unit: Unit,
        coefficients: Option<&[f64]>,
    ) -> PipelineResult<PhysicalTrace> {
        let values = match unit {
            Unit::Volts => trace.values().to_vec(),
            Unit::Protons => Self::protons(trace, unit, coefficients)?,
            Unit::Coulombs => Self::protons(trace, unit, coefficients)?
                .into_iter()
                .map(|v| v * ELEMENTARY_CHARGE)
                .collect(),
            Unit::Joules => trace
                .values()
                .iter()
                .map(|v| v * ELEMENTARY_CHARGE)
                .collect(),
        };
        Ok(PhysicalTrace { unit, values })
    }

    fn protons(
        trace: &IntegratedTrace,
        unit: Unit,
        coefficients: Option<&[f64]>,
    ) -> PipelineResult<Vec<f64>> {
        let coefficients =
            coefficients.ok_or_else(|| PipelineError::MissingCalibration(unit.to_string()))?;
        if coefficients.len() != trace.len() {
            return Err(PipelineError::ShapeMismatch(format!(
                "calibration curve of {} points against trace of {} samples",
                coefficients.len(),
                trace.len()
            )));
        }
        Ok(trace
            .values()
            .iter()
            .zip(coefficients)
            .map(|(v, c)| v / c * PROTON_SCALE)
            .collect())
    }
}
