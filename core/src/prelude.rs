use crate::capture::Waveform;

/// Error taxonomy shared by every pipeline stage.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("invalid interval: {0}")]
    InvalidInterval(String),
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("unit {0} requires a calibration curve")]
    MissingCalibration(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Channel-level signal conditioning applied before integration.
///
/// Implementations must preserve the waveform shape.
pub trait WaveformFilter: Send + Sync {
    fn name(&self) -> &str;
    fn apply(&self, waveform: Waveform) -> Waveform;
}
