//! Signal-processing and classification core for the beam-loss monitor display.
//!
//! Each capture flows strictly forward: segmentation, filtering, cumulative
//! integration, unit conversion against a shared calibration curve, and threshold
//! classification into a severity band per channel.

pub mod capture;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod telemetry;

pub use capture::{ChannelSettings, ChannelState, Unit, Waveform};
pub use prelude::{PipelineError, PipelineResult, WaveformFilter};
pub use processing::pipeline::{CycleReport, Pipeline};
