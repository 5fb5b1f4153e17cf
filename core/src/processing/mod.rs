pub mod calibration;
pub mod classify;
pub mod energy;
pub mod filter;
pub mod integrator;
pub mod mailbox;
pub mod pipeline;
pub mod segment;
pub mod units;

pub use calibration::{CalibrationCurve, CalibrationTable, CurveSpans, BASELINE_ENERGY_MEV};
pub use classify::Classifier;
pub use energy::EnergyRamp;
pub use filter::{BaselineFilter, FilterKind, PassThrough};
pub use integrator::{IntegratedTrace, Integrator};
pub use mailbox::CaptureMailbox;
pub use pipeline::{ChannelReport, CycleReport, Pipeline};
pub use segment::{IndexRange, IntervalSpec, Segmenter, TimeWindow};
pub use units::{PhysicalTrace, UnitConverter, ELEMENTARY_CHARGE};
