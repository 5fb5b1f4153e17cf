pub mod settings;
pub mod state;
pub mod waveform;

pub use settings::{
    common_interval, ChannelSettings, IntervalBounds, ThresholdPair, ThresholdTable, Unit,
};
pub use state::ChannelState;
pub use waveform::Waveform;
