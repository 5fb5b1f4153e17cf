use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity band of one channel for the current cycle.
///
/// `Unavailable` marks a channel whose trace could not be processed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChannelState {
    Good,
    Moderate,
    Bad,
    Unavailable,
}

impl ChannelState {
    pub fn label(self) -> &'static str {
        match self {
            ChannelState::Good => "good",
            ChannelState::Moderate => "moderate",
            ChannelState::Bad => "bad",
            ChannelState::Unavailable => "unavailable",
        }
    }

    pub fn is_alarm(self) -> bool {
        matches!(self, ChannelState::Bad | ChannelState::Unavailable)
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
