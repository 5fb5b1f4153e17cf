use blmcore::capture::{ChannelSettings, ChannelState, Unit};
use blmcore::processing::CycleReport;
use serde::{Deserialize, Serialize};

/// LED palette keyed by channel state.
pub fn state_color(state: Option<ChannelState>) -> &'static str {
    match state {
        None => "#888",
        Some(ChannelState::Good) => "#70c720",
        Some(ChannelState::Moderate) => "#ffc720",
        Some(ChannelState::Bad) => "#ff0040",
        Some(ChannelState::Unavailable) => "#ff0090",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelView {
    pub index: usize,
    pub state: Option<ChannelState>,
    pub color: String,
    pub alarm: bool,
    pub unit: Unit,
    pub total: Option<f64>,
    pub shown: bool,
    pub selected: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct VisualizationModel {
    pub cycles: usize,
    pub beam_energy_mev: Option<f64>,
    pub coverage: Option<f64>,
    pub channels: Vec<ChannelView>,
}

impl VisualizationModel {
    /// Idle display before the first cycle completes.
    pub fn idle(settings: &[ChannelSettings]) -> Self {
        let channels = settings
            .iter()
            .enumerate()
            .map(|(index, each)| ChannelView {
                index,
                state: None,
                color: state_color(None).to_string(),
                alarm: false,
                unit: each.unit,
                total: None,
                shown: each.shown,
                selected: each.selected,
                error: None,
            })
            .collect();
        Self {
            channels,
            ..Default::default()
        }
    }

    pub fn from_report(report: &CycleReport, cycles: usize) -> Self {
        let channels = report
            .channels
            .iter()
            .map(|channel| ChannelView {
                index: channel.channel,
                state: Some(channel.state),
                color: state_color(Some(channel.state)).to_string(),
                alarm: channel.state.is_alarm(),
                unit: channel.unit,
                total: channel.total,
                shown: channel.shown,
                selected: channel.selected,
                error: channel.error.as_ref().map(ToString::to_string),
            })
            .collect();
        Self {
            cycles,
            beam_energy_mev: Some(report.beam_energy_mev),
            coverage: report.coverage,
            channels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_model_is_grey() {
        let model = VisualizationModel::idle(&vec![ChannelSettings::default(); 2]);
        assert_eq!(model.channels.len(), 2);
        assert!(model.channels.iter().all(|c| c.color == "#888"));
        assert_eq!(model.cycles, 0);
    }

    #[test]
    fn every_state_has_a_distinct_color() {
        let colors: std::collections::HashSet<_> = [
            ChannelState::Good,
            ChannelState::Moderate,
            ChannelState::Bad,
            ChannelState::Unavailable,
        ]
        .into_iter()
        .map(|s| state_color(Some(s)))
        .collect();
        assert_eq!(colors.len(), 4);
    }
}
