use anyhow::Context;
use blmcore::capture::{common_interval, ChannelSettings, Unit};
use blmcore::processing::{FilterKind, IntervalSpec, TimeWindow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Rows per incoming capture.
    pub channels: usize,
    /// Channels wired to a display slot.
    pub settings_count: usize,
    pub window: TimeWindow,
    pub max_energy: f64,
    pub interval: Option<IntervalSpec>,
    pub filter: FilterKind,
    pub unit: Unit,
    /// Explicit per-channel settings; defaults fill any missing channels.
    pub settings: Vec<ChannelSettings>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            channels: 40,
            settings_count: 39,
            window: TimeWindow::default(),
            max_energy: 800.0,
            interval: None,
            filter: FilterKind::None,
            unit: Unit::Volts,
            settings: Vec::new(),
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        config
            .window
            .validate()
            .with_context(|| format!("validating window in {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(channels: usize, points: usize, max_energy: f64, unit: Unit) -> Self {
        Self {
            channels,
            settings_count: channels.saturating_sub(1).max(1),
            window: TimeWindow {
                points,
                ..TimeWindow::default()
            },
            max_energy,
            unit,
            ..Default::default()
        }
    }

    /// Settings for every display slot, in channel order.
    pub fn channel_settings(&self) -> Vec<ChannelSettings> {
        (0..self.settings_count)
            .map(|index| {
                self.settings
                    .get(index)
                    .cloned()
                    .unwrap_or_else(|| ChannelSettings::with_unit(self.unit))
            })
            .collect()
    }

    /// Configured interval, else the bounds every channel agrees on.
    pub fn interval_spec(&self, settings: &[ChannelSettings]) -> anyhow::Result<Option<IntervalSpec>> {
        if let Some(spec) = &self.interval {
            return Ok(Some(spec.clone()));
        }
        common_interval(settings)
            .map(|bounds| bounds.to_spec())
            .transpose()
            .context("building interval from channel settings")
    }
}
