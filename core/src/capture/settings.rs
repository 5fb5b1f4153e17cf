use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::prelude::{PipelineError, PipelineResult};
use crate::processing::segment::IntervalSpec;

/// Physical quantity a channel is displayed in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Volts,
    Protons,
    Coulombs,
    Joules,
}

impl Unit {
    pub const ALL: [Unit; 4] = [Unit::Volts, Unit::Protons, Unit::Coulombs, Unit::Joules];

    pub fn name(self) -> &'static str {
        match self {
            Unit::Volts => "volts",
            Unit::Protons => "protons",
            Unit::Coulombs => "coulombs",
            Unit::Joules => "joules",
        }
    }

    /// Whether conversion divides by the detector calibration curve.
    pub fn requires_calibration(self) -> bool {
        matches!(self, Unit::Protons | Unit::Coulombs)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Unit {
    type Err = PipelineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "volts" | "volt" | "v" => Ok(Unit::Volts),
            "protons" | "proton" | "p" => Ok(Unit::Protons),
            "coulombs" | "coulomb" | "c" => Ok(Unit::Coulombs),
            "joules" | "joule" | "j" => Ok(Unit::Joules),
            other => Err(PipelineError::InvalidInput(format!("unknown unit '{other}'"))),
        }
    }
}

/// Lower/upper classification bounds for one unit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ThresholdPair {
    pub lower: f64,
    pub upper: f64,
}

impl ThresholdPair {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }
}

/// One threshold pair per unit, so a unit switch picks up its own bounds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ThresholdTable {
    pub volts: ThresholdPair,
    pub protons: ThresholdPair,
    pub coulombs: ThresholdPair,
    pub joules: ThresholdPair,
}

impl ThresholdTable {
    pub fn get(&self, unit: Unit) -> ThresholdPair {
        match unit {
            Unit::Volts => self.volts,
            Unit::Protons => self.protons,
            Unit::Coulombs => self.coulombs,
            Unit::Joules => self.joules,
        }
    }

    pub fn set(&mut self, unit: Unit, pair: ThresholdPair) {
        match unit {
            Unit::Volts => self.volts = pair,
            Unit::Protons => self.protons = pair,
            Unit::Coulombs => self.coulombs = pair,
            Unit::Joules => self.joules = pair,
        }
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self {
            volts: ThresholdPair::new(-0.052_295_299_211_013_52, 0.007_973_001_229_908_228),
            protons: ThresholdPair::new(-67_432_701_825.388_306, 27_743_252_085.485_558),
            coulombs: ThresholdPair::new(-1.080_390_992_321_262_8e-8, 4.444_959_024_253_673e-9),
            joules: ThresholdPair::new(-8.378_630_646_392_451e-21, 1.277_415_627_341_222_4e-21),
        }
    }
}

/// Physical-time sub-window a channel is evaluated over, in milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct IntervalBounds {
    pub lower: f64,
    pub upper: f64,
}

impl IntervalBounds {
    pub fn to_spec(self) -> PipelineResult<IntervalSpec> {
        IntervalSpec::new(vec![self.lower, self.upper])
    }
}

impl Default for IntervalBounds {
    fn default() -> Self {
        Self {
            lower: -0.5,
            upper: 10.5,
        }
    }
}

/// Per-channel display configuration, owned by the caller and read once per cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChannelSettings {
    pub selected: bool,
    pub shown: bool,
    pub unit: Unit,
    pub thresholds: ThresholdTable,
    pub interval: IntervalBounds,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            selected: false,
            shown: true,
            unit: Unit::Volts,
            thresholds: ThresholdTable::default(),
            interval: IntervalBounds::default(),
        }
    }
}

impl ChannelSettings {
    pub fn with_unit(unit: Unit) -> Self {
        Self {
            unit,
            ..Self::default()
        }
    }

    /// Threshold pair for the channel's current unit.
    pub fn active_thresholds(&self) -> ThresholdPair {
        self.thresholds.get(self.unit)
    }
}

/// Interval shared by every channel, if they all agree on one.
pub fn common_interval(settings: &[ChannelSettings]) -> Option<IntervalBounds> {
    let first = settings.first()?.interval;
    settings
        .iter()
        .all(|each| each.interval == first)
        .then_some(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_parses_names_and_aliases() {
        assert_eq!("Volts".parse::<Unit>().unwrap(), Unit::Volts);
        assert_eq!("p".parse::<Unit>().unwrap(), Unit::Protons);
        assert_eq!(" C ".parse::<Unit>().unwrap(), Unit::Coulombs);
        assert_eq!("J".parse::<Unit>().unwrap(), Unit::Joules);
        assert!("furlongs".parse::<Unit>().is_err());
    }

    #[test]
    fn unit_serializes_lowercase() {
        let json = serde_json::to_string(&Unit::Coulombs).unwrap();
        assert_eq!(json, "\"coulombs\"");
    }

    #[test]
    fn active_thresholds_follow_unit() {
        let mut settings = ChannelSettings::default();
        settings.thresholds.set(Unit::Joules, ThresholdPair::new(1.0, 2.0));
        assert_eq!(settings.active_thresholds(), ThresholdTable::default().volts);
        settings.unit = Unit::Joules;
        assert_eq!(settings.active_thresholds(), ThresholdPair::new(1.0, 2.0));
    }

    #[test]
    fn settings_fill_missing_fields_from_defaults() {
        let settings: ChannelSettings = serde_json::from_str(r#"{"unit":"protons"}"#).unwrap();
        assert_eq!(settings.unit, Unit::Protons);
        assert!(settings.shown);
        assert_eq!(settings.interval, IntervalBounds::default());
    }

    #[test]
    fn common_interval_requires_agreement() {
        let mut settings = vec![ChannelSettings::default(); 3];
        assert_eq!(common_interval(&settings), Some(IntervalBounds::default()));
        settings[1].interval.upper = 5.0;
        assert_eq!(common_interval(&settings), None);
        assert_eq!(common_interval(&[]), None);
    }
}
