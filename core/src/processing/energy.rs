use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::processing::calibration::BASELINE_ENERGY_MEV;
use crate::processing::units::ELEMENTARY_CHARGE;

pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;
pub const PROTON_MASS_KG: f64 = 1.672_621_923_69e-27;

/// Proton rest energy in eV.
pub fn proton_rest_energy_ev() -> f64 {
    PROTON_MASS_KG * SPEED_OF_LIGHT * SPEED_OF_LIGHT / ELEMENTARY_CHARGE
}

/// Sinusoidal dipole ramp of the synchrotron between injection and extraction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EnergyRamp {
    pub injection_mev: f64,
    pub extraction_mev: f64,
    pub dipoles: u32,
    pub dipole_length_m: f64,
    pub frequency_hz: f64,
}

impl EnergyRamp {
    pub fn new(extraction_mev: f64) -> Self {
        Self {
            extraction_mev,
            ..Self::default()
        }
    }

    fn bending_radius(&self) -> f64 {
        let bend_angle = 2.0 * PI / f64::from(self.dipoles);
        self.dipole_length_m / bend_angle
    }

    fn field_for(&self, kinetic_mev: f64) -> f64 {
        let rest = proton_rest_energy_ev();
        let total = kinetic_mev * 1e6 + rest;
        let momentum = (total * total - rest * rest).sqrt();
        momentum / SPEED_OF_LIGHT / self.bending_radius()
    }

    /// Dipole field in tesla at `time_ms` into the cycle.
    pub fn field(&self, time_ms: f64) -> f64 {
        let omega = 2.0 * PI * self.frequency_hz;
        let injection = self.field_for(self.injection_mev);
        let extraction = self.field_for(self.extraction_mev);
        (extraction + injection - (extraction - injection) * (omega * time_ms * 1e-3).cos()) / 2.0
    }

    /// Beam momentum in eV/c.
    pub fn momentum_ev(&self, time_ms: f64) -> f64 {
        self.field(time_ms) * self.bending_radius() * SPEED_OF_LIGHT
    }

    pub fn kinetic_energy_ev(&self, time_ms: f64) -> f64 {
        let rest = proton_rest_energy_ev();
        let momentum = self.momentum_ev(time_ms);
        (momentum * momentum + rest * rest).sqrt() - rest
    }

    pub fn kinetic_energy_mev(&self, time_ms: f64) -> f64 {
        self.kinetic_energy_ev(time_ms) / 1e6
    }
}

impl Default for EnergyRamp {
    fn default() -> Self {
        Self {
            injection_mev: BASELINE_ENERGY_MEV,
            extraction_mev: 800.0,
            dipoles: 10,
            dipole_length_m: 4.4,
            frequency_hz: 50.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rest_energy_matches_proton_mass() {
        assert_relative_eq!(proton_rest_energy_ev(), 938.272e6, max_relative = 1e-6);
    }

    #[test]
    fn ramp_starts_at_injection_and_peaks_at_extraction() {
        let ramp = EnergyRamp::new(800.0);
        assert_relative_eq!(ramp.kinetic_energy_mev(0.0), 70.0, max_relative = 1e-9);
        assert_relative_eq!(ramp.kinetic_energy_mev(10.0), 800.0, max_relative = 1e-9);
        let midway = ramp.kinetic_energy_mev(5.0);
        assert!(midway > 70.0 && midway < 800.0);
    }

    #[test]
    fn ramp_is_flat_at_injection_energy() {
        let ramp = EnergyRamp::new(BASELINE_ENERGY_MEV);
        assert_relative_eq!(ramp.kinetic_energy_mev(4.0), 70.0, max_relative = 1e-9);
    }
}
