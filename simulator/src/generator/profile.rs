use anyhow::Context;
use blmcore::capture::Waveform;
use blmcore::processing::TimeWindow;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::generator::template::loss_pulse;

/// Configuration for generating a synthetic monitor capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub channels: usize,
    pub window: TimeWindow,
    pub baseline: f64,
    pub noise: f64,
    pub loss_channels: Vec<usize>,
    pub loss_amplitude: f64,
    pub loss_time_ms: f64,
    pub loss_width_ms: f64,
    pub seed: u64,
    pub description: Option<String>,
    pub scenario: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            channels: 40,
            window: TimeWindow::default(),
            baseline: 0.0,
            noise: 0.002,
            loss_channels: vec![3, 17],
            loss_amplitude: 0.05,
            loss_time_ms: 6.0,
            loss_width_ms: 0.2,
            seed: 0,
            description: None,
            scenario: None,
        }
    }
}

fn build_sample_vector(config: &GeneratorConfig) -> anyhow::Result<Vec<f64>> {
    let samples = config.window.points;
    let sample_count = config
        .channels
        .checked_mul(samples)
        .context("overflow computing sample count for generator")?;

    let axis = config.window.axis();
    let pulse = loss_pulse(
        &axis,
        config.loss_time_ms,
        config.loss_width_ms,
        config.loss_amplitude,
    );
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut values = Vec::with_capacity(sample_count);

    for channel in 0..config.channels {
        let lossy = config.loss_channels.contains(&channel);
        for &loss in &pulse {
            let jitter = if config.noise > 0.0 {
                rng.gen_range(-config.noise..config.noise)
            } else {
                0.0
            };
            let signal = if lossy { loss } else { 0.0 };
            values.push(config.baseline + signal + jitter);
        }
    }

    Ok(values)
}

pub fn build_capture_from_config(config: &GeneratorConfig) -> anyhow::Result<Waveform> {
    config
        .window
        .validate()
        .context("validating generator window")?;
    let values = build_sample_vector(config)?;
    Waveform::from_flat(values, config.channels, config.window.points)
        .context("reshaping generated capture")
}

pub fn build_capture(channels: usize, window: TimeWindow, seed: u64) -> anyhow::Result<Waveform> {
    let config = GeneratorConfig {
        channels,
        window,
        seed,
        ..Default::default()
    };
    build_capture_from_config(&config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_builds_expected_shape() {
        let capture = build_capture(40, TimeWindow::default(), 1).unwrap();
        assert_eq!(capture.channels(), 40);
        assert_eq!(capture.samples(), 2200);
    }

    #[test]
    fn loss_channels_carry_the_pulse() {
        let config = GeneratorConfig {
            channels: 3,
            window: TimeWindow::new(0.0, 10.0, 1000).unwrap(),
            noise: 0.0,
            loss_channels: vec![1],
            loss_amplitude: 1.0,
            loss_time_ms: 5.0,
            description: Some("test".into()),
            scenario: Some("single loss".into()),
            ..Default::default()
        };

        let capture = build_capture_from_config(&config).unwrap();
        let quiet: f64 = capture.channel(0).unwrap().sum();
        let lossy: f64 = capture.channel(1).unwrap().sum();
        assert_eq!(quiet, 0.0);
        assert!(lossy > 1.0);
    }

    #[test]
    fn same_seed_repeats_noise() {
        let a = build_capture(2, TimeWindow::default(), 9).unwrap();
        let b = build_capture(2, TimeWindow::default(), 9).unwrap();
        assert_eq!(a, b);
    }
}
