use ndarray::{Array2, ArrayView1, Axis};

use crate::prelude::{PipelineError, PipelineResult};

/// One capture cycle: a channel × sample matrix of raw detector voltages.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    data: Array2<f64>,
}

impl Waveform {
    pub fn new(data: Array2<f64>) -> Self {
        Self { data }
    }

    /// Reshapes a row-major flat buffer into `channels × samples`.
    pub fn from_flat(data: Vec<f64>, channels: usize, samples: usize) -> PipelineResult<Self> {
        let expected = channels.checked_mul(samples).ok_or_else(|| {
            PipelineError::InvalidInput(format!("{channels} x {samples} overflows"))
        })?;
        if data.len() != expected {
            return Err(PipelineError::InvalidInput(format!(
                "flat buffer holds {} values, expected {} ({} channels x {} samples)",
                data.len(),
                expected,
                channels,
                samples
            )));
        }
        let data = Array2::from_shape_vec((channels, samples), data)
            .map_err(|err| PipelineError::InvalidInput(err.to_string()))?;
        Ok(Self { data })
    }

    /// Decodes little-endian `f64` samples, as framed by the capture transport.
    pub fn from_le_bytes(bytes: &[u8], channels: usize, samples: usize) -> PipelineResult<Self> {
        if bytes.len() % 8 != 0 {
            return Err(PipelineError::InvalidInput(format!(
                "{} bytes is not a whole number of f64 samples",
                bytes.len()
            )));
        }
        let values = bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut word = [0u8; 8];
                word.copy_from_slice(chunk);
                f64::from_le_bytes(word)
            })
            .collect();
        Self::from_flat(values, channels, samples)
    }

    pub fn channels(&self) -> usize {
        self.data.nrows()
    }

    pub fn samples(&self) -> usize {
        self.data.ncols()
    }

    pub fn channel(&self, index: usize) -> Option<ArrayView1<'_, f64>> {
        (index < self.channels()).then(|| self.data.index_axis(Axis(0), index))
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array2<f64> {
        &mut self.data
    }

    pub fn into_inner(self) -> Array2<f64> {
        self.data
    }
}
