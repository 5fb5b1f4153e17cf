/// Gaussian loss pulse sampled on `axis` (ms).
pub fn loss_pulse(axis: &[f64], centre_ms: f64, width_ms: f64, amplitude: f64) -> Vec<f64> {
    let width = width_ms.max(f64::EPSILON);
    axis.iter()
        .map(|&t| {
            let z = (t - centre_ms) / width;
            amplitude * (-0.5 * z * z).exp()
        })
        .collect()
}
