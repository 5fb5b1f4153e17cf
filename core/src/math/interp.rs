use crate::prelude::{PipelineError, PipelineResult};

/// Newton-form interpolating polynomial through a small set of nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct NewtonPolynomial {
    nodes: Vec<f64>,
    coefficients: Vec<f64>,
}

impl NewtonPolynomial {
    pub fn fit(x: &[f64], y: &[f64]) -> PipelineResult<Self> {
        if x.is_empty() || x.len() != y.len() {
            return Err(PipelineError::Configuration(format!(
                "interpolation needs matching non-empty nodes, got {} x and {} y",
                x.len(),
                y.len()
            )));
        }
        let table = divided_differences(x, y)?;
        Ok(Self {
            nodes: x.to_vec(),
            coefficients: table[0].clone(),
        })
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Horner-style evaluation of the nested Newton form.
    pub fn evaluate(&self, t: f64) -> f64 {
        let n = self.coefficients.len() - 1;
        let mut value = self.coefficients[n];
        for k in (0..n).rev() {
            value = self.coefficients[k] + (t - self.nodes[k]) * value;
        }
        value
    }

    pub fn evaluate_linspace(&self, start: f64, end: f64, count: usize) -> Vec<f64> {
        linspace(start, end, count)
            .into_iter()
            .map(|t| self.evaluate(t))
            .collect()
    }
}

/// Divided-difference table; row `i`, column `j` holds `f[x_i, ..., x_{i+j}]`.
pub fn divided_differences(x: &[f64], y: &[f64]) -> PipelineResult<Vec<Vec<f64>>> {
    let n = y.len();
    let mut table = vec![vec![0.0; n]; n];
    for (row, &value) in table.iter_mut().zip(y) {
        row[0] = value;
    }
    for j in 1..n {
        for i in 0..n - j {
            let span = x[i + j] - x[i];
            if span == 0.0 {
                return Err(PipelineError::Configuration(format!(
                    "duplicate interpolation node {}",
                    x[i]
                )));
            }
            table[i][j] = (table[i + 1][j - 1] - table[i][j - 1]) / span;
        }
    }
    Ok(table)
}

/// `count` evenly spaced points covering `[start, end]` inclusive.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count)
                .map(|i| {
                    if i == count - 1 {
                        end
                    } else {
                        start + step * i as f64
                    }
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn polynomial_passes_through_nodes() {
        let x = [0.0, 3.0, 5.0, 7.0, 9.0];
        let y = [2.22e-16, 2.59e-16, 4.31e-15, 1.60e-14, 3.50e-14];
        let poly = NewtonPolynomial::fit(&x, &y).unwrap();
        for (&xi, &yi) in x.iter().zip(&y) {
            assert_relative_eq!(poly.evaluate(xi), yi, max_relative = 1e-9);
        }
    }

    #[test]
    fn quadratic_is_reproduced_exactly() {
        let x = [0.0, 1.0, 2.0];
        let y = [1.0, 2.0, 5.0];
        let poly = NewtonPolynomial::fit(&x, &y).unwrap();
        assert_eq!(poly.coefficients(), &[1.0, 1.0, 1.0]);
        assert_relative_eq!(poly.evaluate(3.0), 10.0);
    }

    #[test]
    fn duplicate_nodes_are_rejected() {
        let err = NewtonPolynomial::fit(&[1.0, 1.0], &[0.0, 1.0]).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }

    #[test]
    fn linspace_includes_both_ends() {
        assert_eq!(linspace(0.0, 10.0, 3), vec![0.0, 5.0, 10.0]);
        assert_eq!(linspace(2.0, 4.0, 1), vec![2.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }
}
