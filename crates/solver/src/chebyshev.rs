//! Chebyshev–Gauss–Lobatto collocation on the unit interval.

use std::f64::consts::PI;

use nalgebra::DMatrix;

use crate::newton::SolverError;

/// Collocation points on `[0, 1]` with matching differentiation and integration operators.
#[derive(Debug, Clone, PartialEq)]
pub struct Discretization {
    pub dimensionless_time: Vec<f64>,
    pub differentiate: DMatrix<f64>,
    /// Cumulative integral from the first point; the first row is zero.
    pub integrate: DMatrix<f64>,
}

impl Discretization {
    pub fn points(&self) -> usize {
        self.dimensionless_time.len()
    }

    /// Operators rescaled from the unit interval to a span of `duration` seconds.
    pub fn scaled(&self, duration: f64) -> (DMatrix<f64>, DMatrix<f64>) {
        if duration > 0.0 {
            (
                &self.differentiate / duration,
                &self.integrate * duration,
            )
        } else {
            let n = self.points();
            (DMatrix::zeros(n, n), DMatrix::zeros(n, n))
        }
    }
}

/// Build the collocation for `points` nodes. A single node yields zero operators.
pub fn chebyshev(points: usize) -> Result<Discretization, SolverError> {
    match points {
        0 => Err(SolverError::Discretization(
            "at least one control point is required".to_string(),
        )),
        1 => Ok(Discretization {
            dimensionless_time: vec![0.0],
            differentiate: DMatrix::zeros(1, 1),
            integrate: DMatrix::zeros(1, 1),
        }),
        n => {
            let span = (n - 1) as f64;
            let mut x: Vec<f64> = (0..n)
                .map(|j| 0.5 * (1.0 - (PI * j as f64 / span).cos()))
                .collect();
            x[0] = 0.0;
            x[n - 1] = 1.0;

            let c: Vec<f64> = (0..n)
                .map(|j| {
                    let weight = if j == 0 || j == n - 1 { 2.0 } else { 1.0 };
                    if j % 2 == 0 { weight } else { -weight }
                })
                .collect();

            let mut d = DMatrix::zeros(n, n);
            for i in 0..n {
                let mut row_sum = 0.0;
                for j in 0..n {
                    if i != j {
                        let value = (c[i] / c[j]) / (x[i] - x[j]);
                        d[(i, j)] = value;
                        row_sum += value;
                    }
                }
                d[(i, i)] = -row_sum;
            }

            let inner = d
                .view((1, 1), (n - 1, n - 1))
                .into_owned()
                .try_inverse()
                .ok_or_else(|| {
                    SolverError::Discretization(format!(
                        "differentiation operator for {n} points is singular"
                    ))
                })?;
            let mut integrate = DMatrix::zeros(n, n);
            integrate.view_mut((1, 1), (n - 1, n - 1)).copy_from(&inner);

            Ok(Discretization {
                dimensionless_time: x,
                differentiate: d,
                integrate,
            })
        }
    }
}
