//! Damped Newton iteration over a flattened vector of unknowns.

use std::error::Error as StdError;
use std::fmt;

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/// A square nonlinear system `r(x) = 0`.
pub trait ResidualSystem {
    type Error: StdError + Send + Sync + 'static;

    fn dimension(&self) -> usize;

    /// Evaluate the residual vector at `unknowns`.
    fn residuals(&mut self, unknowns: &[f64]) -> Result<Vec<f64>, Self::Error>;

    /// Analytic Jacobian, if the system can provide one. `None` selects finite differences.
    fn jacobian(&mut self, _unknowns: &[f64]) -> Result<Option<DMatrix<f64>>, Self::Error> {
        Ok(None)
    }
}

/// Solver lifecycle. `Converged` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverState {
    Initialized,
    Iterating,
    Converged,
    Failed,
}

impl SolverState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SolverState::Converged | SolverState::Failed)
    }
}

impl fmt::Display for SolverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SolverState::Initialized => "initialized",
            SolverState::Iterating => "iterating",
            SolverState::Converged => "converged",
            SolverState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverSettings {
    /// Convergence threshold on the largest residual magnitude.
    pub tolerance: f64,
    pub max_iterations: usize,
    /// Relative forward-difference step, scaled by `1 + |x|`.
    pub finite_difference_step: f64,
    /// Step halvings tried when a full Newton step does not reduce the residual.
    pub max_step_halvings: usize,
}

impl SolverSettings {
    /// Reject settings under which no iterate could ever be accepted.
    ///
    /// A zero tolerance is allowed: it never converges, which callers use to
    /// force a full iteration budget.
    pub fn validate(&self) -> Result<(), SolverError> {
        if self.max_iterations == 0 {
            return Err(SolverError::InvalidSettings(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(SolverError::InvalidSettings(format!(
                "tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }
        if !(self.finite_difference_step.is_finite() && self.finite_difference_step > 0.0) {
            return Err(SolverError::InvalidSettings(format!(
                "finite_difference_step must be finite and positive, got {}",
                self.finite_difference_step
            )));
        }
        Ok(())
    }
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            tolerance: 1.0e-6,
            max_iterations: 50,
            finite_difference_step: 1.0e-7,
            max_step_halvings: 4,
        }
    }
}

/// Converged unknowns with the iteration record.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub unknowns: Vec<f64>,
    pub residuals: Vec<f64>,
    pub iterations: usize,
    pub residual_norm: f64,
    /// Residual magnitude observed at every iteration.
    pub history: Vec<f64>,
}

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("no convergence after {iterations} iterations (residual {residual_norm:e})")]
    ConvergenceFailure {
        iterations: usize,
        residual_norm: f64,
        residuals: Vec<f64>,
        unknowns: Vec<f64>,
    },
    #[error("solver is already {0}")]
    Terminal(SolverState),
    #[error("expected {expected} unknowns, received {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("invalid solver settings: {0}")]
    InvalidSettings(String),
    #[error("invalid discretization: {0}")]
    Discretization(String),
    #[error("residual evaluation failed: {0}")]
    System(#[source] Box<dyn StdError + Send + Sync>),
}

/// Newton solver with a one-shot lifecycle.
#[derive(Debug, Clone)]
pub struct NewtonSolver {
    settings: SolverSettings,
    state: SolverState,
}

impl NewtonSolver {
    pub fn new(settings: SolverSettings) -> Self {
        Self {
            settings,
            state: SolverState::Initialized,
        }
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// Drive `system` to convergence from `initial`.
    ///
    /// Every iteration evaluates the residuals at the current unknowns and
    /// checks them against the tolerance; an unconverged iterate takes a
    /// Newton step solved by SVD least squares, halving the step while the
    /// residual magnitude does not decrease. When no halving helps, the
    /// least-bad trial is taken so the search can leave a local plateau.
    /// Exhausting `max_iterations` moves the solver to `Failed` and reports
    /// the lowest-residual iterate seen, not the last one.
    pub fn solve<S: ResidualSystem>(
        &mut self,
        system: &mut S,
        initial: Vec<f64>,
    ) -> Result<Solution, SolverError> {
        if self.state != SolverState::Initialized {
            return Err(SolverError::Terminal(self.state));
        }
        self.settings.validate()?;
        let n = system.dimension();
        if initial.len() != n {
            return Err(SolverError::DimensionMismatch {
                expected: n,
                found: initial.len(),
            });
        }

        self.state = SolverState::Iterating;
        let outcome = self.iterate(system, initial);
        self.state = match outcome {
            Ok(_) => SolverState::Converged,
            Err(_) => SolverState::Failed,
        };
        outcome
    }

    fn iterate<S: ResidualSystem>(
        &self,
        system: &mut S,
        initial: Vec<f64>,
    ) -> Result<Solution, SolverError> {
        let settings = &self.settings;
        let mut x = initial;
        let mut r = evaluate(system, &x)?;
        let mut best = (x.clone(), r.clone(), residual_norm(&r));
        let mut history = Vec::with_capacity(settings.max_iterations);

        for iteration in 1..=settings.max_iterations {
            let norm = residual_norm(&r);
            history.push(norm);
            log::debug!("newton iteration {iteration}: residual {norm:e}");
            if norm < settings.tolerance {
                return Ok(Solution {
                    unknowns: x,
                    residuals: r,
                    iterations: iteration,
                    residual_norm: norm,
                    history,
                });
            }
            if norm < best.2 {
                best = (x.clone(), r.clone(), norm);
            }
            if iteration == settings.max_iterations {
                break;
            }

            let jacobian = match system
                .jacobian(&x)
                .map_err(|e| SolverError::System(Box::new(e)))?
            {
                Some(j) => j,
                None => finite_difference_jacobian(system, &x, &r, settings.finite_difference_step)?,
            };
            let step = newton_step(jacobian, &r);

            let mut alpha = 1.0;
            let mut fallback: Option<(Vec<f64>, Vec<f64>, f64)> = None;
            let mut accepted = None;
            for _ in 0..=settings.max_step_halvings {
                let trial_x: Vec<f64> = x.iter().zip(&step).map(|(xi, dx)| xi + alpha * dx).collect();
                let trial_r = evaluate(system, &trial_x)?;
                let trial_norm = residual_norm(&trial_r);
                if trial_norm < norm {
                    accepted = Some((trial_x, trial_r));
                    break;
                }
                if fallback.as_ref().is_none_or(|f| trial_norm < f.2) {
                    fallback = Some((trial_x, trial_r, trial_norm));
                }
                alpha *= 0.5;
            }
            match accepted.or_else(|| fallback.map(|(fx, fr, _)| (fx, fr))) {
                Some((next_x, next_r)) => {
                    x = next_x;
                    r = next_r;
                }
                None => break,
            }
        }

        let (unknowns, residuals, norm) = best;
        log::debug!(
            "newton solver gave up after {} iterations (best residual {norm:e})",
            settings.max_iterations
        );
        Err(SolverError::ConvergenceFailure {
            iterations: settings.max_iterations,
            residual_norm: norm,
            residuals,
            unknowns,
        })
    }
}

/// Largest residual magnitude; any non-finite entry yields infinity.
pub fn residual_norm(residuals: &[f64]) -> f64 {
    residuals.iter().try_fold(0.0_f64, |acc, r| {
        if r.is_finite() { Some(acc.max(r.abs())) } else { None }
    })
    .unwrap_or(f64::INFINITY)
}

fn evaluate<S: ResidualSystem>(system: &mut S, x: &[f64]) -> Result<Vec<f64>, SolverError> {
    system
        .residuals(x)
        .map_err(|e| SolverError::System(Box::new(e)))
}

fn finite_difference_jacobian<S: ResidualSystem>(
    system: &mut S,
    x: &[f64],
    r: &[f64],
    relative_step: f64,
) -> Result<DMatrix<f64>, SolverError> {
    let n = x.len();
    let mut jacobian = DMatrix::zeros(r.len(), n);
    let mut perturbed = x.to_vec();
    for j in 0..n {
        let h = relative_step * (1.0 + x[j].abs());
        perturbed[j] = x[j] + h;
        let rp = evaluate(system, &perturbed)?;
        for (i, (plus, base)) in rp.iter().zip(r).enumerate() {
            jacobian[(i, j)] = (plus - base) / h;
        }
        perturbed[j] = x[j];
    }
    Ok(jacobian)
}

/// Solve `J·dx = −r` in the least-squares sense; a rank-deficient direction contributes no step.
fn newton_step(jacobian: DMatrix<f64>, r: &[f64]) -> Vec<f64> {
    let n = jacobian.ncols();
    let rhs = DVector::from_iterator(r.len(), r.iter().map(|v| -v));
    if jacobian.iter().any(|v| !v.is_finite()) || rhs.iter().any(|v| !v.is_finite()) {
        return vec![0.0; n];
    }
    let svd = jacobian.svd(true, true);
    let largest = svd.singular_values.iter().cloned().fold(0.0_f64, f64::max);
    let eps = (largest * 1.0e-12).max(f64::MIN_POSITIVE);
    match svd.solve(&rhs, eps) {
        Ok(dx) => dx.iter().cloned().collect(),
        Err(_) => vec![0.0; n],
    }
}
