//! Residual system binding a segment's container to the Newton solver.

use flight_analyses::Analyses;
use flight_solver::ResidualSystem;
use flight_state::{Conditions, Coupling, StateError};

/// Unknowns are laid out coupling by coupling, one block of `points` values
/// each; residuals follow the same order.
pub struct SegmentSystem<'a> {
    analyses: &'a Analyses,
    conditions: &'a mut Conditions,
    couplings: &'a [Coupling],
}

impl<'a> SegmentSystem<'a> {
    pub fn new(analyses: &'a Analyses, conditions: &'a mut Conditions, couplings: &'a [Coupling]) -> Self {
        Self {
            analyses,
            conditions,
            couplings,
        }
    }

    /// Write `unknowns` into the container and run the update pipeline.
    pub fn apply(&mut self, unknowns: &[f64]) -> Result<(), StateError> {
        let points = self.conditions.points();
        if points > 0 {
            for (coupling, values) in self.couplings.iter().zip(unknowns.chunks(points)) {
                self.conditions.write_unknown(coupling.unknown, values)?;
            }
        }
        crate::updates::run_pipeline(self.analyses, self.conditions)
    }

    /// Residuals of the current container contents.
    pub fn gather(&self) -> Result<Vec<f64>, StateError> {
        let mut residuals = Vec::with_capacity(self.couplings.len() * self.conditions.points());
        for coupling in self.couplings {
            residuals.extend(self.conditions.residual(coupling.residual)?);
        }
        Ok(residuals)
    }
}

impl ResidualSystem for SegmentSystem<'_> {
    type Error = StateError;

    fn dimension(&self) -> usize {
        self.couplings.len() * self.conditions.points()
    }

    fn residuals(&mut self, unknowns: &[f64]) -> Result<Vec<f64>, StateError> {
        self.apply(unknowns)?;
        self.gather()
    }
}
