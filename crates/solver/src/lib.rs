//! Numerical machinery for segment solving: Chebyshev collocation operators and a
//! Newton residual solver with finite-difference Jacobians.

pub mod chebyshev;
pub mod newton;

pub use chebyshev::{Discretization, chebyshev};
pub use newton::{NewtonSolver, ResidualSystem, Solution, SolverError, SolverSettings, SolverState};
