//! Mission evaluation: segment initialization, residual solving and sequencing.
//!
//! A [`Mission`] is an ordered list of [`Segment`]s sharing one or more
//! [`Analyses`](flight_analyses::Analyses) bundles. Each segment is initialized
//! from its scalar parameters and the previous segment's final state, solved
//! with a Newton iteration over the update pipeline, and handed forward.

pub mod build;
pub mod initializer;
pub mod segment;
pub mod sequencer;
pub mod system;
pub mod updates;

use flight_atmosphere::AtmosphereError;
use flight_solver::SolverError;
use flight_state::StateError;
use thiserror::Error;

pub use build::{build_analyses, build_mission};
pub use initializer::{InitializedSegment, initialize};
pub use segment::{DEFAULT_CONTROL_POINTS, Segment, SegmentKind, VerticalProfile};
pub use sequencer::{
    CarriedState, Mission, MissionResults, MissionSettings, SegmentResult, SegmentStatus,
    solve_segment,
};
pub use system::SegmentSystem;
pub use updates::{PIPELINE, Update, run_pipeline};

/// Errors raised while assembling or evaluating a mission.
#[derive(Debug, Error)]
pub enum MissionError {
    #[error("segment '{segment}': {parameter} is not specified and no previous segment provides it")]
    MissingInitialCondition {
        segment: String,
        parameter: &'static str,
    },
    #[error("segment '{segment}': {reason}")]
    InconsistentSegmentSpecification { segment: String, reason: String },
    #[error(
        "segment '{segment}' did not converge after {iterations} iterations (residual {residual_norm:e})"
    )]
    ConvergenceFailure {
        segment: String,
        iterations: usize,
        residual_norm: f64,
        residuals: Vec<f64>,
    },
    #[error("segment '{segment}': {source}")]
    Atmosphere {
        segment: String,
        #[source]
        source: AtmosphereError,
    },
    #[error("segment '{segment}': {source}")]
    Solver {
        segment: String,
        #[source]
        source: SolverError,
    },
    #[error("segment '{segment}': {source}")]
    State {
        segment: String,
        #[source]
        source: StateError,
    },
    #[error("vehicle '{0}' not found in catalog")]
    UnknownVehicle(String),
    #[error("vehicle '{vehicle}' is invalid: {reason}")]
    InvalidVehicle { vehicle: String, reason: String },
    #[error("invalid solver settings: {0}")]
    InvalidSolverSettings(String),
    #[error("mission has no segments")]
    EmptyMission,
    #[error("mission cancelled after {completed} segment(s)")]
    Cancelled { completed: usize },
}

impl MissionError {
    pub(crate) fn inconsistent(segment: &str, reason: impl Into<String>) -> Self {
        MissionError::InconsistentSegmentSpecification {
            segment: segment.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn state(segment: &str, source: StateError) -> Self {
        MissionError::State {
            segment: segment.to_string(),
            source,
        }
    }
}
