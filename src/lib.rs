//! Conceptual aircraft mission-performance toolkit.
//!
//! The member crates are re-exported here so front-ends depend on one crate:
//! state containers, analysis models, the Newton segment solver, mission
//! sequencing, configuration and export.

use std::path::Path;

use thiserror::Error;

pub use flight_analyses as analyses;
pub use flight_atmosphere as atmosphere;
pub use flight_config as config;
pub use flight_core as core;
pub use flight_export as export;
pub use flight_mission as mission;
pub use flight_propulsion as propulsion;
pub use flight_solver as solver;
pub use flight_state as state;

/// Errors from loading and evaluating a mission file end to end.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] flight_config::ConfigError),
    #[error(transparent)]
    Mission(#[from] flight_mission::MissionError),
}

/// Load a mission file and vehicle catalog, then evaluate the mission.
pub fn evaluate_mission_file(
    mission_path: impl AsRef<Path>,
    catalog_path: impl AsRef<Path>,
) -> Result<flight_mission::MissionResults, Error> {
    let file = flight_config::load_mission(mission_path)?;
    let vehicles = flight_config::load_vehicle_configs(catalog_path)?;
    let mission = flight_mission::build_mission(&file, &vehicles)?;
    Ok(mission.evaluate()?)
}

/// Returns the version of the library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
