//! Analysis bundle shared by every segment of a mission.
//!
//! The bundle groups the callable models a segment evaluates on each solver
//! pass. It is assembled once, wrapped in an `Arc`, and never mutated
//! afterwards; segments only read from it.

pub mod aerodynamics;
mod degenerate;
pub mod emissions;
pub mod networks;
pub mod noise;

use std::fmt;
use std::sync::Arc;

use flight_atmosphere::StandardAtmosphere;
use flight_state::{BatteryAge, Conditions, Coupling, Layout, StateError};

pub use aerodynamics::DragPolar;
pub use emissions::EmissionIndices;
pub use networks::{BatteryPropeller, TurbofanNetwork};
pub use noise::EmpiricalNoise;

/// Aerodynamic coefficient model.
pub trait Aerodynamics: Send + Sync + fmt::Debug {
    /// Fill aerodynamic coefficients, forces and stability terms from the wind-axis angles.
    fn evaluate(&self, conditions: &mut Conditions) -> Result<(), StateError>;

    fn reference_area(&self) -> f64;

    /// Angle of attack that produces `lift_coefficient` (small-angle, unclipped).
    fn trim_angle_of_attack(&self, lift_coefficient: f64) -> f64;

    fn drag_coefficient(&self, lift_coefficient: f64) -> f64;
}

/// Which optional state records a network writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkLayout {
    pub rotor: bool,
    pub battery: bool,
    pub fuel: bool,
    pub additional_fuel: bool,
}

/// Analytic starting point for the propulsion unknowns at one control point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrottleGuess {
    pub throttle: f64,
    pub power_coefficient: Option<f64>,
}

/// Thrust, power and energy-storage model.
pub trait EnergyNetwork: Send + Sync + fmt::Debug {
    fn layout(&self) -> NetworkLayout;

    /// Additional unknown/residual pairs the network needs solved.
    fn couplings(&self) -> Vec<Coupling> {
        Vec::new()
    }

    /// Thrust axis tilt above the body x-axis used when a segment does not prescribe one (rad).
    fn default_thrust_angle(&self) -> f64;

    /// Seed storage quantities from the previous segment, or a full pack when there is none.
    fn initialize(
        &self,
        conditions: &mut Conditions,
        previous_energy: Option<f64>,
        age: BatteryAge,
    ) -> Result<(), StateError>;

    /// Compute thrust, power draw, fuel flow and storage state for every control point.
    fn evaluate(&self, conditions: &mut Conditions) -> Result<(), StateError>;

    /// Throttle (and rotor coefficient) expected to deliver `required_thrust` at `index`.
    fn initial_guess(&self, conditions: &Conditions, index: usize, required_thrust: f64) -> ThrottleGuess;

    /// Storage age after the segment held by `conditions`, when the network models aging.
    fn advance_storage_age(&self, _conditions: &Conditions) -> Option<BatteryAge> {
        None
    }
}

/// Community noise estimate.
pub trait NoiseModel: Send + Sync + fmt::Debug {
    fn evaluate(&self, conditions: &mut Conditions) -> Result<(), StateError>;
}

/// Emissions inventory.
pub trait EmissionsModel: Send + Sync + fmt::Debug {
    fn evaluate(&self, conditions: &mut Conditions) -> Result<(), StateError>;
}

/// Mass properties of the flying vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub name: String,
    pub mass_kg: f64,
}

/// Read-only set of models evaluated by every segment of a mission.
#[derive(Clone)]
pub struct Analyses {
    pub vehicle: Vehicle,
    pub atmosphere: StandardAtmosphere,
    pub aerodynamics: Arc<dyn Aerodynamics>,
    pub energy: Arc<dyn EnergyNetwork>,
    pub noise: Option<Arc<dyn NoiseModel>>,
    pub emissions: Option<Arc<dyn EmissionsModel>>,
}

impl fmt::Debug for Analyses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyses")
            .field("vehicle", &self.vehicle.name)
            .field("aerodynamics", &self.aerodynamics)
            .field("energy", &self.energy)
            .field("noise", &self.noise.is_some())
            .field("emissions", &self.emissions.is_some())
            .finish()
    }
}

impl Analyses {
    /// Container layout for `points` control points under this bundle.
    pub fn layout(&self, points: usize) -> Layout {
        let network = self.energy.layout();
        Layout {
            points,
            rotor: network.rotor,
            battery: network.battery,
            fuel: network.fuel,
            additional_fuel: network.additional_fuel,
            noise: self.noise.is_some(),
            emissions: self.emissions.is_some(),
        }
    }
}
