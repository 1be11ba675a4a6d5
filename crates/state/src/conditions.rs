//! Condition records grouped by domain. Every array holds one entry per control point.

use flight_core::vector::{Vector3, ZERO};
use nalgebra::DMatrix;
use serde::Serialize;

/// Inertial (north-east-down) kinematics and force resultants.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InertialFrame {
    pub time: Vec<f64>,
    pub position_vector: Vec<Vector3>,
    pub velocity_vector: Vec<Vector3>,
    pub acceleration_vector: Vec<Vector3>,
    pub gravity_force_vector: Vec<Vector3>,
    pub aerodynamic_force_vector: Vec<Vector3>,
    pub thrust_force_vector: Vec<Vector3>,
    pub total_force_vector: Vec<Vector3>,
}

/// Body-fixed orientation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BodyFrame {
    /// Pitch of the body x-axis above the local horizon (rad).
    pub inclination_angle: Vec<f64>,
}

/// Wind-axis angles derived from velocity and body orientation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WindFrame {
    pub angle_of_attack: Vec<f64>,
    pub sideslip_angle: Vec<f64>,
    pub flight_path_angle: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Frames {
    pub inertial: InertialFrame,
    pub body: BodyFrame,
    pub wind: WindFrame,
}

/// Ambient air properties and derived flow quantities.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Freestream {
    pub altitude: Vec<f64>,
    pub density: Vec<f64>,
    pub temperature: Vec<f64>,
    pub pressure: Vec<f64>,
    pub speed_of_sound: Vec<f64>,
    pub dynamic_viscosity: Vec<f64>,
    pub velocity: Vec<f64>,
    pub mach_number: Vec<f64>,
    pub dynamic_pressure: Vec<f64>,
    pub gravity: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AerodynamicConditions {
    pub lift_coefficient: Vec<f64>,
    pub drag_coefficient: Vec<f64>,
    pub side_force_coefficient: Vec<f64>,
    pub lift: Vec<f64>,
    pub drag: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StabilityConditions {
    pub moment_coefficient: Vec<f64>,
    pub pitching_moment: Vec<f64>,
    pub static_margin: Vec<f64>,
}

/// Per-rotor operating point. Present only for rotor-driven networks.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RotorConditions {
    pub power_coefficient: Vec<f64>,
    pub thrust_coefficient: Vec<f64>,
    pub advance_ratio: Vec<f64>,
    pub rpm: Vec<f64>,
    pub torque: Vec<f64>,
    pub tip_mach: Vec<f64>,
    /// Normalization for the motor/rotor torque balance (N·m).
    pub torque_scale: f64,
}

/// Per-motor electrical operating point, torques referred to the rotor shaft.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MotorConditions {
    pub voltage: Vec<f64>,
    pub current: Vec<f64>,
    pub torque: Vec<f64>,
    pub omega: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PropulsionConditions {
    pub throttle: Vec<f64>,
    /// Thrust axis tilt above the body x-axis (rad).
    pub thrust_tilt_angle: Vec<f64>,
    pub thrust: Vec<f64>,
    pub shaft_power: Vec<f64>,
    pub rotor: Option<RotorConditions>,
    pub motor: Option<MotorConditions>,
}

/// Cumulative aging of an energy-storage pack, carried across segments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatteryAge {
    pub cycle_day: u32,
    pub charge_throughput_ah: f64,
    /// Remaining fraction of nominal capacity.
    pub capacity_fade: f64,
    /// Multiplier on internal resistance.
    pub resistance_growth: f64,
}

impl Default for BatteryAge {
    fn default() -> Self {
        Self {
            cycle_day: 0,
            charge_throughput_ah: 0.0,
            capacity_fade: 1.0,
            resistance_growth: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatteryConditions {
    pub energy: Vec<f64>,
    pub state_of_charge: Vec<f64>,
    pub current: Vec<f64>,
    pub voltage_open_circuit: Vec<f64>,
    pub voltage_under_load: Vec<f64>,
    pub resistive_losses: Vec<f64>,
    /// Cumulative charge drawn during the segment (A·h).
    pub charge_throughput: Vec<f64>,
    pub initial_energy: f64,
    pub capacity: f64,
    pub age: BatteryAge,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FuelConditions {
    pub fuel_flow_rate: Vec<f64>,
    pub fuel_burned: Vec<f64>,
    pub vehicle_additional_fuel_rate: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnergyConditions {
    pub power_draw: Vec<f64>,
    pub battery: Option<BatteryConditions>,
    pub fuel: Option<FuelConditions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeightConditions {
    pub total_mass: Vec<f64>,
    pub mass_rate: Vec<f64>,
    pub initial_mass: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NoiseConditions {
    pub sound_pressure_level: Vec<f64>,
    pub observer_distance: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmissionConditions {
    pub co2_rate: Vec<f64>,
    pub h2o_rate: Vec<f64>,
    pub nox_rate: Vec<f64>,
    pub total_co2: Vec<f64>,
    pub total_h2o: Vec<f64>,
    pub total_nox: Vec<f64>,
}

/// Counts of numeric degeneracies normalized during the latest pipeline pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub zero_dynamic_pressure: usize,
    pub lift_clipped: usize,
    pub current_clamped: usize,
    pub nan_replaced: usize,
}

impl Diagnostics {
    pub fn total(&self) -> usize {
        self.zero_dynamic_pressure + self.lift_clipped + self.current_clamped + self.nan_replaced
    }
}

/// Collocation operators scaled to the segment's time span.
#[derive(Debug, Clone, PartialEq)]
pub struct Numerics {
    pub dimensionless_time: Vec<f64>,
    pub differentiate: DMatrix<f64>,
    pub integrate: DMatrix<f64>,
}

impl Numerics {
    /// Zero operators for `points` control points.
    pub fn zeros(points: usize) -> Self {
        Self {
            dimensionless_time: vec![0.0; points],
            differentiate: DMatrix::zeros(points, points),
            integrate: DMatrix::zeros(points, points),
        }
    }

    /// Cumulative integral of `values` from the first control point.
    pub fn integrate(&self, values: &[f64]) -> Vec<f64> {
        apply(&self.integrate, values)
    }

    /// Time derivative of `values` at every control point.
    pub fn differentiate(&self, values: &[f64]) -> Vec<f64> {
        apply(&self.differentiate, values)
    }
}

fn apply(matrix: &DMatrix<f64>, values: &[f64]) -> Vec<f64> {
    (0..matrix.nrows())
        .map(|row| {
            values
                .iter()
                .enumerate()
                .map(|(col, v)| matrix[(row, col)] * v)
                .sum()
        })
        .collect()
}

/// Which optional records a container carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Layout {
    pub points: usize,
    pub rotor: bool,
    pub battery: bool,
    pub fuel: bool,
    pub additional_fuel: bool,
    pub noise: bool,
    pub emissions: bool,
}

pub(crate) fn zeros(points: usize) -> Vec<f64> {
    vec![0.0; points]
}

pub(crate) fn zero_vectors(points: usize) -> Vec<Vector3> {
    vec![ZERO; points]
}
