//! Update pipeline evaluated on every solver pass.
//!
//! Each update reads fields written by the initializer, the solver or an
//! earlier update and writes its own documented fields. The pipeline is
//! idempotent: two passes over unchanged unknowns leave the container
//! bitwise identical.

use flight_analyses::Analyses;
use flight_core::vector::{self, Vector3, pitched_axis};
use flight_state::{Conditions, Diagnostics, StateError};

/// One stage of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    /// Wind-axis angles from velocity and body angle.
    Orientations,
    Aerodynamics,
    /// Thrust, power draw and storage state from the energy network.
    Energy,
    /// Mass history from the network's mass rate.
    Weights,
    /// Gravity and the total force resultant.
    Forces,
    Noise,
    Emissions,
}

/// Fixed evaluation order.
pub const PIPELINE: [Update; 7] = [
    Update::Orientations,
    Update::Aerodynamics,
    Update::Energy,
    Update::Weights,
    Update::Forces,
    Update::Noise,
    Update::Emissions,
];

impl Update {
    pub fn apply(self, analyses: &Analyses, conditions: &mut Conditions) -> Result<(), StateError> {
        match self {
            Update::Orientations => {
                update_orientations(conditions);
                Ok(())
            }
            Update::Aerodynamics => analyses.aerodynamics.evaluate(conditions),
            Update::Energy => analyses.energy.evaluate(conditions),
            Update::Weights => {
                update_weights(conditions);
                Ok(())
            }
            Update::Forces => {
                update_forces(conditions);
                Ok(())
            }
            Update::Noise => match &analyses.noise {
                Some(model) => model.evaluate(conditions),
                None => Ok(()),
            },
            Update::Emissions => match &analyses.emissions {
                Some(model) => model.evaluate(conditions),
                None => Ok(()),
            },
        }
    }
}

/// Run every stage in order, then verify the container kept its shape.
pub fn run_pipeline(analyses: &Analyses, conditions: &mut Conditions) -> Result<(), StateError> {
    conditions.diagnostics = Diagnostics::default();
    for update in PIPELINE {
        update.apply(analyses, conditions)?;
    }
    conditions.check_shape()
}

/// Climb angle of `velocity` above the horizon (NED, so `-v_z` is up).
pub(crate) fn flight_path_angle(velocity: &Vector3) -> f64 {
    (-velocity[2]).atan2(velocity[0].hypot(velocity[1]))
}

fn update_orientations(conditions: &mut Conditions) {
    let Conditions { frames, .. } = conditions;
    for i in 0..frames.inertial.velocity_vector.len() {
        let velocity = frames.inertial.velocity_vector[i];
        let theta = frames.body.inclination_angle[i];
        let speed = vector::norm(&velocity);
        let body_x = pitched_axis(theta);
        let body_z = [theta.sin(), 0.0, theta.cos()];
        let (alpha, beta) = if speed > 0.0 {
            (
                vector::dot(&velocity, &body_z).atan2(vector::dot(&velocity, &body_x)),
                (velocity[1] / speed).asin(),
            )
        } else {
            (0.0, frames.wind.sideslip_angle[i])
        };
        frames.wind.angle_of_attack[i] = alpha;
        frames.wind.sideslip_angle[i] = beta;
        frames.wind.flight_path_angle[i] = flight_path_angle(&velocity);
    }
}

fn update_weights(conditions: &mut Conditions) {
    let burned = conditions.numerics.integrate(&conditions.weights.mass_rate);
    let initial = conditions.weights.initial_mass;
    for (mass, delta) in conditions.weights.total_mass.iter_mut().zip(burned) {
        *mass = initial + delta;
    }
}

fn update_forces(conditions: &mut Conditions) {
    let Conditions {
        frames,
        freestream,
        weights,
        ..
    } = conditions;
    let inertial = &mut frames.inertial;
    for i in 0..inertial.total_force_vector.len() {
        let gravity: Vector3 = [0.0, 0.0, weights.total_mass[i] * freestream.gravity[i]];
        let total = vector::add(&inertial.aerodynamic_force_vector[i], &inertial.thrust_force_vector[i]);
        inertial.gravity_force_vector[i] = gravity;
        inertial.total_force_vector[i] = vector::add(&total, &gravity);
    }
}
