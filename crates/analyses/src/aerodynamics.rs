//! Linear-lift, parabolic-drag aerodynamic model.

use flight_core::vector::{self, Vector3};
use flight_state::{Conditions, StateError};

use crate::Aerodynamics;
use crate::degenerate;

/// Drag polar `CD = CD0 + k·CL²` with a linear lift curve clipped at `±cl_max`.
#[derive(Debug, Clone, PartialEq)]
pub struct DragPolar {
    pub reference_area_m2: f64,
    pub mean_chord_m: f64,
    pub cl0: f64,
    /// Lift-curve slope (per rad).
    pub cl_alpha: f64,
    pub cl_max: f64,
    pub cd0: f64,
    pub induced_drag_factor: f64,
    pub cm0: f64,
    /// Pitching-moment slope (per rad).
    pub cm_alpha: f64,
    /// Side-force slope with sideslip (per rad).
    pub cy_beta: f64,
}

impl DragPolar {
    /// Static margin in chords implied by the lift and moment slopes.
    pub fn static_margin(&self) -> f64 {
        if self.cl_alpha.abs() > f64::EPSILON {
            -self.cm_alpha / self.cl_alpha
        } else {
            0.0
        }
    }
}

impl Aerodynamics for DragPolar {
    fn evaluate(&self, conditions: &mut Conditions) -> Result<(), StateError> {
        let Conditions {
            frames,
            freestream,
            aerodynamics,
            stability,
            diagnostics,
            ..
        } = conditions;
        let static_margin = self.static_margin();

        for i in 0..freestream.dynamic_pressure.len() {
            let q = freestream.dynamic_pressure[i];
            let force: Vector3;
            if q <= 0.0 {
                degenerate::zero_dynamic_pressure(q, i, diagnostics);
                aerodynamics.lift_coefficient[i] = 0.0;
                aerodynamics.drag_coefficient[i] = 0.0;
                aerodynamics.side_force_coefficient[i] = 0.0;
                aerodynamics.lift[i] = 0.0;
                aerodynamics.drag[i] = 0.0;
                stability.moment_coefficient[i] = 0.0;
                stability.pitching_moment[i] = 0.0;
                force = vector::ZERO;
            } else {
                let alpha = frames.wind.angle_of_attack[i];
                let beta = frames.wind.sideslip_angle[i];
                let cl = degenerate::zero_nan(self.cl0 + self.cl_alpha * alpha, "lift_coefficient", i, diagnostics);
                let cl = degenerate::clip_lift(cl, self.cl_max, i, diagnostics);
                let cd = self.drag_coefficient(cl);
                let cy = self.cy_beta * beta;
                let cm = self.cm0 + self.cm_alpha * alpha;

                let qs = q * self.reference_area_m2;
                let lift = qs * cl;
                let drag = qs * cd;
                let side = qs * cy;
                aerodynamics.lift_coefficient[i] = cl;
                aerodynamics.drag_coefficient[i] = cd;
                aerodynamics.side_force_coefficient[i] = cy;
                aerodynamics.lift[i] = lift;
                aerodynamics.drag[i] = drag;
                stability.moment_coefficient[i] = cm;
                stability.pitching_moment[i] = qs * self.mean_chord_m * cm;

                let theta = frames.body.inclination_angle[i];
                force = match vector::unit(&frames.inertial.velocity_vector[i]) {
                    Some(u) => {
                        let lift_dir = lift_direction(&u, theta);
                        let side_dir = vector::cross(&u, &lift_dir);
                        let f = vector::scale(&u, -drag);
                        let f = vector::add(&f, &vector::scale(&lift_dir, lift));
                        vector::add(&f, &vector::scale(&side_dir, side))
                    }
                    None => vector::ZERO,
                };
            }
            stability.static_margin[i] = static_margin;
            frames.inertial.aerodynamic_force_vector[i] = force;
        }
        Ok(())
    }

    fn reference_area(&self) -> f64 {
        self.reference_area_m2
    }

    fn trim_angle_of_attack(&self, lift_coefficient: f64) -> f64 {
        if self.cl_alpha.abs() > f64::EPSILON {
            (lift_coefficient - self.cl0) / self.cl_alpha
        } else {
            0.0
        }
    }

    fn drag_coefficient(&self, lift_coefficient: f64) -> f64 {
        self.cd0 + self.induced_drag_factor * lift_coefficient * lift_coefficient
    }
}

/// Unit vector normal to the velocity, in the plane of the velocity and the body z-axis, pointing up.
fn lift_direction(u: &Vector3, theta: f64) -> Vector3 {
    let up_body = [-theta.sin(), 0.0, -theta.cos()];
    let along = vector::scale(u, vector::dot(&up_body, u));
    vector::unit(&vector::sub(&up_body, &along)).unwrap_or([0.0, 0.0, -1.0])
}
