//! State container for a single flight segment.
//!
//! A [`Conditions`] value owns every per-control-point array a segment needs:
//! kinematics, freestream, aerodynamic and propulsive operating points, energy,
//! weights and the optional noise and emissions records. Update functions
//! mutate it in place; solver unknowns are written into and residuals read out
//! of it through [`UnknownKind`] and [`ResidualKind`].

pub mod conditions;

use std::fmt;

use flight_core::constants::G0;
use flight_core::vector::Vector3;
use serde::Serialize;
use thiserror::Error;

pub use conditions::*;

/// Errors raised when a container is accessed inconsistently with its layout.
#[derive(Debug, Error, PartialEq)]
pub enum StateError {
    #[error("condition '{path}' has {found} entries, expected {expected}")]
    ShapeMismatch {
        path: String,
        expected: usize,
        found: usize,
    },
    #[error("condition record '{0}' is not present in this container")]
    MissingRecord(&'static str),
}

/// Quantities the residual solver may vary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownKind {
    BodyAngle,
    Throttle,
    Acceleration,
    ThrustTilt,
    RotorPowerCoefficient,
}

impl UnknownKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnknownKind::BodyAngle => "body_angle",
            UnknownKind::Throttle => "throttle",
            UnknownKind::Acceleration => "acceleration",
            UnknownKind::ThrustTilt => "thrust_tilt",
            UnknownKind::RotorPowerCoefficient => "rotor_power_coefficient",
        }
    }
}

impl fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Equations the residual solver drives to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResidualKind {
    /// Net horizontal force minus mass times acceleration, over weight.
    ForceX,
    /// Net vertical force minus mass times acceleration, over weight.
    ForceZ,
    /// Motor shaft torque minus rotor aerodynamic torque, over the torque scale.
    MotorTorque,
}

impl ResidualKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResidualKind::ForceX => "force_x",
            ResidualKind::ForceZ => "force_z",
            ResidualKind::MotorTorque => "motor_torque",
        }
    }
}

impl fmt::Display for ResidualKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An unknown paired with the residual it controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Coupling {
    pub unknown: UnknownKind,
    pub residual: ResidualKind,
}

impl Coupling {
    pub const fn new(unknown: UnknownKind, residual: ResidualKind) -> Self {
        Self { unknown, residual }
    }
}

/// Snapshot of the last control point, used to seed the following segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalState {
    pub time: f64,
    pub position: Vector3,
    pub velocity: Vector3,
    pub altitude: f64,
    pub mass: f64,
    pub body_angle: f64,
    pub throttle: f64,
    pub battery_energy: Option<f64>,
    pub fuel_burned: Option<f64>,
}

/// Complete per-segment state container.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conditions {
    pub frames: Frames,
    pub freestream: Freestream,
    pub aerodynamics: AerodynamicConditions,
    pub stability: StabilityConditions,
    pub propulsion: PropulsionConditions,
    pub energy: EnergyConditions,
    pub weights: WeightConditions,
    pub noise: Option<NoiseConditions>,
    pub emissions: Option<EmissionConditions>,
    pub diagnostics: Diagnostics,
    #[serde(skip)]
    pub numerics: Numerics,
}

impl Conditions {
    /// Zero-filled container with the records requested by `layout`.
    pub fn new(layout: &Layout) -> Self {
        let n = layout.points;
        let z = || zeros(n);
        let v = || zero_vectors(n);
        Self {
            frames: Frames {
                inertial: InertialFrame {
                    time: z(),
                    position_vector: v(),
                    velocity_vector: v(),
                    acceleration_vector: v(),
                    gravity_force_vector: v(),
                    aerodynamic_force_vector: v(),
                    thrust_force_vector: v(),
                    total_force_vector: v(),
                },
                body: BodyFrame {
                    inclination_angle: z(),
                },
                wind: WindFrame {
                    angle_of_attack: z(),
                    sideslip_angle: z(),
                    flight_path_angle: z(),
                },
            },
            freestream: Freestream {
                altitude: z(),
                density: z(),
                temperature: z(),
                pressure: z(),
                speed_of_sound: z(),
                dynamic_viscosity: z(),
                velocity: z(),
                mach_number: z(),
                dynamic_pressure: z(),
                gravity: z(),
            },
            aerodynamics: AerodynamicConditions {
                lift_coefficient: z(),
                drag_coefficient: z(),
                side_force_coefficient: z(),
                lift: z(),
                drag: z(),
            },
            stability: StabilityConditions {
                moment_coefficient: z(),
                pitching_moment: z(),
                static_margin: z(),
            },
            propulsion: PropulsionConditions {
                throttle: z(),
                thrust_tilt_angle: z(),
                thrust: z(),
                shaft_power: z(),
                rotor: layout.rotor.then(|| RotorConditions {
                    power_coefficient: z(),
                    thrust_coefficient: z(),
                    advance_ratio: z(),
                    rpm: z(),
                    torque: z(),
                    tip_mach: z(),
                    torque_scale: 1.0,
                }),
                motor: layout.rotor.then(|| MotorConditions {
                    voltage: z(),
                    current: z(),
                    torque: z(),
                    omega: z(),
                }),
            },
            energy: EnergyConditions {
                power_draw: z(),
                battery: layout.battery.then(|| BatteryConditions {
                    energy: z(),
                    state_of_charge: z(),
                    current: z(),
                    voltage_open_circuit: z(),
                    voltage_under_load: z(),
                    resistive_losses: z(),
                    charge_throughput: z(),
                    initial_energy: 0.0,
                    capacity: 0.0,
                    age: BatteryAge::default(),
                }),
                fuel: layout.fuel.then(|| FuelConditions {
                    fuel_flow_rate: z(),
                    fuel_burned: z(),
                    vehicle_additional_fuel_rate: layout.additional_fuel.then(z),
                }),
            },
            weights: WeightConditions {
                total_mass: z(),
                mass_rate: z(),
                initial_mass: 0.0,
            },
            noise: layout.noise.then(|| NoiseConditions {
                sound_pressure_level: z(),
                observer_distance: z(),
            }),
            emissions: layout.emissions.then(|| EmissionConditions {
                co2_rate: z(),
                h2o_rate: z(),
                nox_rate: z(),
                total_co2: z(),
                total_h2o: z(),
                total_nox: z(),
            }),
            diagnostics: Diagnostics::default(),
            numerics: Numerics::zeros(n),
        }
    }

    /// Number of control points.
    pub fn points(&self) -> usize {
        self.frames.inertial.time.len()
    }

    /// Every scalar condition path with its values; vector fields are split per axis.
    pub fn scalar_columns(&self) -> Vec<(String, Vec<f64>)> {
        let mut out = Columns::default();
        let inertial = &self.frames.inertial;
        out.scalar("frames.inertial.time", &inertial.time);
        out.vector("frames.inertial.position_vector", &inertial.position_vector);
        out.vector("frames.inertial.velocity_vector", &inertial.velocity_vector);
        out.vector(
            "frames.inertial.acceleration_vector",
            &inertial.acceleration_vector,
        );
        out.vector(
            "frames.inertial.gravity_force_vector",
            &inertial.gravity_force_vector,
        );
        out.vector(
            "frames.inertial.aerodynamic_force_vector",
            &inertial.aerodynamic_force_vector,
        );
        out.vector(
            "frames.inertial.thrust_force_vector",
            &inertial.thrust_force_vector,
        );
        out.vector(
            "frames.inertial.total_force_vector",
            &inertial.total_force_vector,
        );
        out.scalar(
            "frames.body.inclination_angle",
            &self.frames.body.inclination_angle,
        );
        let wind = &self.frames.wind;
        out.scalar("frames.wind.angle_of_attack", &wind.angle_of_attack);
        out.scalar("frames.wind.sideslip_angle", &wind.sideslip_angle);
        out.scalar("frames.wind.flight_path_angle", &wind.flight_path_angle);

        let fs = &self.freestream;
        out.scalar("freestream.altitude", &fs.altitude);
        out.scalar("freestream.density", &fs.density);
        out.scalar("freestream.temperature", &fs.temperature);
        out.scalar("freestream.pressure", &fs.pressure);
        out.scalar("freestream.speed_of_sound", &fs.speed_of_sound);
        out.scalar("freestream.dynamic_viscosity", &fs.dynamic_viscosity);
        out.scalar("freestream.velocity", &fs.velocity);
        out.scalar("freestream.mach_number", &fs.mach_number);
        out.scalar("freestream.dynamic_pressure", &fs.dynamic_pressure);
        out.scalar("freestream.gravity", &fs.gravity);

        let aero = &self.aerodynamics;
        out.scalar("aerodynamics.lift_coefficient", &aero.lift_coefficient);
        out.scalar("aerodynamics.drag_coefficient", &aero.drag_coefficient);
        out.scalar(
            "aerodynamics.side_force_coefficient",
            &aero.side_force_coefficient,
        );
        out.scalar("aerodynamics.lift", &aero.lift);
        out.scalar("aerodynamics.drag", &aero.drag);

        let stab = &self.stability;
        out.scalar("stability.moment_coefficient", &stab.moment_coefficient);
        out.scalar("stability.pitching_moment", &stab.pitching_moment);
        out.scalar("stability.static_margin", &stab.static_margin);

        let prop = &self.propulsion;
        out.scalar("propulsion.throttle", &prop.throttle);
        out.scalar("propulsion.thrust_tilt_angle", &prop.thrust_tilt_angle);
        out.scalar("propulsion.thrust", &prop.thrust);
        out.scalar("propulsion.shaft_power", &prop.shaft_power);
        if let Some(rotor) = &prop.rotor {
            out.scalar("propulsion.rotor.power_coefficient", &rotor.power_coefficient);
            out.scalar(
                "propulsion.rotor.thrust_coefficient",
                &rotor.thrust_coefficient,
            );
            out.scalar("propulsion.rotor.advance_ratio", &rotor.advance_ratio);
            out.scalar("propulsion.rotor.rpm", &rotor.rpm);
            out.scalar("propulsion.rotor.torque", &rotor.torque);
            out.scalar("propulsion.rotor.tip_mach", &rotor.tip_mach);
        }
        if let Some(motor) = &prop.motor {
            out.scalar("propulsion.motor.voltage", &motor.voltage);
            out.scalar("propulsion.motor.current", &motor.current);
            out.scalar("propulsion.motor.torque", &motor.torque);
            out.scalar("propulsion.motor.omega", &motor.omega);
        }

        out.scalar("energy.power_draw", &self.energy.power_draw);
        if let Some(battery) = &self.energy.battery {
            out.scalar("energy.battery.energy", &battery.energy);
            out.scalar("energy.battery.state_of_charge", &battery.state_of_charge);
            out.scalar("energy.battery.current", &battery.current);
            out.scalar(
                "energy.battery.voltage_open_circuit",
                &battery.voltage_open_circuit,
            );
            out.scalar(
                "energy.battery.voltage_under_load",
                &battery.voltage_under_load,
            );
            out.scalar("energy.battery.resistive_losses", &battery.resistive_losses);
            out.scalar(
                "energy.battery.charge_throughput",
                &battery.charge_throughput,
            );
        }
        if let Some(fuel) = &self.energy.fuel {
            out.scalar("energy.fuel.fuel_flow_rate", &fuel.fuel_flow_rate);
            out.scalar("energy.fuel.fuel_burned", &fuel.fuel_burned);
            if let Some(extra) = &fuel.vehicle_additional_fuel_rate {
                out.scalar("energy.fuel.vehicle_additional_fuel_rate", extra);
            }
        }

        out.scalar("weights.total_mass", &self.weights.total_mass);
        out.scalar("weights.mass_rate", &self.weights.mass_rate);

        if let Some(noise) = &self.noise {
            out.scalar("noise.sound_pressure_level", &noise.sound_pressure_level);
            out.scalar("noise.observer_distance", &noise.observer_distance);
        }
        if let Some(em) = &self.emissions {
            out.scalar("emissions.co2_rate", &em.co2_rate);
            out.scalar("emissions.h2o_rate", &em.h2o_rate);
            out.scalar("emissions.nox_rate", &em.nox_rate);
            out.scalar("emissions.total_co2", &em.total_co2);
            out.scalar("emissions.total_h2o", &em.total_h2o);
            out.scalar("emissions.total_nox", &em.total_nox);
        }
        out.0
    }

    /// Look up one scalar condition path, e.g. `freestream.altitude` or
    /// `frames.inertial.velocity_vector_x`.
    pub fn column(&self, path: &str) -> Option<Vec<f64>> {
        self.scalar_columns()
            .into_iter()
            .find(|(name, _)| name == path)
            .map(|(_, values)| values)
    }

    /// Verify every array has exactly [`Conditions::points`] entries.
    pub fn check_shape(&self) -> Result<(), StateError> {
        let expected = self.points();
        for (path, values) in self.scalar_columns() {
            if values.len() != expected {
                return Err(StateError::ShapeMismatch {
                    path,
                    expected,
                    found: values.len(),
                });
            }
        }
        Ok(())
    }

    /// Write solver values for `kind` into the fields that carry it.
    pub fn write_unknown(&mut self, kind: UnknownKind, values: &[f64]) -> Result<(), StateError> {
        let expected = self.points();
        if values.len() != expected {
            return Err(StateError::ShapeMismatch {
                path: kind.as_str().to_string(),
                expected,
                found: values.len(),
            });
        }
        match kind {
            UnknownKind::BodyAngle => self
                .frames
                .body
                .inclination_angle
                .copy_from_slice(values),
            UnknownKind::Throttle => self.propulsion.throttle.copy_from_slice(values),
            UnknownKind::ThrustTilt => self.propulsion.thrust_tilt_angle.copy_from_slice(values),
            UnknownKind::Acceleration => {
                for (accel, value) in self
                    .frames
                    .inertial
                    .acceleration_vector
                    .iter_mut()
                    .zip(values)
                {
                    accel[0] = *value;
                }
            }
            UnknownKind::RotorPowerCoefficient => self
                .propulsion
                .rotor
                .as_mut()
                .ok_or(StateError::MissingRecord("propulsion.rotor"))?
                .power_coefficient
                .copy_from_slice(values),
        }
        Ok(())
    }

    /// Current values of an unknown as stored in the container.
    pub fn read_unknown(&self, kind: UnknownKind) -> Option<Vec<f64>> {
        match kind {
            UnknownKind::BodyAngle => Some(self.frames.body.inclination_angle.clone()),
            UnknownKind::Throttle => Some(self.propulsion.throttle.clone()),
            UnknownKind::ThrustTilt => Some(self.propulsion.thrust_tilt_angle.clone()),
            UnknownKind::Acceleration => Some(
                self.frames
                    .inertial
                    .acceleration_vector
                    .iter()
                    .map(|a| a[0])
                    .collect(),
            ),
            UnknownKind::RotorPowerCoefficient => self
                .propulsion
                .rotor
                .as_ref()
                .map(|rotor| rotor.power_coefficient.clone()),
        }
    }

    /// Evaluate a residual from the current container contents.
    pub fn residual(&self, kind: ResidualKind) -> Result<Vec<f64>, StateError> {
        let inertial = &self.frames.inertial;
        let mass = &self.weights.total_mass;
        match kind {
            ResidualKind::ForceX | ResidualKind::ForceZ => {
                let axis = if kind == ResidualKind::ForceX { 0 } else { 2 };
                Ok(inertial
                    .total_force_vector
                    .iter()
                    .zip(&inertial.acceleration_vector)
                    .zip(mass)
                    .map(|((force, accel), m)| (force[axis] - m * accel[axis]) / (m * G0))
                    .collect())
            }
            ResidualKind::MotorTorque => {
                let rotor = self
                    .propulsion
                    .rotor
                    .as_ref()
                    .ok_or(StateError::MissingRecord("propulsion.rotor"))?;
                let motor = self
                    .propulsion
                    .motor
                    .as_ref()
                    .ok_or(StateError::MissingRecord("propulsion.motor"))?;
                Ok(motor
                    .torque
                    .iter()
                    .zip(&rotor.torque)
                    .map(|(q_motor, q_rotor)| (q_motor - q_rotor) / rotor.torque_scale)
                    .collect())
            }
        }
    }

    /// State at the last control point, if the container has any points.
    pub fn final_state(&self) -> Option<FinalState> {
        let last = self.points().checked_sub(1)?;
        let inertial = &self.frames.inertial;
        Some(FinalState {
            time: inertial.time[last],
            position: inertial.position_vector[last],
            velocity: inertial.velocity_vector[last],
            altitude: self.freestream.altitude[last],
            mass: self.weights.total_mass[last],
            body_angle: self.frames.body.inclination_angle[last],
            throttle: self.propulsion.throttle[last],
            battery_energy: self.energy.battery.as_ref().map(|b| b.energy[last]),
            fuel_burned: self.energy.fuel.as_ref().map(|f| f.fuel_burned[last]),
        })
    }
}

#[derive(Default)]
struct Columns(Vec<(String, Vec<f64>)>);

impl Columns {
    fn scalar(&mut self, path: &str, values: &[f64]) {
        self.0.push((path.to_string(), values.to_vec()));
    }

    fn vector(&mut self, path: &str, values: &[Vector3]) {
        for (axis, suffix) in ["x", "y", "z"].iter().enumerate() {
            self.0.push((
                format!("{path}_{suffix}"),
                values.iter().map(|v| v[axis]).collect(),
            ));
        }
    }
}
