//! Propulsion component models: energy storage, motors, rotors, and turbofan engines.
//!
//! Each component is a plain parameter record with closed-form evaluation
//! methods. Degenerate inputs are not corrected here; callers decide how to
//! normalize a NaN or a negative current.

use std::f64::consts::{PI, TAU};

use thiserror::Error;

/// Errors raised when component parameters are physically meaningless.
#[derive(Debug, Error, PartialEq)]
pub enum PropulsionError {
    #[error("{component}: parameter '{parameter}' must be positive (got {value})")]
    NonPositive {
        component: &'static str,
        parameter: &'static str,
        value: f64,
    },
    #[error("{component}: parameter '{parameter}' must lie in (0, 1] (got {value})")]
    NotAFraction {
        component: &'static str,
        parameter: &'static str,
        value: f64,
    },
    #[error("battery maximum voltage {max} V must exceed minimum voltage {min} V")]
    VoltageWindow { max: f64, min: f64 },
}

fn positive(component: &'static str, parameter: &'static str, value: f64) -> Result<(), PropulsionError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(PropulsionError::NonPositive {
            component,
            parameter,
            value,
        })
    }
}

fn fraction(component: &'static str, parameter: &'static str, value: f64) -> Result<(), PropulsionError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(PropulsionError::NotAFraction {
            component,
            parameter,
            value,
        })
    }
}

/// How identical motors share the battery bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElectricalConfiguration {
    /// Motors strung in series; each sees an equal share of the bus voltage.
    Series,
    /// Motors wired in parallel; each sees the full bus voltage.
    Parallel,
}

impl ElectricalConfiguration {
    /// Terminal voltage of one motor for a given regulated bus voltage.
    pub fn motor_voltage(&self, bus_voltage: f64, motor_count: usize) -> f64 {
        match self {
            ElectricalConfiguration::Series => bus_voltage / motor_count.max(1) as f64,
            ElectricalConfiguration::Parallel => bus_voltage,
        }
    }

    /// Regulated bus voltage needed to present `motor_voltage` at every motor.
    pub fn bus_voltage(&self, motor_voltage: f64, motor_count: usize) -> f64 {
        match self {
            ElectricalConfiguration::Series => motor_voltage * motor_count.max(1) as f64,
            ElectricalConfiguration::Parallel => motor_voltage,
        }
    }
}

/// Rechargeable pack with a linear open-circuit voltage curve.
#[derive(Debug, Clone, PartialEq)]
pub struct Battery {
    pub max_energy_j: f64,
    pub voltage_max_v: f64,
    pub voltage_min_v: f64,
    pub internal_resistance_ohm: f64,
    pub aging: Option<AgingModel>,
}

impl Battery {
    pub fn validate(&self) -> Result<(), PropulsionError> {
        positive("battery", "max_energy", self.max_energy_j)?;
        positive("battery", "voltage_min", self.voltage_min_v)?;
        if self.voltage_max_v <= self.voltage_min_v {
            return Err(PropulsionError::VoltageWindow {
                max: self.voltage_max_v,
                min: self.voltage_min_v,
            });
        }
        if self.internal_resistance_ohm < 0.0 {
            return Err(PropulsionError::NonPositive {
                component: "battery",
                parameter: "internal_resistance",
                value: self.internal_resistance_ohm,
            });
        }
        Ok(())
    }

    /// Open-circuit voltage at a state of charge (clamped to [0, 1]).
    pub fn open_circuit_voltage(&self, state_of_charge: f64) -> f64 {
        let soc = state_of_charge.clamp(0.0, 1.0);
        self.voltage_min_v + (self.voltage_max_v - self.voltage_min_v) * soc
    }
}

/// Calendar and throughput degradation of a lithium-ion pack.
///
/// Capacity fades as `1 - a·t^0.75 - b·sqrt(Q)` and resistance grows as
/// `1 + c·t^0.75 + d·Q`, with `t` in days and `Q` the cumulative charge
/// throughput in ampere-hours.
#[derive(Debug, Clone, PartialEq)]
pub struct AgingModel {
    pub capacity_fade_per_day: f64,
    pub capacity_fade_per_sqrt_ah: f64,
    pub resistance_growth_per_day: f64,
    pub resistance_growth_per_ah: f64,
}

impl AgingModel {
    /// Remaining capacity fraction and resistance multiplier after `days` and `throughput_ah`.
    pub fn degradation(&self, days: f64, throughput_ah: f64) -> (f64, f64) {
        let t = days.max(0.0).powf(0.75);
        let q = throughput_ah.max(0.0);
        let capacity = 1.0 - self.capacity_fade_per_day * t - self.capacity_fade_per_sqrt_ah * q.sqrt();
        let resistance = 1.0 + self.resistance_growth_per_day * t + self.resistance_growth_per_ah * q;
        (capacity.clamp(0.0, 1.0), resistance.max(1.0))
    }
}

/// Brushless DC motor with a first-order equivalent circuit and a reduction gearbox.
#[derive(Debug, Clone, PartialEq)]
pub struct Motor {
    /// Speed constant (rad/s per volt).
    pub speed_constant: f64,
    pub resistance_ohm: f64,
    pub no_load_current_a: f64,
    /// Motor speed over rotor speed.
    pub gear_ratio: f64,
    pub gearbox_efficiency: f64,
}

impl Motor {
    pub fn validate(&self) -> Result<(), PropulsionError> {
        positive("motor", "speed_constant", self.speed_constant)?;
        positive("motor", "resistance", self.resistance_ohm)?;
        positive("motor", "gear_ratio", self.gear_ratio)?;
        fraction("motor", "gearbox_efficiency", self.gearbox_efficiency)
    }

    /// Rotor speed at which the motor torque balances a rotor of the given power coefficient.
    ///
    /// Solves `G·η·((v − G·ω/Kv)/R − i0)/Kv = 4·Cp·ρ·r⁵·ω²/π³` for ω. The result
    /// is NaN when no real root exists (e.g. a strongly negative coefficient).
    pub fn rotor_speed(&self, voltage: f64, power_coefficient: f64, density: f64, rotor_radius: f64) -> f64 {
        let kv = self.speed_constant;
        let g = self.gear_ratio;
        let eta = self.gearbox_efficiency;
        let a = 4.0 * power_coefficient * density * rotor_radius.powi(5) / PI.powi(3);
        let b = g * g * eta / (kv * kv * self.resistance_ohm);
        let c = g * eta * (voltage / self.resistance_ohm - self.no_load_current_a) / kv;
        2.0 * c / (b + (b * b + 4.0 * a * c).sqrt())
    }

    /// Armature current at a terminal voltage and rotor speed (may be negative).
    pub fn current(&self, voltage: f64, rotor_speed: f64) -> f64 {
        (voltage - self.gear_ratio * rotor_speed / self.speed_constant) / self.resistance_ohm
    }

    /// Torque delivered to the rotor shaft for an armature current.
    pub fn shaft_torque(&self, current: f64) -> f64 {
        self.gear_ratio * self.gearbox_efficiency * (current - self.no_load_current_a) / self.speed_constant
    }

    /// Terminal voltage needed to hold a rotor speed against a shaft torque.
    pub fn voltage_for(&self, rotor_speed: f64, shaft_torque: f64) -> f64 {
        let current = shaft_torque * self.speed_constant / (self.gear_ratio * self.gearbox_efficiency)
            + self.no_load_current_a;
        self.gear_ratio * rotor_speed / self.speed_constant + current * self.resistance_ohm
    }
}

/// Speed controller between the bus and the motors.
#[derive(Debug, Clone, PartialEq)]
pub struct Esc {
    pub efficiency: f64,
}

impl Esc {
    pub fn validate(&self) -> Result<(), PropulsionError> {
        fraction("esc", "efficiency", self.efficiency)
    }
}

/// Fixed-pitch rotor with quadratic thrust and power coefficient curves in advance ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct Rotor {
    pub radius_m: f64,
    /// `Ct(J) = c0 + c1·J + c2·J²`
    pub thrust_coefficients: [f64; 3],
    /// `Cp(J) = c0 + c1·J + c2·J²`
    pub power_coefficients: [f64; 3],
}

/// Rotor operating point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotorPerformance {
    pub thrust_n: f64,
    pub torque_nm: f64,
    pub power_w: f64,
    pub thrust_coefficient: f64,
    pub power_coefficient: f64,
    pub advance_ratio: f64,
    pub tip_mach: f64,
}

impl Rotor {
    pub fn validate(&self) -> Result<(), PropulsionError> {
        positive("rotor", "radius", self.radius_m)?;
        positive("rotor", "static_thrust_coefficient", self.thrust_coefficients[0])?;
        positive("rotor", "static_power_coefficient", self.power_coefficients[0])
    }

    pub fn diameter(&self) -> f64 {
        2.0 * self.radius_m
    }

    /// Advance ratio `V / (n·D)`; zero for a stopped rotor.
    pub fn advance_ratio(&self, axial_velocity: f64, rotor_speed: f64) -> f64 {
        if rotor_speed <= 0.0 {
            return 0.0;
        }
        let n = rotor_speed / TAU;
        axial_velocity.max(0.0) / (n * self.diameter())
    }

    /// Thrust and power coefficients at an advance ratio, floored at zero.
    pub fn coefficients(&self, advance_ratio: f64) -> (f64, f64) {
        let poly = |c: &[f64; 3]| c[0] + c[1] * advance_ratio + c[2] * advance_ratio * advance_ratio;
        (
            poly(&self.thrust_coefficients).max(0.0),
            poly(&self.power_coefficients).max(0.0),
        )
    }

    /// Aerodynamic torque for a power coefficient at a rotor speed.
    pub fn torque(&self, power_coefficient: f64, density: f64, rotor_speed: f64) -> f64 {
        let n = rotor_speed / TAU;
        power_coefficient * density * n * n * self.diameter().powi(5) / TAU
    }

    pub fn performance(
        &self,
        density: f64,
        rotor_speed: f64,
        axial_velocity: f64,
        speed_of_sound: f64,
    ) -> RotorPerformance {
        let omega = rotor_speed.max(0.0);
        let j = self.advance_ratio(axial_velocity, omega);
        let (ct, cp) = self.coefficients(j);
        let n = omega / TAU;
        let d = self.diameter();
        let thrust = ct * density * n * n * d.powi(4);
        let power = cp * density * n * n * n * d.powi(5);
        let torque = self.torque(cp, density, omega);
        let tip_mach = if speed_of_sound > 0.0 {
            omega * self.radius_m / speed_of_sound
        } else {
            0.0
        };
        RotorPerformance {
            thrust_n: thrust,
            torque_nm: torque,
            power_w: power,
            thrust_coefficient: ct,
            power_coefficient: cp,
            advance_ratio: j,
            tip_mach,
        }
    }

    /// Rotor speed producing `thrust` at an axial inflow, by fixed-point iteration on the advance ratio.
    pub fn speed_for_thrust(&self, thrust: f64, density: f64, axial_velocity: f64) -> f64 {
        if thrust <= 0.0 || density <= 0.0 {
            return 0.0;
        }
        let d4 = self.diameter().powi(4);
        let mut n = (thrust / (self.thrust_coefficients[0] * density * d4)).sqrt();
        for _ in 0..12 {
            let j = axial_velocity.max(0.0) / (n * self.diameter());
            let (ct, _) = self.coefficients(j);
            if ct <= 1.0e-6 {
                n *= 1.2;
                continue;
            }
            n = 0.5 * (n + (thrust / (ct * density * d4)).sqrt());
        }
        n * TAU
    }
}

/// Throttleable turbofan with a density-ratio thrust lapse.
#[derive(Debug, Clone, PartialEq)]
pub struct Turbofan {
    pub sea_level_thrust_n: f64,
    /// Thrust-specific fuel consumption (kg/(N·s)).
    pub thrust_specific_fuel_consumption: f64,
    pub lapse_exponent: f64,
}

impl Turbofan {
    pub fn validate(&self) -> Result<(), PropulsionError> {
        positive("turbofan", "sea_level_thrust", self.sea_level_thrust_n)?;
        positive(
            "turbofan",
            "thrust_specific_fuel_consumption",
            self.thrust_specific_fuel_consumption,
        )
    }

    /// Available thrust at full throttle for a density ratio `ρ/ρ0`.
    pub fn available_thrust(&self, density_ratio: f64) -> f64 {
        self.sea_level_thrust_n * density_ratio.max(0.0).powf(self.lapse_exponent)
    }

    pub fn thrust(&self, throttle: f64, density_ratio: f64) -> f64 {
        throttle * self.available_thrust(density_ratio)
    }

    pub fn fuel_flow(&self, thrust: f64) -> f64 {
        self.thrust_specific_fuel_consumption * thrust.max(0.0)
    }
}
