use flight_core::constants::{JET_FUEL_LHV, SEA_LEVEL_DENSITY};
use flight_core::vector::{self, pitched_axis};
use flight_propulsion::{PropulsionError, Turbofan};
use flight_state::{BatteryAge, Conditions, StateError};

use crate::{EnergyNetwork, NetworkLayout, ThrottleGuess};

/// Identical turbofans burning from a single fuel system.
#[derive(Debug, Clone, PartialEq)]
pub struct TurbofanNetwork {
    pub engine: Turbofan,
    pub engine_count: usize,
    /// Thrust axis tilt above the body x-axis (rad).
    pub thrust_angle: f64,
    /// Fuel drawn outside the engines, e.g. by an auxiliary power unit (kg/s).
    pub additional_fuel_rate: Option<f64>,
}

impl TurbofanNetwork {
    pub fn validate(&self) -> Result<(), PropulsionError> {
        if self.engine_count == 0 {
            return Err(PropulsionError::NonPositive {
                component: "network",
                parameter: "engine_count",
                value: 0.0,
            });
        }
        self.engine.validate()
    }
}

impl EnergyNetwork for TurbofanNetwork {
    fn layout(&self) -> NetworkLayout {
        NetworkLayout {
            rotor: false,
            battery: false,
            fuel: true,
            additional_fuel: self.additional_fuel_rate.is_some(),
        }
    }

    fn default_thrust_angle(&self) -> f64 {
        self.thrust_angle
    }

    fn initialize(
        &self,
        conditions: &mut Conditions,
        _previous_energy: Option<f64>,
        _age: BatteryAge,
    ) -> Result<(), StateError> {
        let fuel = conditions
            .energy
            .fuel
            .as_mut()
            .ok_or(StateError::MissingRecord("energy.fuel"))?;
        if let (Some(rate), Some(extra)) = (self.additional_fuel_rate, fuel.vehicle_additional_fuel_rate.as_mut()) {
            extra.iter_mut().for_each(|r| *r = rate);
        }
        Ok(())
    }

    fn evaluate(&self, conditions: &mut Conditions) -> Result<(), StateError> {
        let count = self.engine_count as f64;
        let Conditions {
            frames,
            freestream,
            propulsion,
            energy,
            weights,
            numerics,
            ..
        } = conditions;
        let fuel = energy
            .fuel
            .as_mut()
            .ok_or(StateError::MissingRecord("energy.fuel"))?;

        for i in 0..freestream.density.len() {
            let axis = pitched_axis(frames.body.inclination_angle[i] + propulsion.thrust_tilt_angle[i]);
            let density_ratio = freestream.density[i] / SEA_LEVEL_DENSITY;
            let per_engine = self.engine.thrust(propulsion.throttle[i], density_ratio);
            let thrust = count * per_engine;
            let additional = fuel
                .vehicle_additional_fuel_rate
                .as_ref()
                .map_or(0.0, |extra| extra[i]);
            let flow = count * self.engine.fuel_flow(per_engine) + additional;

            propulsion.thrust[i] = thrust;
            propulsion.shaft_power[i] = thrust * freestream.velocity[i];
            frames.inertial.thrust_force_vector[i] = vector::scale(&axis, thrust);
            fuel.fuel_flow_rate[i] = flow;
            energy.power_draw[i] = flow * JET_FUEL_LHV;
            weights.mass_rate[i] = -flow;
        }
        fuel.fuel_burned = numerics.integrate(&fuel.fuel_flow_rate);
        Ok(())
    }

    fn initial_guess(&self, conditions: &Conditions, index: usize, required_thrust: f64) -> ThrottleGuess {
        let density_ratio = conditions.freestream.density[index] / SEA_LEVEL_DENSITY;
        let available = self.engine_count as f64 * self.engine.available_thrust(density_ratio);
        let throttle = if available > 0.0 {
            (required_thrust / available).max(0.0)
        } else {
            0.0
        };
        ThrottleGuess {
            throttle,
            power_coefficient: None,
        }
    }
}
