use flight_core::constants::SEA_LEVEL_DENSITY;
use flight_core::units::{coulomb_to_ah, rad_s_to_rpm};
use flight_core::vector::{self, pitched_axis};
use flight_propulsion::{Battery, ElectricalConfiguration, Esc, Motor, PropulsionError, Rotor};
use flight_state::{BatteryAge, Conditions, Coupling, ResidualKind, StateError, UnknownKind};

use crate::degenerate;
use crate::{EnergyNetwork, NetworkLayout, ThrottleGuess};

/// Battery feeding identical motor-driven rotors through one speed controller.
///
/// The throttle scales the controller output against the pack's open-circuit
/// voltage at the start of the segment. Rotor speed follows from a guessed
/// power coefficient; the solver closes the loop by balancing motor shaft
/// torque against the rotor's aerodynamic torque.
#[derive(Debug, Clone, PartialEq)]
pub struct BatteryPropeller {
    pub configuration: ElectricalConfiguration,
    pub propulsor_count: usize,
    /// Thrust axis tilt above the body x-axis (rad).
    pub thrust_angle: f64,
    pub rotor: Rotor,
    pub motor: Motor,
    pub esc: Esc,
    pub battery: Battery,
    /// Constant electrical load outside the propulsion chain (W).
    pub avionics_power_w: f64,
}

impl BatteryPropeller {
    pub fn validate(&self) -> Result<(), PropulsionError> {
        if self.propulsor_count == 0 {
            return Err(PropulsionError::NonPositive {
                component: "network",
                parameter: "propulsor_count",
                value: 0.0,
            });
        }
        self.rotor.validate()?;
        self.motor.validate()?;
        self.esc.validate()?;
        self.battery.validate()
    }

    fn count(&self) -> f64 {
        self.propulsor_count as f64
    }

    /// Torque used to normalize the motor/rotor balance: static rotor torque at
    /// half the no-load speed reachable from a full pack.
    fn torque_scale(&self) -> f64 {
        let motor_voltage = self
            .configuration
            .motor_voltage(self.battery.voltage_max_v, self.propulsor_count);
        let speed = 0.5 * self.motor.speed_constant * motor_voltage / self.motor.gear_ratio;
        let scale = self
            .rotor
            .torque(self.rotor.power_coefficients[0], SEA_LEVEL_DENSITY, speed);
        if scale > 0.0 { scale } else { 1.0 }
    }

    fn initial_voltage(&self, conditions: &Conditions) -> Result<f64, StateError> {
        let battery = conditions
            .energy
            .battery
            .as_ref()
            .ok_or(StateError::MissingRecord("energy.battery"))?;
        let soc = if battery.capacity > 0.0 {
            battery.initial_energy / battery.capacity
        } else {
            0.0
        };
        Ok(self.battery.open_circuit_voltage(soc))
    }
}

impl EnergyNetwork for BatteryPropeller {
    fn layout(&self) -> NetworkLayout {
        NetworkLayout {
            rotor: true,
            battery: true,
            fuel: false,
            additional_fuel: false,
        }
    }

    fn couplings(&self) -> Vec<Coupling> {
        vec![Coupling::new(
            UnknownKind::RotorPowerCoefficient,
            ResidualKind::MotorTorque,
        )]
    }

    fn default_thrust_angle(&self) -> f64 {
        self.thrust_angle
    }

    fn initialize(
        &self,
        conditions: &mut Conditions,
        previous_energy: Option<f64>,
        age: BatteryAge,
    ) -> Result<(), StateError> {
        let scale = self.torque_scale();
        conditions
            .propulsion
            .rotor
            .as_mut()
            .ok_or(StateError::MissingRecord("propulsion.rotor"))?
            .torque_scale = scale;

        let battery = conditions
            .energy
            .battery
            .as_mut()
            .ok_or(StateError::MissingRecord("energy.battery"))?;
        let capacity = self.battery.max_energy_j * age.capacity_fade;
        let initial = previous_energy.unwrap_or(capacity).min(capacity);
        battery.capacity = capacity;
        battery.initial_energy = initial;
        battery.age = age;
        battery.energy.iter_mut().for_each(|e| *e = initial);
        Ok(())
    }

    fn evaluate(&self, conditions: &mut Conditions) -> Result<(), StateError> {
        let v_oc0 = self.initial_voltage(conditions)?;
        let count = self.count();
        let Conditions {
            frames,
            freestream,
            propulsion,
            energy,
            weights,
            diagnostics,
            numerics,
            ..
        } = conditions;
        let rotor_state = propulsion
            .rotor
            .as_mut()
            .ok_or(StateError::MissingRecord("propulsion.rotor"))?;
        let motor_state = propulsion
            .motor
            .as_mut()
            .ok_or(StateError::MissingRecord("propulsion.motor"))?;
        let battery = energy
            .battery
            .as_mut()
            .ok_or(StateError::MissingRecord("energy.battery"))?;
        let resistance = self.battery.internal_resistance_ohm * battery.age.resistance_growth;

        for i in 0..freestream.density.len() {
            let axis = pitched_axis(frames.body.inclination_angle[i] + propulsion.thrust_tilt_angle[i]);
            let axial_velocity = vector::dot(&frames.inertial.velocity_vector[i], &axis);
            let density = freestream.density[i];

            let bus_voltage = propulsion.throttle[i] * v_oc0;
            let motor_voltage = self.configuration.motor_voltage(bus_voltage, self.propulsor_count);
            let raw_speed = self.motor.rotor_speed(
                motor_voltage,
                rotor_state.power_coefficient[i],
                density,
                self.rotor.radius_m,
            );
            let speed = degenerate::zero_nan(raw_speed, "rotor_speed", i, diagnostics).max(0.0);
            let performance = self
                .rotor
                .performance(density, speed, axial_velocity, freestream.speed_of_sound[i]);

            let raw_current = self.motor.current(motor_voltage, speed);
            let shaft_torque = self.motor.shaft_torque(raw_current);
            let current = degenerate::clamp_current(raw_current, i, diagnostics);

            let thrust = count * performance.thrust_n;
            let electrical = count * motor_voltage * current / self.esc.efficiency + self.avionics_power_w;
            let battery_current = electrical / v_oc0;
            let losses = battery_current * battery_current * resistance;

            rotor_state.thrust_coefficient[i] = performance.thrust_coefficient;
            rotor_state.advance_ratio[i] = performance.advance_ratio;
            rotor_state.rpm[i] = rad_s_to_rpm(speed);
            rotor_state.torque[i] = performance.torque_nm;
            rotor_state.tip_mach[i] = performance.tip_mach;
            motor_state.voltage[i] = motor_voltage;
            motor_state.current[i] = current;
            motor_state.torque[i] = shaft_torque;
            motor_state.omega[i] = speed * self.motor.gear_ratio;

            propulsion.thrust[i] = thrust;
            propulsion.shaft_power[i] = count * performance.power_w;
            frames.inertial.thrust_force_vector[i] = vector::scale(&axis, thrust);
            energy.power_draw[i] = electrical + losses;
            battery.current[i] = battery_current;
            battery.resistive_losses[i] = losses;
            weights.mass_rate[i] = 0.0;
        }

        let consumed = numerics.integrate(&energy.power_draw);
        let charge = numerics.integrate(&battery.current);
        for i in 0..consumed.len() {
            let stored = battery.initial_energy - consumed[i];
            let soc = if battery.capacity > 0.0 {
                stored / battery.capacity
            } else {
                0.0
            };
            let v_oc = self.battery.open_circuit_voltage(soc);
            battery.energy[i] = stored;
            battery.state_of_charge[i] = soc;
            battery.voltage_open_circuit[i] = v_oc;
            battery.voltage_under_load[i] = v_oc - battery.current[i] * resistance;
            battery.charge_throughput[i] = coulomb_to_ah(charge[i]);
        }
        Ok(())
    }

    fn initial_guess(&self, conditions: &Conditions, index: usize, required_thrust: f64) -> ThrottleGuess {
        let density = conditions.freestream.density[index];
        let axis = pitched_axis(
            conditions.frames.body.inclination_angle[index]
                + conditions.propulsion.thrust_tilt_angle[index],
        );
        let axial_velocity = vector::dot(&conditions.frames.inertial.velocity_vector[index], &axis);

        let speed = self
            .rotor
            .speed_for_thrust(required_thrust / self.count(), density, axial_velocity);
        let advance_ratio = self.rotor.advance_ratio(axial_velocity, speed);
        let (_, cp) = self.rotor.coefficients(advance_ratio);
        let torque = self.rotor.torque(cp, density, speed);
        let motor_voltage = self.motor.voltage_for(speed, torque);
        let bus_voltage = self
            .configuration
            .bus_voltage(motor_voltage, self.propulsor_count);
        let v_oc0 = self
            .initial_voltage(conditions)
            .unwrap_or(self.battery.voltage_max_v);

        ThrottleGuess {
            throttle: (bus_voltage / v_oc0).max(0.0),
            power_coefficient: Some(cp.max(1.0e-3)),
        }
    }

    fn advance_storage_age(&self, conditions: &Conditions) -> Option<BatteryAge> {
        let model = self.battery.aging.as_ref()?;
        let battery = conditions.energy.battery.as_ref()?;
        let segment_throughput = battery.charge_throughput.last().copied().unwrap_or(0.0);
        let cycle_day = battery.age.cycle_day + 1;
        let charge_throughput_ah = battery.age.charge_throughput_ah + segment_throughput;
        let (capacity_fade, resistance_growth) =
            model.degradation(f64::from(cycle_day), charge_throughput_ah);
        Some(BatteryAge {
            cycle_day,
            charge_throughput_ah,
            capacity_fade,
            resistance_growth,
        })
    }
}
