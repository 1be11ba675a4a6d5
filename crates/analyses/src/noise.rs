//! Ground-observer noise estimate scaled from shaft power with spherical spreading.

use flight_state::{Conditions, StateError};

use crate::NoiseModel;

/// Empirical source level referenced to 1 m and a reference shaft power.
///
/// `SPL = L_ref + 10·log10(P / P_ref) − 20·log10(r)` with `r` the height above
/// the observer, floored at `minimum_distance_m`.
#[derive(Debug, Clone, PartialEq)]
pub struct EmpiricalNoise {
    pub reference_level_db: f64,
    pub reference_power_w: f64,
    pub observer_altitude_m: f64,
    pub minimum_distance_m: f64,
}

impl NoiseModel for EmpiricalNoise {
    fn evaluate(&self, conditions: &mut Conditions) -> Result<(), StateError> {
        let Conditions {
            freestream,
            propulsion,
            noise,
            ..
        } = conditions;
        let noise = noise.as_mut().ok_or(StateError::MissingRecord("noise"))?;
        let floor = self.minimum_distance_m.max(1.0);
        for i in 0..freestream.altitude.len() {
            let distance = (freestream.altitude[i] - self.observer_altitude_m).max(floor);
            let power_ratio = propulsion.shaft_power[i].max(1.0) / self.reference_power_w;
            noise.observer_distance[i] = distance;
            noise.sound_pressure_level[i] =
                self.reference_level_db + 10.0 * power_ratio.log10() - 20.0 * distance.log10();
        }
        Ok(())
    }
}
