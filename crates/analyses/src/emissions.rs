//! Emission-index inventory for fuel burn and grid-charged electricity.

use flight_state::{Conditions, StateError};

use crate::EmissionsModel;

/// Mass of each species emitted per kilogram of fuel, plus a grid carbon intensity.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionIndices {
    pub co2: f64,
    pub h2o: f64,
    pub nox: f64,
    /// CO2 attributed to electrical energy drawn from a battery (kg/J).
    pub grid_co2_per_joule: f64,
}

impl Default for EmissionIndices {
    fn default() -> Self {
        Self {
            co2: 3.16,
            h2o: 1.23,
            nox: 0.014,
            grid_co2_per_joule: 0.0,
        }
    }
}

impl EmissionsModel for EmissionIndices {
    fn evaluate(&self, conditions: &mut Conditions) -> Result<(), StateError> {
        let Conditions {
            energy,
            emissions,
            numerics,
            ..
        } = conditions;
        let emissions = emissions
            .as_mut()
            .ok_or(StateError::MissingRecord("emissions"))?;
        for i in 0..energy.power_draw.len() {
            let fuel_flow = energy.fuel.as_ref().map_or(0.0, |f| f.fuel_flow_rate[i]);
            let electric = if energy.battery.is_some() {
                energy.power_draw[i]
            } else {
                0.0
            };
            emissions.co2_rate[i] = fuel_flow * self.co2 + electric * self.grid_co2_per_joule;
            emissions.h2o_rate[i] = fuel_flow * self.h2o;
            emissions.nox_rate[i] = fuel_flow * self.nox;
        }
        emissions.total_co2 = numerics.integrate(&emissions.co2_rate);
        emissions.total_h2o = numerics.integrate(&emissions.h2o_rate);
        emissions.total_nox = numerics.integrate(&emissions.nox_rate);
        Ok(())
    }
}
