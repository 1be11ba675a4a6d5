//! US Standard Atmosphere 1976 up to the mesopause, with an optional ISA temperature offset.

use flight_core::constants::{
    EARTH_RADIUS_M, G0, GAMMA_AIR, GAS_CONSTANT_AIR, SEA_LEVEL_PRESSURE, SEA_LEVEL_TEMPERATURE,
};
use thiserror::Error;

/// Effective Earth radius for the geometric to geopotential altitude conversion (m).
const GEOPOTENTIAL_RADIUS_M: f64 = 6_356_766.0;
const MIN_ALTITUDE_M: f64 = -5_000.0;

/// Layer base geopotential altitudes (m) and lapse rates (K/m).
const LAYERS: [(f64, f64); 7] = [
    (0.0, -0.0065),
    (11_000.0, 0.0),
    (20_000.0, 0.001),
    (32_000.0, 0.0028),
    (47_000.0, 0.0),
    (51_000.0, -0.0028),
    (71_000.0, -0.002),
];
const TOP_GEOPOTENTIAL_M: f64 = 84_852.0;

/// Air properties at one altitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtmosphereState {
    pub temperature_k: f64,
    pub pressure_pa: f64,
    pub density_kg_m3: f64,
    pub speed_of_sound_m_s: f64,
    pub dynamic_viscosity_pa_s: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum AtmosphereError {
    #[error("altitude {altitude_m:.1} m lies outside the tabulated atmosphere")]
    OutOfRange { altitude_m: f64 },
    #[error("temperature offset {0:.1} K drives the temperature below absolute zero")]
    InvalidTemperatureOffset(f64),
}

/// Standard atmosphere, optionally shifted by a uniform temperature deviation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StandardAtmosphere {
    pub temperature_deviation_k: f64,
}

impl StandardAtmosphere {
    pub fn new(temperature_deviation_k: f64) -> Self {
        Self {
            temperature_deviation_k,
        }
    }

    /// Evaluate the atmosphere at a geometric altitude (m).
    ///
    /// Pressure follows the standard layers; the temperature deviation only
    /// shifts temperature, so density is recomputed from the ideal-gas law.
    pub fn compute(&self, altitude_m: f64) -> Result<AtmosphereState, AtmosphereError> {
        if !altitude_m.is_finite() || altitude_m < MIN_ALTITUDE_M {
            return Err(AtmosphereError::OutOfRange { altitude_m });
        }
        let geopotential = GEOPOTENTIAL_RADIUS_M * altitude_m / (GEOPOTENTIAL_RADIUS_M + altitude_m);
        if geopotential > TOP_GEOPOTENTIAL_M {
            return Err(AtmosphereError::OutOfRange { altitude_m });
        }

        let mut base_temperature = SEA_LEVEL_TEMPERATURE;
        let mut base_pressure = SEA_LEVEL_PRESSURE;
        let mut layer = 0;
        while layer + 1 < LAYERS.len() && geopotential >= LAYERS[layer + 1].0 {
            let (base, lapse) = LAYERS[layer];
            let top = LAYERS[layer + 1].0;
            base_pressure = layer_pressure(base_pressure, base_temperature, lapse, top - base);
            base_temperature += lapse * (top - base);
            layer += 1;
        }

        let (base, lapse) = LAYERS[layer];
        let dh = geopotential - base;
        let standard_temperature = base_temperature + lapse * dh;
        let pressure = layer_pressure(base_pressure, base_temperature, lapse, dh);

        let temperature = standard_temperature + self.temperature_deviation_k;
        if temperature <= 0.0 {
            return Err(AtmosphereError::InvalidTemperatureOffset(
                self.temperature_deviation_k,
            ));
        }
        let density = pressure / (GAS_CONSTANT_AIR * temperature);
        Ok(AtmosphereState {
            temperature_k: temperature,
            pressure_pa: pressure,
            density_kg_m3: density,
            speed_of_sound_m_s: (GAMMA_AIR * GAS_CONSTANT_AIR * temperature).sqrt(),
            dynamic_viscosity_pa_s: sutherland_viscosity(temperature),
        })
    }
}

/// Local gravitational acceleration with the inverse-square altitude correction (m/s²).
pub fn gravity(altitude_m: f64) -> f64 {
    let ratio = EARTH_RADIUS_M / (EARTH_RADIUS_M + altitude_m);
    G0 * ratio * ratio
}

fn layer_pressure(base_pressure: f64, base_temperature: f64, lapse: f64, dh: f64) -> f64 {
    if lapse == 0.0 {
        base_pressure * (-G0 * dh / (GAS_CONSTANT_AIR * base_temperature)).exp()
    } else {
        let temperature = base_temperature + lapse * dh;
        base_pressure * (temperature / base_temperature).powf(-G0 / (GAS_CONSTANT_AIR * lapse))
    }
}

fn sutherland_viscosity(temperature: f64) -> f64 {
    1.458e-6 * temperature.powf(1.5) / (temperature + 110.4)
}
