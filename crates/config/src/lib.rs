//! Configuration models and loaders for vehicle catalogs and mission files.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Vehicle configuration parsed from catalogs.
#[derive(Debug, Deserialize, Clone)]
pub struct VehicleConfig {
    pub name: String,
    pub mass_kg: f64,
    pub aerodynamics: AerodynamicsConfig,
    pub network: NetworkConfig,
}

/// Drag-polar coefficients. Slopes are per radian.
#[derive(Debug, Deserialize, Clone)]
pub struct AerodynamicsConfig {
    pub reference_area_m2: f64,
    #[serde(default = "one")]
    pub mean_chord_m: f64,
    #[serde(default)]
    pub cl0: f64,
    pub cl_alpha_per_rad: f64,
    pub cl_max: f64,
    pub cd0: f64,
    pub induced_drag_factor: f64,
    #[serde(default)]
    pub cm0: f64,
    #[serde(default)]
    pub cm_alpha_per_rad: f64,
    #[serde(default)]
    pub cy_beta_per_rad: f64,
}

/// Energy network configuration in vehicle catalogs.
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type")]
pub enum NetworkConfig {
    #[serde(rename = "battery_propeller")]
    BatteryPropeller {
        electrical_configuration: ElectricalConfigurationConfig,
        propulsor_count: usize,
        #[serde(default)]
        thrust_angle_deg: f64,
        rotor: RotorConfig,
        motor: MotorConfig,
        #[serde(default = "default_esc_efficiency")]
        esc_efficiency: f64,
        battery: BatteryConfig,
        #[serde(default)]
        avionics_power_w: f64,
    },
    #[serde(rename = "turbofan")]
    Turbofan {
        engine_count: usize,
        sea_level_thrust_n: f64,
        tsfc_kg_per_n_s: f64,
        #[serde(default = "one")]
        lapse_exponent: f64,
        #[serde(default)]
        thrust_angle_deg: f64,
        #[serde(default)]
        additional_fuel_rate_kg_s: Option<f64>,
    },
    #[serde(other)]
    Unsupported,
}

/// Motor wiring against the battery bus.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ElectricalConfigurationConfig {
    Series,
    Parallel,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RotorConfig {
    pub radius_m: f64,
    pub thrust_coefficients: [f64; 3],
    pub power_coefficients: [f64; 3],
}

#[derive(Debug, Deserialize, Clone)]
pub struct MotorConfig {
    pub speed_constant_rad_s_per_v: f64,
    pub resistance_ohm: f64,
    #[serde(default)]
    pub no_load_current_a: f64,
    #[serde(default = "one")]
    pub gear_ratio: f64,
    #[serde(default = "one")]
    pub gearbox_efficiency: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BatteryConfig {
    pub max_energy_kwh: f64,
    pub voltage_max_v: f64,
    pub voltage_min_v: f64,
    pub internal_resistance_ohm: f64,
    #[serde(default)]
    pub aging: Option<AgingConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgingConfig {
    #[serde(default)]
    pub capacity_fade_per_day: f64,
    #[serde(default)]
    pub capacity_fade_per_sqrt_ah: f64,
    #[serde(default)]
    pub resistance_growth_per_day: f64,
    #[serde(default)]
    pub resistance_growth_per_ah: f64,
}

/// Mission definition: vehicle reference, shared analyses, solver controls and segments.
#[derive(Debug, Deserialize, Clone)]
pub struct MissionFile {
    pub name: String,
    pub vehicle: String,
    #[serde(default)]
    pub atmosphere: AtmosphereConfig,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub noise: Option<NoiseConfig>,
    #[serde(default)]
    pub emissions: Option<EmissionsConfig>,
    pub segments: Vec<SegmentConfig>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AtmosphereConfig {
    #[serde(default)]
    pub temperature_deviation_k: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SolverConfig {
    pub tolerance: f64,
    pub max_iterations: usize,
    pub control_points: usize,
    pub finite_difference_step: f64,
    pub halt_on_failure: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1.0e-6,
            max_iterations: 50,
            control_points: 16,
            finite_difference_step: 1.0e-7,
            halt_on_failure: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NoiseConfig {
    pub reference_level_db: f64,
    pub reference_power_w: f64,
    #[serde(default)]
    pub observer_altitude_m: f64,
    #[serde(default = "default_minimum_distance")]
    pub minimum_distance_m: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmissionsConfig {
    #[serde(default = "default_co2_index")]
    pub co2_index: f64,
    #[serde(default = "default_h2o_index")]
    pub h2o_index: f64,
    #[serde(default = "default_nox_index")]
    pub nox_index: f64,
    #[serde(default)]
    pub grid_co2_kg_per_kwh: f64,
}

/// Segment kinds accepted in mission files.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SegmentType {
    SinglePoint,
    Climb,
    Descent,
    Cruise,
    Hover,
    Transition,
}

/// Flat segment record. Which fields are required, allowed, or mutually
/// exclusive depends on `type` and is checked when the mission is built.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct SegmentConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SegmentType,
    pub altitude_m: Option<f64>,
    pub altitude_start_m: Option<f64>,
    pub altitude_end_m: Option<f64>,
    pub air_speed_m_s: Option<f64>,
    pub air_speed_start_m_s: Option<f64>,
    pub air_speed_end_m_s: Option<f64>,
    pub sideslip_deg: Option<f64>,
    pub throttle: Option<f64>,
    pub climb_rate_m_s: Option<f64>,
    pub climb_angle_deg: Option<f64>,
    pub descent_rate_m_s: Option<f64>,
    pub descent_angle_deg: Option<f64>,
    pub vertical_acceleration_m_s2: Option<f64>,
    pub distance_m: Option<f64>,
    pub duration_s: Option<f64>,
    pub acceleration_m_s2: Option<f64>,
    pub pitch_initial_deg: Option<f64>,
    pub pitch_final_deg: Option<f64>,
    pub thrust_angle_deg: Option<f64>,
    pub control_points: Option<usize>,
    #[serde(default)]
    pub increment_battery_cycle_day: bool,
}

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Load vehicle configurations from a directory of TOML files, one TOML file, or a YAML list.
pub fn load_vehicle_configs<P: AsRef<Path>>(path: P) -> Result<Vec<VehicleConfig>, ConfigError> {
    load_records(path)
}

/// Load a mission file, choosing TOML or YAML by extension.
pub fn load_mission<P: AsRef<Path>>(path: P) -> Result<MissionFile, ConfigError> {
    let path = path.as_ref();
    if is_toml(path) {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

/// Parse a mission from YAML text.
pub fn parse_mission_yaml(contents: &str) -> Result<MissionFile, ConfigError> {
    Ok(serde_yaml::from_str(contents)?)
}

fn load_records<T, P>(path: P) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if path.is_dir() {
        read_dir_records(path)
    } else if is_toml(path) {
        let contents = std::fs::read_to_string(path)?;
        let record: T = toml::from_str(&contents)?;
        Ok(vec![record])
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

fn read_dir_records<T>(dir: &Path) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    let mut records = Vec::new();
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_toml(path))
        .collect();
    entries.sort();
    for path in entries {
        let contents = std::fs::read_to_string(&path)?;
        let record: T = toml::from_str(&contents)?;
        records.push(record);
    }
    Ok(records)
}

fn is_toml(path: &Path) -> bool {
    path.extension().map(|ext| ext == "toml").unwrap_or(false)
}

fn one() -> f64 {
    1.0
}

fn default_esc_efficiency() -> f64 {
    0.95
}

fn default_minimum_distance() -> f64 {
    10.0
}

fn default_co2_index() -> f64 {
    3.16
}

fn default_h2o_index() -> f64 {
    1.23
}

fn default_nox_index() -> f64 {
    0.014
}
