//! Conversion of parsed configuration into analysis bundles and missions.

use std::sync::Arc;

use flight_analyses::{
    Analyses, BatteryPropeller, DragPolar, EmissionIndices, EmpiricalNoise, EmissionsModel,
    EnergyNetwork, NoiseModel, TurbofanNetwork, Vehicle,
};
use flight_atmosphere::StandardAtmosphere;
use flight_config::{
    ElectricalConfigurationConfig, MissionFile, NetworkConfig, SegmentConfig, SegmentType,
    VehicleConfig,
};
use flight_core::units::{deg_to_rad, kwh_to_j};
use flight_propulsion::{
    AgingModel, Battery, ElectricalConfiguration, Esc, Motor, Rotor, Turbofan,
};
use flight_solver::{SolverError, SolverSettings};

use crate::MissionError;
use crate::segment::{Segment, SegmentKind, VerticalProfile};
use crate::sequencer::{Mission, MissionSettings};

/// Assemble the shared analysis bundle for `vehicle` under `mission`'s models.
pub fn build_analyses(vehicle: &VehicleConfig, mission: &MissionFile) -> Result<Analyses, MissionError> {
    let invalid = |reason: String| MissionError::InvalidVehicle {
        vehicle: vehicle.name.clone(),
        reason,
    };
    if !(vehicle.mass_kg.is_finite() && vehicle.mass_kg > 0.0) {
        return Err(invalid(format!("mass must be positive, got {}", vehicle.mass_kg)));
    }

    let aero = &vehicle.aerodynamics;
    if !(aero.reference_area_m2 > 0.0 && aero.cl_max > 0.0) {
        return Err(invalid(
            "aerodynamics needs a positive reference area and cl_max".to_string(),
        ));
    }
    let aerodynamics = DragPolar {
        reference_area_m2: aero.reference_area_m2,
        mean_chord_m: aero.mean_chord_m,
        cl0: aero.cl0,
        cl_alpha: aero.cl_alpha_per_rad,
        cl_max: aero.cl_max,
        cd0: aero.cd0,
        induced_drag_factor: aero.induced_drag_factor,
        cm0: aero.cm0,
        cm_alpha: aero.cm_alpha_per_rad,
        cy_beta: aero.cy_beta_per_rad,
    };

    let energy: Arc<dyn EnergyNetwork> = match &vehicle.network {
        NetworkConfig::BatteryPropeller {
            electrical_configuration,
            propulsor_count,
            thrust_angle_deg,
            rotor,
            motor,
            esc_efficiency,
            battery,
            avionics_power_w,
        } => {
            let network = BatteryPropeller {
                configuration: match electrical_configuration {
                    ElectricalConfigurationConfig::Series => ElectricalConfiguration::Series,
                    ElectricalConfigurationConfig::Parallel => ElectricalConfiguration::Parallel,
                },
                propulsor_count: *propulsor_count,
                thrust_angle: deg_to_rad(*thrust_angle_deg),
                rotor: Rotor {
                    radius_m: rotor.radius_m,
                    thrust_coefficients: rotor.thrust_coefficients,
                    power_coefficients: rotor.power_coefficients,
                },
                motor: Motor {
                    speed_constant: motor.speed_constant_rad_s_per_v,
                    resistance_ohm: motor.resistance_ohm,
                    no_load_current_a: motor.no_load_current_a,
                    gear_ratio: motor.gear_ratio,
                    gearbox_efficiency: motor.gearbox_efficiency,
                },
                esc: Esc {
                    efficiency: *esc_efficiency,
                },
                battery: Battery {
                    max_energy_j: kwh_to_j(battery.max_energy_kwh),
                    voltage_max_v: battery.voltage_max_v,
                    voltage_min_v: battery.voltage_min_v,
                    internal_resistance_ohm: battery.internal_resistance_ohm,
                    aging: battery.aging.as_ref().map(|aging| AgingModel {
                        capacity_fade_per_day: aging.capacity_fade_per_day,
                        capacity_fade_per_sqrt_ah: aging.capacity_fade_per_sqrt_ah,
                        resistance_growth_per_day: aging.resistance_growth_per_day,
                        resistance_growth_per_ah: aging.resistance_growth_per_ah,
                    }),
                },
                avionics_power_w: *avionics_power_w,
            };
            network.validate().map_err(|e| invalid(e.to_string()))?;
            Arc::new(network)
        }
        NetworkConfig::Turbofan {
            engine_count,
            sea_level_thrust_n,
            tsfc_kg_per_n_s,
            lapse_exponent,
            thrust_angle_deg,
            additional_fuel_rate_kg_s,
        } => {
            let network = TurbofanNetwork {
                engine: Turbofan {
                    sea_level_thrust_n: *sea_level_thrust_n,
                    thrust_specific_fuel_consumption: *tsfc_kg_per_n_s,
                    lapse_exponent: *lapse_exponent,
                },
                engine_count: *engine_count,
                thrust_angle: deg_to_rad(*thrust_angle_deg),
                additional_fuel_rate: *additional_fuel_rate_kg_s,
            };
            network.validate().map_err(|e| invalid(e.to_string()))?;
            Arc::new(network)
        }
        NetworkConfig::Unsupported => {
            return Err(invalid("unsupported energy network type".to_string()));
        }
    };

    let noise = mission.noise.as_ref().map(|config| {
        Arc::new(EmpiricalNoise {
            reference_level_db: config.reference_level_db,
            reference_power_w: config.reference_power_w,
            observer_altitude_m: config.observer_altitude_m,
            minimum_distance_m: config.minimum_distance_m,
        }) as Arc<dyn NoiseModel>
    });
    let emissions = mission.emissions.as_ref().map(|config| {
        Arc::new(EmissionIndices {
            co2: config.co2_index,
            h2o: config.h2o_index,
            nox: config.nox_index,
            grid_co2_per_joule: config.grid_co2_kg_per_kwh / kwh_to_j(1.0),
        }) as Arc<dyn EmissionsModel>
    });

    Ok(Analyses {
        vehicle: Vehicle {
            name: vehicle.name.clone(),
            mass_kg: vehicle.mass_kg,
        },
        atmosphere: StandardAtmosphere::new(mission.atmosphere.temperature_deviation_k),
        aerodynamics: Arc::new(aerodynamics),
        energy,
        noise,
        emissions,
    })
}

/// Resolve the mission's vehicle in `vehicles` and convert every segment record.
pub fn build_mission(file: &MissionFile, vehicles: &[VehicleConfig]) -> Result<Mission, MissionError> {
    let vehicle = vehicles
        .iter()
        .find(|v| v.name.eq_ignore_ascii_case(&file.vehicle))
        .ok_or_else(|| MissionError::UnknownVehicle(file.vehicle.clone()))?;
    if file.segments.is_empty() {
        return Err(MissionError::EmptyMission);
    }
    let analyses = Arc::new(build_analyses(vehicle, file)?);

    let segments = file
        .segments
        .iter()
        .map(|config| build_segment(config, &analyses, file.solver.control_points))
        .collect::<Result<Vec<_>, _>>()?;

    let settings = MissionSettings {
        solver: SolverSettings {
            tolerance: file.solver.tolerance,
            max_iterations: file.solver.max_iterations,
            finite_difference_step: file.solver.finite_difference_step,
            ..SolverSettings::default()
        },
        halt_on_failure: file.solver.halt_on_failure,
        ..MissionSettings::default()
    };
    settings.solver.validate().map_err(|e| match e {
        SolverError::InvalidSettings(reason) => MissionError::InvalidSolverSettings(reason),
        other => MissionError::InvalidSolverSettings(other.to_string()),
    })?;
    Ok(Mission::new(file.name.clone(), segments).with_settings(settings))
}

/// Fields a segment type accepts besides `name`, `type`, `sideslip_deg`,
/// `control_points` and `increment_battery_cycle_day`.
fn allowed_fields(kind: SegmentType) -> &'static [&'static str] {
    match kind {
        SegmentType::SinglePoint => &[
            "altitude_m",
            "air_speed_m_s",
            "throttle",
            "vertical_acceleration_m_s2",
        ],
        SegmentType::Climb => &[
            "altitude_start_m",
            "altitude_end_m",
            "air_speed_m_s",
            "climb_rate_m_s",
            "climb_angle_deg",
            "vertical_acceleration_m_s2",
        ],
        SegmentType::Descent => &[
            "altitude_start_m",
            "altitude_end_m",
            "air_speed_m_s",
            "descent_rate_m_s",
            "descent_angle_deg",
            "vertical_acceleration_m_s2",
        ],
        SegmentType::Cruise => &["altitude_m", "air_speed_m_s", "distance_m"],
        SegmentType::Hover => &["altitude_m", "duration_s", "thrust_angle_deg"],
        SegmentType::Transition => &[
            "altitude_m",
            "air_speed_start_m_s",
            "air_speed_end_m_s",
            "acceleration_m_s2",
            "pitch_initial_deg",
            "pitch_final_deg",
        ],
    }
}

fn provided_fields(config: &SegmentConfig) -> Vec<&'static str> {
    [
        ("altitude_m", config.altitude_m),
        ("altitude_start_m", config.altitude_start_m),
        ("altitude_end_m", config.altitude_end_m),
        ("air_speed_m_s", config.air_speed_m_s),
        ("air_speed_start_m_s", config.air_speed_start_m_s),
        ("air_speed_end_m_s", config.air_speed_end_m_s),
        ("throttle", config.throttle),
        ("climb_rate_m_s", config.climb_rate_m_s),
        ("climb_angle_deg", config.climb_angle_deg),
        ("descent_rate_m_s", config.descent_rate_m_s),
        ("descent_angle_deg", config.descent_angle_deg),
        ("vertical_acceleration_m_s2", config.vertical_acceleration_m_s2),
        ("distance_m", config.distance_m),
        ("duration_s", config.duration_s),
        ("acceleration_m_s2", config.acceleration_m_s2),
        ("pitch_initial_deg", config.pitch_initial_deg),
        ("pitch_final_deg", config.pitch_final_deg),
        ("thrust_angle_deg", config.thrust_angle_deg),
    ]
    .into_iter()
    .filter_map(|(field, value)| value.map(|_| field))
    .collect()
}

/// Convert one flat record into a typed segment, rejecting fields that do not
/// apply to its type and conflicting vertical targets.
pub fn build_segment(
    config: &SegmentConfig,
    analyses: &Arc<Analyses>,
    default_control_points: usize,
) -> Result<Segment, MissionError> {
    let name = config.name.as_str();
    let allowed = allowed_fields(config.kind);
    if let Some(field) = provided_fields(config)
        .into_iter()
        .find(|field| !allowed.contains(field))
    {
        return Err(MissionError::inconsistent(
            name,
            format!("'{field}' does not apply to this segment type"),
        ));
    }
    let required = |field: &str, value: Option<f64>| {
        value.ok_or_else(|| MissionError::inconsistent(name, format!("'{field}' is required")))
    };

    let kind = match config.kind {
        SegmentType::SinglePoint => SegmentKind::SinglePoint {
            altitude: config.altitude_m,
            air_speed: required("air_speed_m_s", config.air_speed_m_s)?,
            throttle: config.throttle,
            vertical_acceleration: config.vertical_acceleration_m_s2.unwrap_or(0.0),
        },
        SegmentType::Climb => SegmentKind::Climb {
            altitude_start: config.altitude_start_m,
            altitude_end: required("altitude_end_m", config.altitude_end_m)?,
            air_speed: required("air_speed_m_s", config.air_speed_m_s)?,
            profile: vertical_profile(
                name,
                [
                    ("climb_rate_m_s", config.climb_rate_m_s),
                    ("climb_angle_deg", config.climb_angle_deg),
                    ("vertical_acceleration_m_s2", config.vertical_acceleration_m_s2),
                ],
            )?,
        },
        SegmentType::Descent => SegmentKind::Descent {
            altitude_start: config.altitude_start_m,
            altitude_end: required("altitude_end_m", config.altitude_end_m)?,
            air_speed: required("air_speed_m_s", config.air_speed_m_s)?,
            profile: vertical_profile(
                name,
                [
                    ("descent_rate_m_s", config.descent_rate_m_s),
                    ("descent_angle_deg", config.descent_angle_deg),
                    ("vertical_acceleration_m_s2", config.vertical_acceleration_m_s2),
                ],
            )?,
        },
        SegmentType::Cruise => SegmentKind::Cruise {
            altitude: config.altitude_m,
            air_speed: required("air_speed_m_s", config.air_speed_m_s)?,
            distance: required("distance_m", config.distance_m)?,
        },
        SegmentType::Hover => SegmentKind::Hover {
            altitude: config.altitude_m,
            duration: required("duration_s", config.duration_s)?,
            thrust_angle: deg_to_rad(config.thrust_angle_deg.unwrap_or(90.0)),
        },
        SegmentType::Transition => SegmentKind::Transition {
            altitude: config.altitude_m,
            air_speed_start: required("air_speed_start_m_s", config.air_speed_start_m_s)?,
            air_speed_end: required("air_speed_end_m_s", config.air_speed_end_m_s)?,
            acceleration: required("acceleration_m_s2", config.acceleration_m_s2)?,
            pitch_initial: deg_to_rad(config.pitch_initial_deg.unwrap_or(0.0)),
            pitch_final: deg_to_rad(config.pitch_final_deg.unwrap_or(0.0)),
        },
    };

    Ok(Segment::new(name, kind, Arc::clone(analyses))
        .with_control_points(config.control_points.unwrap_or(default_control_points))
        .with_sideslip(deg_to_rad(config.sideslip_deg.unwrap_or(0.0)))
        .with_battery_cycle_day(config.increment_battery_cycle_day))
}

/// Exactly one of rate, angle (degrees) or acceleration, in that order.
fn vertical_profile(segment: &str, targets: [(&str, Option<f64>); 3]) -> Result<VerticalProfile, MissionError> {
    let set: Vec<&str> = targets
        .iter()
        .filter_map(|(field, value)| value.map(|_| *field))
        .collect();
    match (set.len(), targets) {
        (1, [(_, Some(rate)), _, _]) => Ok(VerticalProfile::ConstantRate(rate)),
        (1, [_, (_, Some(angle)), _]) => Ok(VerticalProfile::ConstantAngle(deg_to_rad(angle))),
        (1, [_, _, (_, Some(accel))]) => Ok(VerticalProfile::ConstantAcceleration(accel)),
        (0, _) => Err(MissionError::inconsistent(
            segment,
            format!(
                "one of '{}', '{}' or '{}' is required",
                targets[0].0, targets[1].0, targets[2].0
            ),
        )),
        _ => Err(MissionError::inconsistent(
            segment,
            format!("at most one vertical target may be set, found {}", set.join(", ")),
        )),
    }
}
