//! Segment initialization.
//!
//! Scalar segment parameters and the previous segment's final state become a
//! fully shaped [`Conditions`] container plus an analytic first guess for
//! every unknown. Kinematics are prescribed exactly here; the solver never
//! changes velocities, positions or altitudes.

use std::f64::consts::FRAC_PI_2;

use flight_atmosphere::gravity;
use flight_core::units::deg_to_rad;
use flight_core::vector::{self, Vector3};
use flight_solver::chebyshev;
use flight_state::{BatteryAge, Conditions, Coupling, FinalState, Numerics, StateError, UnknownKind};

use crate::MissionError;
use crate::segment::{Segment, SegmentKind, VerticalProfile};
use crate::updates::flight_path_angle;

/// Limit on the analytic body-angle guess (deg).
const MAX_BODY_ANGLE_GUESS_DEG: f64 = 15.0;

/// Container and unknown vector ready for the solver.
#[derive(Debug, Clone)]
pub struct InitializedSegment {
    pub conditions: Conditions,
    /// Flattened guesses, one block of `points` values per coupling.
    pub unknowns: Vec<f64>,
    pub couplings: Vec<Coupling>,
}

/// Prescribed kinematics on the segment's control points.
struct Profile {
    duration: f64,
    altitude: Vec<f64>,
    horizontal_speed: Vec<f64>,
    /// Positive upwards.
    vertical_speed: Vec<f64>,
    pitch: Option<Vec<f64>>,
}

/// Build the initial container for `segment`.
///
/// `previous` supplies any starting quantity the segment leaves unspecified
/// (altitude, time, position, mass, stored energy); `age` is the storage age
/// at the start of the segment.
pub fn initialize(
    segment: &Segment,
    previous: Option<&FinalState>,
    age: BatteryAge,
) -> Result<InitializedSegment, MissionError> {
    let name = segment.name.as_str();
    validate(segment)?;
    let start_altitude = resolve_start_altitude(segment, previous)?;

    let points = segment.points();
    let discretization = chebyshev(points).map_err(|source| MissionError::Solver {
        segment: name.to_string(),
        source,
    })?;
    let x = discretization.dimensionless_time.clone();
    let profile = profile(segment, start_altitude, &x)?;
    let (differentiate, integrate) = discretization.scaled(profile.duration);

    let analyses = segment.analyses.as_ref();
    let mut conditions = Conditions::new(&analyses.layout(points));
    conditions.numerics = Numerics {
        dimensionless_time: x.clone(),
        differentiate,
        integrate,
    };

    let (sin_beta, cos_beta) = segment.sideslip_angle.sin_cos();
    let velocity: Vec<Vector3> = profile
        .horizontal_speed
        .iter()
        .zip(&profile.vertical_speed)
        .map(|(vh, vu)| [vh * cos_beta, vh * sin_beta, -vu])
        .collect();
    let north = conditions.numerics.integrate(&component(&velocity, 0));
    let east = conditions.numerics.integrate(&component(&velocity, 1));
    let acceleration: Vec<Vec<f64>> = (0..3)
        .map(|axis| conditions.numerics.differentiate(&component(&velocity, axis)))
        .collect();

    let t0 = previous.map_or(0.0, |p| p.time);
    let origin = previous.map_or(vector::ZERO, |p| p.position);
    let inertial = &mut conditions.frames.inertial;
    for i in 0..points {
        inertial.time[i] = t0 + profile.duration * x[i];
        inertial.velocity_vector[i] = velocity[i];
        inertial.position_vector[i] = [origin[0] + north[i], origin[1] + east[i], -profile.altitude[i]];
        inertial.acceleration_vector[i] = [acceleration[0][i], acceleration[1][i], acceleration[2][i]];
    }
    if let SegmentKind::SinglePoint {
        vertical_acceleration,
        throttle,
        ..
    } = segment.kind
    {
        inertial.acceleration_vector.iter_mut().for_each(|a| a[2] = -vertical_acceleration);
        if let Some(throttle) = throttle {
            conditions.propulsion.throttle.fill(throttle);
        }
    }

    for (i, altitude) in profile.altitude.iter().copied().enumerate() {
        let air = analyses
            .atmosphere
            .compute(altitude)
            .map_err(|source| MissionError::Atmosphere {
                segment: name.to_string(),
                source,
            })?;
        let speed = vector::norm(&velocity[i]);
        let fs = &mut conditions.freestream;
        fs.altitude[i] = altitude;
        fs.density[i] = air.density_kg_m3;
        fs.temperature[i] = air.temperature_k;
        fs.pressure[i] = air.pressure_pa;
        fs.speed_of_sound[i] = air.speed_of_sound_m_s;
        fs.dynamic_viscosity[i] = air.dynamic_viscosity_pa_s;
        fs.velocity[i] = speed;
        fs.mach_number[i] = speed / air.speed_of_sound_m_s;
        fs.dynamic_pressure[i] = 0.5 * air.density_kg_m3 * speed * speed;
        fs.gravity[i] = gravity(altitude);
    }

    let mass = previous.map_or(analyses.vehicle.mass_kg, |p| p.mass);
    conditions.weights.initial_mass = mass;
    conditions.weights.total_mass.fill(mass);

    let tilt = match segment.kind {
        SegmentKind::Hover { thrust_angle, .. } => thrust_angle,
        _ => analyses.energy.default_thrust_angle(),
    };
    conditions.propulsion.thrust_tilt_angle.fill(tilt);
    if let Some(pitch) = &profile.pitch {
        conditions.frames.body.inclination_angle.copy_from_slice(pitch);
    }
    conditions.frames.wind.sideslip_angle.fill(segment.sideslip_angle);

    analyses
        .energy
        .initialize(&mut conditions, previous.and_then(|p| p.battery_energy), age)
        .map_err(|e| MissionError::state(name, e))?;

    let couplings = segment.couplings();
    seed_unknowns(segment, &couplings, &mut conditions);
    let mut unknowns = Vec::with_capacity(couplings.len() * points);
    for coupling in &couplings {
        let values = conditions
            .read_unknown(coupling.unknown)
            .ok_or_else(|| MissionError::state(name, StateError::MissingRecord("propulsion.rotor")))?;
        unknowns.extend(values);
    }

    log::debug!(
        "segment '{name}' initialized: {} at {start_altitude:.1} m, {points} point(s), {:.1} s, {} unknown(s)",
        segment.kind.label(),
        profile.duration,
        unknowns.len()
    );
    Ok(InitializedSegment {
        conditions,
        unknowns,
        couplings,
    })
}

fn resolve_start_altitude(segment: &Segment, previous: Option<&FinalState>) -> Result<f64, MissionError> {
    segment
        .kind
        .start_altitude()
        .or_else(|| previous.map(|p| p.altitude))
        .ok_or_else(|| MissionError::MissingInitialCondition {
            segment: segment.name.clone(),
            parameter: "altitude",
        })
}

fn validate(segment: &Segment) -> Result<(), MissionError> {
    let check = Check(&segment.name);
    if !segment.sideslip_angle.is_finite() || segment.sideslip_angle.abs() >= FRAC_PI_2 {
        return Err(check.fail(format!(
            "sideslip angle {} rad is outside (-pi/2, pi/2)",
            segment.sideslip_angle
        )));
    }
    if !matches!(segment.kind, SegmentKind::SinglePoint { .. }) && segment.control_points < 2 {
        return Err(check.fail(format!(
            "{} segments need at least two control points, got {}",
            segment.kind.label(),
            segment.control_points
        )));
    }
    if let Some(altitude) = segment.kind.start_altitude() {
        check.finite("altitude", altitude)?;
    }

    match &segment.kind {
        SegmentKind::SinglePoint {
            air_speed,
            throttle,
            vertical_acceleration,
            ..
        } => {
            check.non_negative("air_speed", *air_speed)?;
            check.finite("vertical_acceleration", *vertical_acceleration)?;
            if let Some(throttle) = throttle {
                if !(0.0..=1.0).contains(throttle) {
                    return Err(check.fail(format!("throttle {throttle} is outside [0, 1]")));
                }
            }
        }
        SegmentKind::Climb {
            altitude_end,
            air_speed,
            profile,
            ..
        }
        | SegmentKind::Descent {
            altitude_end,
            air_speed,
            profile,
            ..
        } => {
            check.finite("altitude_end", *altitude_end)?;
            check.positive("air_speed", *air_speed)?;
            match profile {
                VerticalProfile::ConstantRate(rate) => check.positive("vertical rate", *rate)?,
                VerticalProfile::ConstantAngle(angle) => {
                    check.positive("flight path angle", *angle)?;
                    if *angle >= FRAC_PI_2 {
                        return Err(check.fail(format!("flight path angle {angle} rad is not below pi/2")));
                    }
                }
                VerticalProfile::ConstantAcceleration(accel) => {
                    check.positive("vertical acceleration", *accel)?
                }
            }
        }
        SegmentKind::Cruise {
            air_speed, distance, ..
        } => {
            check.positive("air_speed", *air_speed)?;
            check.positive("distance", *distance)?;
        }
        SegmentKind::Hover {
            duration,
            thrust_angle,
            ..
        } => {
            check.positive("duration", *duration)?;
            check.finite("thrust_angle", *thrust_angle)?;
        }
        SegmentKind::Transition {
            air_speed_start,
            air_speed_end,
            acceleration,
            pitch_initial,
            pitch_final,
            ..
        } => {
            check.non_negative("air_speed_start", *air_speed_start)?;
            check.non_negative("air_speed_end", *air_speed_end)?;
            check.finite("acceleration", *acceleration)?;
            check.finite("pitch_initial", *pitch_initial)?;
            check.finite("pitch_final", *pitch_final)?;
            let duration = (air_speed_end - air_speed_start) / acceleration;
            if !(duration.is_finite() && duration > 0.0) {
                return Err(check.fail(format!(
                    "acceleration {acceleration} m/s² cannot take air speed from {air_speed_start} to {air_speed_end} m/s"
                )));
            }
        }
    }
    Ok(())
}

struct Check<'a>(&'a str);

impl Check<'_> {
    fn fail(&self, reason: String) -> MissionError {
        MissionError::inconsistent(self.0, reason)
    }

    fn finite(&self, parameter: &str, value: f64) -> Result<(), MissionError> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(self.fail(format!("{parameter} must be finite, got {value}")))
        }
    }

    fn positive(&self, parameter: &str, value: f64) -> Result<(), MissionError> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(self.fail(format!("{parameter} must be positive, got {value}")))
        }
    }

    fn non_negative(&self, parameter: &str, value: f64) -> Result<(), MissionError> {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(self.fail(format!("{parameter} must not be negative, got {value}")))
        }
    }
}

fn profile(segment: &Segment, start: f64, x: &[f64]) -> Result<Profile, MissionError> {
    let n = x.len();
    let level = |speed: f64, duration: f64| Profile {
        duration,
        altitude: vec![start; n],
        horizontal_speed: vec![speed; n],
        vertical_speed: vec![0.0; n],
        pitch: None,
    };

    match segment.kind {
        SegmentKind::SinglePoint { air_speed, .. } => Ok(level(air_speed, 0.0)),
        SegmentKind::Climb {
            altitude_end,
            air_speed,
            profile,
            ..
        } => {
            if altitude_end <= start {
                return Err(MissionError::inconsistent(
                    &segment.name,
                    format!("climb ends at {altitude_end} m, not above its start at {start} m"),
                ));
            }
            vertical_profile(segment, start, altitude_end, air_speed, profile, x)
        }
        SegmentKind::Descent {
            altitude_end,
            air_speed,
            profile,
            ..
        } => {
            if altitude_end >= start {
                return Err(MissionError::inconsistent(
                    &segment.name,
                    format!("descent ends at {altitude_end} m, not below its start at {start} m"),
                ));
            }
            vertical_profile(segment, start, altitude_end, air_speed, profile, x)
        }
        SegmentKind::Cruise {
            air_speed, distance, ..
        } => Ok(level(air_speed, distance / air_speed)),
        SegmentKind::Hover { duration, .. } => Ok(level(0.0, duration)),
        SegmentKind::Transition {
            air_speed_start,
            air_speed_end,
            acceleration,
            pitch_initial,
            pitch_final,
            ..
        } => Ok(Profile {
            duration: (air_speed_end - air_speed_start) / acceleration,
            altitude: vec![start; n],
            horizontal_speed: linear(air_speed_start, air_speed_end, x),
            vertical_speed: vec![0.0; n],
            pitch: Some(linear(pitch_initial, pitch_final, x)),
        }),
    }
}

/// Climb or descent kinematics. Endpoint altitudes are reproduced exactly.
fn vertical_profile(
    segment: &Segment,
    start: f64,
    end: f64,
    air_speed: f64,
    profile: VerticalProfile,
    x: &[f64],
) -> Result<Profile, MissionError> {
    let n = x.len();
    let sign = (end - start).signum();
    let change = (end - start).abs();
    let too_steep = |rate: f64| {
        MissionError::inconsistent(
            &segment.name,
            format!("vertical speed {rate:.3} m/s is not below the air speed {air_speed} m/s"),
        )
    };
    let horizontal = |rate: f64| (air_speed * air_speed - rate * rate).max(0.0).sqrt();

    let (duration, altitude, vertical_speed) = match profile {
        VerticalProfile::ConstantRate(rate) => {
            if rate >= air_speed {
                return Err(too_steep(rate));
            }
            (change / rate, linear(start, end, x), vec![sign * rate; n])
        }
        VerticalProfile::ConstantAngle(angle) => {
            let rate = air_speed * angle.sin();
            (change / rate, linear(start, end, x), vec![sign * rate; n])
        }
        VerticalProfile::ConstantAcceleration(accel) => {
            let duration = (2.0 * change / accel).sqrt();
            let final_rate = accel * duration;
            if final_rate >= air_speed {
                return Err(too_steep(final_rate));
            }
            let altitude: Vec<f64> = x.iter().map(|s| start * (1.0 - s * s) + end * s * s).collect();
            let rates: Vec<f64> = x.iter().map(|s| sign * final_rate * s).collect();
            (duration, altitude, rates)
        }
    };
    let horizontal_speed = vertical_speed.iter().map(|v: &f64| horizontal(v.abs())).collect();
    Ok(Profile {
        duration,
        altitude,
        horizontal_speed,
        vertical_speed,
        pitch: None,
    })
}

fn linear(start: f64, end: f64, x: &[f64]) -> Vec<f64> {
    x.iter().map(|s| start * (1.0 - s) + end * s).collect()
}

fn component(values: &[Vector3], axis: usize) -> Vec<f64> {
    values.iter().map(|v| v[axis]).collect()
}

/// Analytic guesses written straight into the container fields the unknowns map to.
///
/// Body angle comes from small-angle lift equal to weight plus the flight-path
/// angle; throttle and rotor power coefficient from the network's estimate of
/// the thrust balancing drag, the weight component along the path and the
/// prescribed acceleration.
fn seed_unknowns(segment: &Segment, couplings: &[Coupling], conditions: &mut Conditions) {
    let analyses = segment.analyses.as_ref();
    let aero = analyses.aerodynamics.as_ref();
    let area = aero.reference_area();
    let solves = |kind: UnknownKind| couplings.iter().any(|c| c.unknown == kind);
    let solves_body_angle = solves(UnknownKind::BodyAngle);
    let solves_throttle = solves(UnknownKind::Throttle);
    let solves_tilt = solves(UnknownKind::ThrustTilt);
    let limit = deg_to_rad(MAX_BODY_ANGLE_GUESS_DEG);

    for i in 0..conditions.points() {
        let velocity = conditions.frames.inertial.velocity_vector[i];
        let accel = conditions.frames.inertial.acceleration_vector[i];
        let gamma = flight_path_angle(&velocity);
        let q = conditions.freestream.dynamic_pressure[i];
        let mass = conditions.weights.total_mass[i];
        let weight = mass * conditions.freestream.gravity[i];
        let lifting = q > 0.0 && area > 0.0;
        let cl = if lifting { weight * gamma.cos() / (q * area) } else { 0.0 };

        if solves_body_angle {
            conditions.frames.body.inclination_angle[i] = if lifting {
                (aero.trim_angle_of_attack(cl) + gamma).clamp(-limit, limit)
            } else {
                0.0
            };
        }

        let required = match segment.kind {
            SegmentKind::Hover { .. } => weight - mass * accel[2],
            SegmentKind::Transition { .. } => {
                let drag = if lifting { q * area * aero.drag_coefficient(0.0) } else { 0.0 };
                let horizontal = drag + mass * accel[0];
                let vertical = weight - mass * accel[2];
                if solves_tilt {
                    conditions.propulsion.thrust_tilt_angle[i] =
                        vertical.atan2(horizontal) - conditions.frames.body.inclination_angle[i];
                }
                horizontal.hypot(vertical)
            }
            _ => {
                let drag = if lifting { q * area * aero.drag_coefficient(cl) } else { 0.0 };
                let along = vector::unit(&velocity).map_or(0.0, |u| vector::dot(&accel, &u));
                drag + weight * gamma.sin() + mass * along
            }
        };

        let guess = analyses.energy.initial_guess(conditions, i, required.max(0.0));
        if solves_throttle {
            conditions.propulsion.throttle[i] = guess.throttle;
        }
        if let (Some(cp), Some(rotor)) = (guess.power_coefficient, conditions.propulsion.rotor.as_mut()) {
            rotor.power_coefficient[i] = cp;
        }
    }
}
