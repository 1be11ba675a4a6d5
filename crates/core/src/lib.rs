//! Core units, constants, and shared primitives for the flight mission workspace.

/// Physical constants expressed in SI units (unless stated otherwise).
pub mod constants {
    /// Standard gravity at Earth's surface (m/s²).
    pub const G0: f64 = 9.80665;
    /// Mean Earth radius used for the inverse-square gravity correction (m).
    pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
    /// Specific gas constant of dry air (J/(kg·K)).
    pub const GAS_CONSTANT_AIR: f64 = 287.052_87;
    /// Ratio of specific heats for air.
    pub const GAMMA_AIR: f64 = 1.4;
    /// Sea-level standard density (kg/m³).
    pub const SEA_LEVEL_DENSITY: f64 = 1.225;
    /// Sea-level standard temperature (K).
    pub const SEA_LEVEL_TEMPERATURE: f64 = 288.15;
    /// Sea-level standard pressure (Pa).
    pub const SEA_LEVEL_PRESSURE: f64 = 101_325.0;
    /// Lower heating value of kerosene-type jet fuel (J/kg).
    pub const JET_FUEL_LHV: f64 = 43.0e6;
    pub const SECONDS_PER_HOUR: f64 = 3_600.0;
}

/// Basic unit conversion helpers.
pub mod units {
    use super::constants::SECONDS_PER_HOUR;

    /// Convert degrees to radians.
    #[inline]
    pub fn deg_to_rad(v: f64) -> f64 {
        v.to_radians()
    }

    /// Convert kilowatt-hours to joules.
    #[inline]
    pub fn kwh_to_j(v: f64) -> f64 {
        v * 1_000.0 * SECONDS_PER_HOUR
    }

    /// Convert joules to kilowatt-hours.
    #[inline]
    pub fn j_to_kwh(v: f64) -> f64 {
        v / (1_000.0 * SECONDS_PER_HOUR)
    }

    /// Convert ampere-seconds (coulombs) to ampere-hours.
    #[inline]
    pub fn coulomb_to_ah(v: f64) -> f64 {
        v / SECONDS_PER_HOUR
    }

    /// Convert angular speed in rad/s to revolutions per minute.
    #[inline]
    pub fn rad_s_to_rpm(v: f64) -> f64 {
        v * 60.0 / std::f64::consts::TAU
    }
}

/// Minimal vector helpers to avoid ad-hoc `[f64; 3]` math everywhere.
pub mod vector {
    /// Alias for a 3D vector in the north-east-down convention used across the workspace.
    pub type Vector3 = [f64; 3];

    /// Zero vector.
    pub const ZERO: Vector3 = [0.0, 0.0, 0.0];

    /// Euclidean norm of a vector.
    #[inline]
    pub fn norm(v: &Vector3) -> f64 {
        dot(v, v).sqrt()
    }

    /// Dot product of two vectors.
    #[inline]
    pub fn dot(a: &Vector3, b: &Vector3) -> f64 {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
    }

    /// Cross product of two vectors.
    #[inline]
    pub fn cross(a: &Vector3, b: &Vector3) -> Vector3 {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    }

    /// Vector addition.
    #[inline]
    pub fn add(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
    }

    /// Vector subtraction.
    #[inline]
    pub fn sub(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    /// Scale a vector by a scalar.
    #[inline]
    pub fn scale(v: &Vector3, s: f64) -> Vector3 {
        [v[0] * s, v[1] * s, v[2] * s]
    }

    /// Unit vector along `v`, or `None` when `v` has no usable length.
    #[inline]
    pub fn unit(v: &Vector3) -> Option<Vector3> {
        let n = norm(v);
        if n > f64::EPSILON && n.is_finite() {
            Some(scale(v, 1.0 / n))
        } else {
            None
        }
    }

    /// Direction of a body-fixed axis pitched up by `angle` from the inertial x-axis.
    #[inline]
    pub fn pitched_axis(angle: f64) -> Vector3 {
        [angle.cos(), 0.0, -angle.sin()]
    }
}
