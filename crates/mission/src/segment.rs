//! Flight segment definitions.

use std::sync::Arc;

use flight_analyses::Analyses;
use flight_state::{Coupling, ResidualKind, UnknownKind};

/// Control points used by multi-point segments unless configured otherwise.
pub const DEFAULT_CONTROL_POINTS: usize = 16;

/// How a climb or descent spends its altitude change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VerticalProfile {
    /// Constant vertical speed (m/s, positive).
    ConstantRate(f64),
    /// Constant flight-path angle magnitude (rad, positive).
    ConstantAngle(f64),
    /// Constant vertical acceleration from zero vertical speed (m/s², positive).
    ConstantAcceleration(f64),
}

/// Segment kind and its scalar parameters. Angles in radians, SI units otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentKind {
    SinglePoint {
        altitude: Option<f64>,
        air_speed: f64,
        /// Prescribed throttle; the horizontal acceleration becomes the unknown.
        throttle: Option<f64>,
        /// Upward acceleration imposed on the point.
        vertical_acceleration: f64,
    },
    Climb {
        altitude_start: Option<f64>,
        altitude_end: f64,
        air_speed: f64,
        profile: VerticalProfile,
    },
    Descent {
        altitude_start: Option<f64>,
        altitude_end: f64,
        air_speed: f64,
        profile: VerticalProfile,
    },
    Cruise {
        altitude: Option<f64>,
        air_speed: f64,
        distance: f64,
    },
    Hover {
        altitude: Option<f64>,
        duration: f64,
        /// Thrust axis tilt above the body x-axis.
        thrust_angle: f64,
    },
    Transition {
        altitude: Option<f64>,
        air_speed_start: f64,
        air_speed_end: f64,
        acceleration: f64,
        pitch_initial: f64,
        pitch_final: f64,
    },
}

impl SegmentKind {
    pub fn label(&self) -> &'static str {
        match self {
            SegmentKind::SinglePoint { .. } => "single_point",
            SegmentKind::Climb { .. } => "climb",
            SegmentKind::Descent { .. } => "descent",
            SegmentKind::Cruise { .. } => "cruise",
            SegmentKind::Hover { .. } => "hover",
            SegmentKind::Transition { .. } => "transition",
        }
    }

    /// Explicit starting altitude, if the segment sets one.
    pub fn start_altitude(&self) -> Option<f64> {
        match self {
            SegmentKind::SinglePoint { altitude, .. }
            | SegmentKind::Cruise { altitude, .. }
            | SegmentKind::Hover { altitude, .. }
            | SegmentKind::Transition { altitude, .. } => *altitude,
            SegmentKind::Climb { altitude_start, .. }
            | SegmentKind::Descent { altitude_start, .. } => *altitude_start,
        }
    }

    /// Unknown/residual pairs solved by the segment, excluding network-specific ones.
    pub fn couplings(&self) -> Vec<Coupling> {
        use ResidualKind::{ForceX, ForceZ};
        use UnknownKind::{Acceleration, BodyAngle, Throttle, ThrustTilt};
        match self {
            SegmentKind::SinglePoint {
                throttle: Some(_), ..
            } => vec![
                Coupling::new(BodyAngle, ForceZ),
                Coupling::new(Acceleration, ForceX),
            ],
            SegmentKind::SinglePoint { .. }
            | SegmentKind::Climb { .. }
            | SegmentKind::Descent { .. }
            | SegmentKind::Cruise { .. } => vec![
                Coupling::new(BodyAngle, ForceZ),
                Coupling::new(Throttle, ForceX),
            ],
            SegmentKind::Hover { .. } => vec![Coupling::new(Throttle, ForceZ)],
            SegmentKind::Transition { .. } => vec![
                Coupling::new(Throttle, ForceZ),
                Coupling::new(ThrustTilt, ForceX),
            ],
        }
    }
}

/// A named flight phase evaluated against a shared analysis bundle.
#[derive(Debug, Clone)]
pub struct Segment {
    pub name: String,
    pub kind: SegmentKind,
    pub control_points: usize,
    pub sideslip_angle: f64,
    /// Advance the storage age once this segment has been solved.
    pub increment_battery_cycle_day: bool,
    pub analyses: Arc<Analyses>,
}

impl Segment {
    pub fn new(name: impl Into<String>, kind: SegmentKind, analyses: Arc<Analyses>) -> Self {
        Self {
            name: name.into(),
            kind,
            control_points: DEFAULT_CONTROL_POINTS,
            sideslip_angle: 0.0,
            increment_battery_cycle_day: false,
            analyses,
        }
    }

    pub fn with_control_points(mut self, control_points: usize) -> Self {
        self.control_points = control_points;
        self
    }

    pub fn with_sideslip(mut self, sideslip_angle: f64) -> Self {
        self.sideslip_angle = sideslip_angle;
        self
    }

    pub fn with_battery_cycle_day(mut self, increment: bool) -> Self {
        self.increment_battery_cycle_day = increment;
        self
    }

    /// Points evaluated for this segment. Single-point segments always use one.
    pub fn points(&self) -> usize {
        match self.kind {
            SegmentKind::SinglePoint { .. } => 1,
            _ => self.control_points,
        }
    }

    /// Every unknown/residual pair solved for this segment, in unknown-vector order.
    pub fn couplings(&self) -> Vec<Coupling> {
        let mut couplings = self.kind.couplings();
        couplings.extend(self.analyses.energy.couplings());
        couplings
    }
}
