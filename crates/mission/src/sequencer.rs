//! Mission sequencing: segments in order, each seeded by the previous result.

use std::sync::atomic::{AtomicBool, Ordering};

use flight_solver::{NewtonSolver, SolverError, SolverSettings};
use flight_state::{BatteryAge, Conditions, FinalState};

use crate::MissionError;
use crate::initializer::{InitializedSegment, initialize};
use crate::segment::Segment;
use crate::system::SegmentSystem;

/// Mission-wide solver and bookkeeping options.
#[derive(Debug, Clone, PartialEq)]
pub struct MissionSettings {
    pub solver: SolverSettings,
    /// Abort the mission on the first unconverged segment.
    pub halt_on_failure: bool,
    /// Storage age before the first segment.
    pub initial_battery_age: BatteryAge,
}

impl Default for MissionSettings {
    fn default() -> Self {
        Self {
            solver: SolverSettings::default(),
            halt_on_failure: false,
            initial_battery_age: BatteryAge::default(),
        }
    }
}

/// Convergence outcome of one segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentStatus {
    Solved,
    Unconverged { iterations: usize, residual_norm: f64 },
}

impl SegmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentStatus::Solved => "solved",
            SegmentStatus::Unconverged { .. } => "unconverged",
        }
    }
}

/// Frozen outcome of one segment.
#[derive(Debug, Clone)]
pub struct SegmentResult {
    pub name: String,
    pub kind: &'static str,
    pub status: SegmentStatus,
    pub iterations: usize,
    pub residual_norm: f64,
    /// Storage age after the segment, for networks with a battery.
    pub battery_age: Option<BatteryAge>,
    conditions: Conditions,
}

impl SegmentResult {
    pub fn conditions(&self) -> &Conditions {
        &self.conditions
    }

    pub fn is_solved(&self) -> bool {
        self.status == SegmentStatus::Solved
    }

    pub fn final_state(&self) -> Option<FinalState> {
        self.conditions.final_state()
    }
}

/// Ordered per-segment results of a mission run.
#[derive(Debug, Clone)]
pub struct MissionResults {
    pub name: String,
    pub segments: Vec<SegmentResult>,
}

impl MissionResults {
    pub fn all_solved(&self) -> bool {
        self.segments.iter().all(SegmentResult::is_solved)
    }

    pub fn segment(&self, name: &str) -> Option<&SegmentResult> {
        self.segments.iter().find(|s| s.name == name)
    }

    pub fn final_state(&self) -> Option<FinalState> {
        self.segments.last().and_then(SegmentResult::final_state)
    }
}

/// What one segment hands to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct CarriedState {
    pub final_state: FinalState,
    pub battery_age: BatteryAge,
}

/// Ordered list of segments evaluated as one run.
#[derive(Debug, Clone)]
pub struct Mission {
    pub name: String,
    pub segments: Vec<Segment>,
    pub settings: MissionSettings,
}

impl Mission {
    pub fn new(name: impl Into<String>, segments: Vec<Segment>) -> Self {
        Self {
            name: name.into(),
            segments,
            settings: MissionSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: MissionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Evaluate every segment in order.
    pub fn evaluate(&self) -> Result<MissionResults, MissionError> {
        self.evaluate_until(&AtomicBool::new(false))
    }

    /// Evaluate every segment in order, stopping before the next segment once
    /// `cancel` is set.
    pub fn evaluate_until(&self, cancel: &AtomicBool) -> Result<MissionResults, MissionError> {
        if self.segments.is_empty() {
            return Err(MissionError::EmptyMission);
        }
        log::info!("evaluating mission '{}' ({} segments)", self.name, self.segments.len());

        let mut carried: Option<CarriedState> = None;
        let mut results = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            if cancel.load(Ordering::Relaxed) {
                log::warn!("mission '{}' cancelled after {} segment(s)", self.name, results.len());
                return Err(MissionError::Cancelled {
                    completed: results.len(),
                });
            }
            let result = solve_segment(segment, carried.as_ref(), &self.settings)?;
            let age = result
                .battery_age
                .or(carried.as_ref().map(|c| c.battery_age))
                .unwrap_or(self.settings.initial_battery_age);
            carried = result.final_state().map(|final_state| CarriedState {
                final_state,
                battery_age: age,
            });
            results.push(result);
        }

        Ok(MissionResults {
            name: self.name.clone(),
            segments: results,
        })
    }
}

/// Initialize, solve and freeze one segment.
///
/// An unconverged solve keeps the best available state and is flagged in the
/// result, unless `halt_on_failure` turns it into an error. The pipeline is
/// re-run at the final unknowns so the container matches them exactly; the
/// storage age advances afterwards, once.
pub fn solve_segment(
    segment: &Segment,
    previous: Option<&CarriedState>,
    settings: &MissionSettings,
) -> Result<SegmentResult, MissionError> {
    let name = segment.name.as_str();
    let age = previous.map_or(settings.initial_battery_age, |c| c.battery_age);
    let InitializedSegment {
        mut conditions,
        unknowns,
        couplings,
    } = initialize(segment, previous.map(|c| &c.final_state), age)?;
    let analyses = segment.analyses.as_ref();

    let mut system = SegmentSystem::new(analyses, &mut conditions, &couplings);
    let mut solver = NewtonSolver::new(settings.solver.clone());
    let (final_unknowns, status, iterations, residual_norm) = match solver.solve(&mut system, unknowns) {
        Ok(solution) => (
            solution.unknowns,
            SegmentStatus::Solved,
            solution.iterations,
            solution.residual_norm,
        ),
        Err(SolverError::ConvergenceFailure {
            iterations,
            residual_norm,
            residuals,
            unknowns,
        }) => {
            log::warn!(
                "segment '{name}' did not converge after {iterations} iterations (residual {residual_norm:e})"
            );
            if settings.halt_on_failure {
                return Err(MissionError::ConvergenceFailure {
                    segment: name.to_string(),
                    iterations,
                    residual_norm,
                    residuals,
                });
            }
            (
                unknowns,
                SegmentStatus::Unconverged {
                    iterations,
                    residual_norm,
                },
                iterations,
                residual_norm,
            )
        }
        Err(source) => {
            return Err(MissionError::Solver {
                segment: name.to_string(),
                source,
            });
        }
    };
    system
        .apply(&final_unknowns)
        .map_err(|e| MissionError::state(name, e))?;

    let diagnostics = conditions.diagnostics;
    if diagnostics.total() > 0 {
        log::debug!(
            "segment '{name}' degeneracies: {} zero dynamic pressure, {} lift clipped, {} current clamped, {} NaN replaced",
            diagnostics.zero_dynamic_pressure,
            diagnostics.lift_clipped,
            diagnostics.current_clamped,
            diagnostics.nan_replaced
        );
    }

    let mut battery_age = conditions.energy.battery.as_ref().map(|b| BatteryAge {
        charge_throughput_ah: b.age.charge_throughput_ah
            + b.charge_throughput.last().copied().unwrap_or(0.0),
        ..b.age
    });
    if segment.increment_battery_cycle_day {
        if let Some(next) = analyses.energy.advance_storage_age(&conditions) {
            log::debug!(
                "segment '{name}' advanced storage to cycle day {} (capacity {:.4}, resistance {:.4})",
                next.cycle_day,
                next.capacity_fade,
                next.resistance_growth
            );
            battery_age = Some(next);
        }
    }

    if status == SegmentStatus::Solved {
        log::info!("segment '{name}' solved in {iterations} iteration(s) (residual {residual_norm:e})");
    }
    Ok(SegmentResult {
        name: name.to_string(),
        kind: segment.kind.label(),
        status,
        iterations,
        residual_norm,
        battery_age,
        conditions,
    })
}
