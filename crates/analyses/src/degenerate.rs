//! Normalization of numeric degeneracies inside update functions.
//!
//! None of these conditions is an error: each is replaced by a physically
//! meaningful value, counted in the container diagnostics, and traced.

use flight_state::Diagnostics;

/// Replace a NaN with zero.
pub(crate) fn zero_nan(value: f64, what: &str, index: usize, diagnostics: &mut Diagnostics) -> f64 {
    if value.is_nan() {
        log::trace!("{what}[{index}] evaluated to NaN; replaced with 0");
        diagnostics.nan_replaced += 1;
        0.0
    } else {
        value
    }
}

/// Clip a lift coefficient symmetrically to `limit`.
pub(crate) fn clip_lift(value: f64, limit: f64, index: usize, diagnostics: &mut Diagnostics) -> f64 {
    if value.abs() > limit {
        log::trace!("lift coefficient {value:.4} at point {index} clipped to ±{limit}");
        diagnostics.lift_clipped += 1;
        value.clamp(-limit, limit)
    } else {
        value
    }
}

/// Motors cannot return charge to the pack.
pub(crate) fn clamp_current(value: f64, index: usize, diagnostics: &mut Diagnostics) -> f64 {
    if value < 0.0 {
        log::trace!("motor current {value:.3} A at point {index} clamped to 0");
        diagnostics.current_clamped += 1;
        0.0
    } else {
        value
    }
}

pub(crate) fn zero_dynamic_pressure(q: f64, index: usize, diagnostics: &mut Diagnostics) {
    log::trace!("dynamic pressure {q:.3} Pa at point {index}; aerodynamic coefficients set to 0");
    diagnostics.zero_dynamic_pressure += 1;
}
