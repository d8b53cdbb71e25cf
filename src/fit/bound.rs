//! Confidence band and limit-crossing solve.
//!
//! The band half-width at a query time `t0` is
//!
//! ```text
//! h(t0) = t_crit * se * sqrt(1/n + (t0 - t̄)² / Sxx)
//! ```
//!
//! with `t_crit` the two-sided Student-t quantile at the chosen level and
//! `n - 2` degrees of freedom. The shelf life is solved once, at release
//! (`t0 = 0`), as `t = (limit - intercept - h(0)) / slope`.

use crate::domain::{
    BoundDiagnostics, ConfidenceBand, ConfidenceLevel, RegressionResult, ShelfLife,
};
use crate::error::EstimateError;
use crate::fit::regression::{checked_sxx, residual_standard_error, validate_series};
use crate::math::{mean, t_quantile};

/// Solved times at or below this are reported as `Exceeded`.
pub const RELEASE_TOLERANCE_MONTHS: f64 = 1e-9;

/// Result of `bound_and_solve`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundOutcome {
    pub predicted: Vec<f64>,
    pub band: ConfidenceBand,
    pub shelf_life: ShelfLife,
    pub note: String,
    pub diagnostics: BoundDiagnostics,
}

impl BoundDiagnostics {
    /// Band half-width at query time `t0`.
    pub fn half_width(&self, t0: f64) -> f64 {
        let d = t0 - self.mean_time;
        self.t_critical * self.residual_se * (1.0 / self.n as f64 + d * d / self.sxx).sqrt()
    }
}

/// Build the confidence band for `regression` and solve for the shelf life.
pub fn bound_and_solve(
    times: &[f64],
    values: &[f64],
    regression: &RegressionResult,
    limit: f64,
    confidence_level: ConfidenceLevel,
) -> Result<BoundOutcome, EstimateError> {
    let diagnostics = diagnostics(times, values, regression, confidence_level)?;

    let predicted: Vec<f64> = times.iter().map(|&t| regression.predict(t)).collect();
    let (lower, upper): (Vec<f64>, Vec<f64>) = times
        .iter()
        .zip(&predicted)
        .map(|(&t, &p)| {
            let h = diagnostics.half_width(t);
            (p - h, p + h)
        })
        .unzip();

    let (shelf_life, note) = solve_shelf_life(regression, &diagnostics, limit, confidence_level);

    Ok(BoundOutcome {
        predicted,
        band: ConfidenceBand { lower, upper },
        shelf_life,
        note,
        diagnostics,
    })
}

/// Compute the quantities the band depends on.
pub fn diagnostics(
    times: &[f64],
    values: &[f64],
    regression: &RegressionResult,
    confidence_level: ConfidenceLevel,
) -> Result<BoundDiagnostics, EstimateError> {
    validate_series(times, values)?;
    let n = times.len();
    let sxx = checked_sxx(times)?;
    let degrees_of_freedom = n - 2;
    let t_critical = t_quantile(confidence_level.quantile_probability(), degrees_of_freedom as f64)
        .ok_or(EstimateError::InsufficientData { n })?;
    let residual_se = residual_standard_error(times, values, regression.intercept, regression.slope);

    let mut diag = BoundDiagnostics {
        n,
        degrees_of_freedom,
        t_critical,
        residual_se,
        mean_time: mean(times),
        sxx,
        release_half_width: 0.0,
    };
    diag.release_half_width = diag.half_width(0.0);
    Ok(diag)
}

/// Solve for the month at which the release-adjusted line meets `limit`.
///
/// The line is shifted by the release half-width `h(0)` before solving.
pub fn solve_shelf_life(
    regression: &RegressionResult,
    diagnostics: &BoundDiagnostics,
    limit: f64,
    confidence_level: ConfidenceLevel,
) -> (ShelfLife, String) {
    if regression.slope >= 0.0 {
        return (ShelfLife::Infinite, "no statistically meaningful trend".to_string());
    }

    let t = (limit - regression.intercept - diagnostics.release_half_width) / regression.slope;
    // Crossings at release (within rounding noise) count as exceeded.
    if t <= RELEASE_TOLERANCE_MONTHS {
        (
            ShelfLife::Exceeded,
            format!("{confidence_level} release-adjusted trend is at or below the {limit}% limit at release"),
        )
    } else {
        (
            ShelfLife::Months(t),
            format!("{confidence_level} release-adjusted trend reaches the {limit}% limit at {t:.1} months"),
        )
    }
}
