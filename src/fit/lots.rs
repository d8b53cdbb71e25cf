//! Per-lot estimation and limit sensitivity.

use tracing::{info, warn};

use crate::domain::{EstimationParameters, LotEstimate, LotEstimates, LotSet, ShelfLife};
use crate::error::EstimateError;
use crate::fit::{bound, estimate, regression};

/// Estimate every lot (in insertion order) and then the lot average.
///
/// The first series that fails aborts the call; inputs are never modified.
pub fn estimate_lots(lots: &LotSet, params: &EstimationParameters) -> Result<LotEstimates, EstimateError> {
    let mut entries = Vec::with_capacity(lots.lots().len() + 1);
    for (label, is_average, values) in lots.series() {
        let estimate = estimate(lots.times(), values, params).map_err(|err| {
            warn!(series = label, error = %err, "estimation failed");
            err
        })?;
        entries.push(LotEstimate {
            label: label.to_string(),
            is_average,
            estimate,
        });
    }

    info!(
        series = entries.len(),
        limit = params.limit,
        confidence = %params.confidence_level,
        "estimated lot set"
    );
    Ok(LotEstimates { entries })
}

/// One row of a limit sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepPoint {
    pub limit: f64,
    pub shelf_life: ShelfLife,
}

/// Shelf life of one series across several acceptance limits.
///
/// The regression is fitted once; only the solve depends on the limit.
pub fn shelf_life_sweep(
    times: &[f64],
    values: &[f64],
    params: &EstimationParameters,
    limits: &[f64],
) -> Result<Vec<SweepPoint>, EstimateError> {
    let reg = regression::fit(times, values)?;
    let diag = bound::diagnostics(times, values, &reg, params.confidence_level)?;
    Ok(limits
        .iter()
        .map(|&limit| SweepPoint {
            limit,
            shelf_life: bound::solve_shelf_life(&reg, &diag, limit, params.confidence_level).0,
        })
        .collect())
}

/// Evenly spaced limits from `start` to `end` inclusive.
pub fn limit_grid(start: f64, end: f64, step: f64) -> Vec<f64> {
    if !(step > 0.0) || !start.is_finite() || !end.is_finite() || end < start {
        return vec![start];
    }
    let n = ((end - start) / step + 1e-9).floor() as usize;
    (0..=n).map(|i| start + i as f64 * step).collect()
}
