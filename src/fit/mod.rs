//! Shelf-life estimation.
//!
//! Responsibilities:
//!
//! - fit a straight line to one series (`regression`)
//! - build the confidence band and solve for the limit crossing (`bound`)
//! - apply both to every lot and the lot average (`lots`)

use tracing::debug;

use crate::domain::{EstimationParameters, ShelfLifeEstimate, TimeSeries};
use crate::error::EstimateError;

pub mod bound;
pub mod lots;
pub mod regression;

pub use bound::*;
pub use lots::*;
pub use regression::*;

/// Estimate the shelf life of a single series.
pub fn estimate(
    times: &[f64],
    values: &[f64],
    params: &EstimationParameters,
) -> Result<ShelfLifeEstimate, EstimateError> {
    let regression = fit(times, values)?;
    let outcome = bound_and_solve(times, values, &regression, params.limit, params.confidence_level)?;

    debug!(
        slope = regression.slope,
        intercept = regression.intercept,
        r = regression.r_value,
        se = outcome.diagnostics.residual_se,
        t_crit = outcome.diagnostics.t_critical,
        shelf_life = outcome.shelf_life.as_months(),
        "estimated series"
    );

    Ok(ShelfLifeEstimate {
        regression,
        predicted: outcome.predicted,
        confidence_band: Some(outcome.band),
        shelf_life: outcome.shelf_life,
        note: outcome.note,
        diagnostics: outcome.diagnostics,
    })
}

impl TimeSeries {
    /// Convenience wrapper around [`estimate`].
    pub fn estimate(&self, params: &EstimationParameters) -> Result<ShelfLifeEstimate, EstimateError> {
        estimate(&self.times, &self.values, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConfidenceLevel, ShelfLife};

    #[test]
    fn refitting_predictions_gives_zero_width_band() {
        let params = EstimationParameters {
            limit: 90.0,
            confidence_level: ConfidenceLevel::P95,
        };
        let series = TimeSeries::new(
            vec![0.0, 3.0, 6.0, 9.0, 12.0, 18.0],
            vec![100.0, 98.6, 97.9, 96.1, 95.8, 93.0],
        );
        let first = series.estimate(&params).unwrap();

        let refit = estimate(&series.times, &first.predicted, &params).unwrap();
        assert!(refit.regression.stderr.abs() < 1e-9);
        let band = refit.confidence_band.unwrap();
        for (u, l) in band.upper.iter().zip(&band.lower) {
            assert!((u - l).abs() < 1e-8);
        }
        assert!((refit.regression.slope - first.regression.slope).abs() < 1e-10);
    }

    #[test]
    fn estimate_reports_finite_months_for_degrading_series() {
        let params = EstimationParameters {
            limit: 90.0,
            confidence_level: ConfidenceLevel::P90,
        };
        let est = estimate(
            &[0.0, 3.0, 6.0, 9.0, 12.0, 18.0, 24.0, 36.0],
            &[100.0, 98.1, 96.2, 95.8, 94.7, 92.3, 90.1, 88.4],
            &params,
        )
        .unwrap();
        match est.shelf_life {
            ShelfLife::Months(t) => assert!(t > 0.0 && t.is_finite()),
            other => panic!("expected months, got {other:?}"),
        }
        assert!(est.note.contains("90%"));
    }
}
