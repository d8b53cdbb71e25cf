//! Straight-line regression of potency against time.
//!
//! Given:
//! - time points `t_i` (months)
//! - measured values `y_i` (% of label claim)
//!
//! we solve the ordinary least squares problem for `y = β0 + β1 t` and report
//! the slope, intercept, standard error of the slope and the correlation
//! coefficient.

use nalgebra::DVector;

use crate::domain::RegressionResult;
use crate::error::EstimateError;
use crate::math::{line_design_matrix, mean, solve_least_squares, sum_cross_dev, sum_sq_dev};

/// Minimum number of points (two parameters plus one residual degree of freedom).
pub const MIN_POINTS: usize = 3;

/// Fit `values` against `times` by ordinary least squares.
///
/// # Errors
/// - `InputFormat` when the lengths differ or a value is not finite
/// - `InsufficientData` when fewer than three points are supplied
/// - `DegenerateInput` when all time points are identical
pub fn fit(times: &[f64], values: &[f64]) -> Result<RegressionResult, EstimateError> {
    validate_series(times, values)?;
    let sxx = checked_sxx(times)?;

    let t_bar = mean(times);
    let y_bar = mean(values);
    let flat = is_flat(times, values, sxx);
    let (slope, intercept) = if flat {
        (0.0, y_bar)
    } else {
        let centered_t: Vec<f64> = times.iter().map(|t| t - t_bar).collect();
        let centered_y = DVector::from_iterator(values.len(), values.iter().map(|y| y - y_bar));
        let beta = solve_least_squares(&line_design_matrix(&centered_t), &centered_y)
            .ok_or(EstimateError::DegenerateInput)?;
        let slope = beta[1];
        (slope, y_bar + beta[0] - slope * t_bar)
    };

    let se = residual_standard_error(times, values, intercept, slope);
    let stderr = se / sxx.sqrt();

    let syy = sum_sq_dev(values);
    let r_value = if !flat && syy > 0.0 {
        (sum_cross_dev(times, values) / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
    } else {
        0.0
    };

    Ok(RegressionResult {
        slope,
        intercept,
        stderr,
        r_value,
    })
}

/// True when the values carry no trend beyond rounding noise.
///
/// Centering a constant series that is not exactly representable leaves a
/// remainder near 1e-14, which the solver turns into a tiny nonzero slope.
fn is_flat(times: &[f64], values: &[f64], sxx: f64) -> bool {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if max == min {
        return true;
    }
    let scale = values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    let sxy = sum_cross_dev(times, values);
    sxy.abs() <= f64::EPSILON * values.len() as f64 * scale * sxx.sqrt()
}

/// Residual standard error `sqrt(SSE / (n - 2))` of a line through the data.
pub fn residual_standard_error(times: &[f64], values: &[f64], intercept: f64, slope: f64) -> f64 {
    let sse: f64 = times
        .iter()
        .zip(values)
        .map(|(t, y)| {
            let r = y - (intercept + slope * t);
            r * r
        })
        .sum();
    (sse / (times.len() as f64 - 2.0)).sqrt()
}

/// Length, count and finiteness checks shared by fit and bound.
pub(crate) fn validate_series(times: &[f64], values: &[f64]) -> Result<(), EstimateError> {
    if times.len() != values.len() {
        return Err(EstimateError::input_format(
            "values",
            format!(
                "expected {} values (one per time point), got {}",
                times.len(),
                values.len()
            ),
        ));
    }
    if times.len() < MIN_POINTS {
        return Err(EstimateError::InsufficientData { n: times.len() });
    }
    if times.iter().any(|t| !t.is_finite()) {
        return Err(EstimateError::input_format("times", "all time points must be finite"));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(EstimateError::input_format("values", "all values must be finite"));
    }
    Ok(())
}

/// `Σ(t - t̄)²`, rejecting a (numerically) constant time axis.
pub(crate) fn checked_sxx(times: &[f64]) -> Result<f64, EstimateError> {
    let sxx = sum_sq_dev(times);
    let m = mean(times);
    let scale = (m * m).max(1.0) * times.len() as f64;
    if !(sxx > f64::EPSILON * scale) {
        return Err(EstimateError::DegenerateInput);
    }
    Ok(sxx)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Closed-form OLS for comparison.
    fn reference(times: &[f64], values: &[f64]) -> (f64, f64) {
        let slope = sum_cross_dev(times, values) / sum_sq_dev(times);
        (mean(values) - slope * mean(times), slope)
    }

    fn sse(times: &[f64], values: &[f64], intercept: f64, slope: f64) -> f64 {
        times
            .iter()
            .zip(values)
            .map(|(t, y)| (y - intercept - slope * t).powi(2))
            .sum()
    }

    #[test]
    fn fit_matches_hand_computation() {
        let times = [0.0, 3.0, 6.0, 9.0, 12.0];
        let values = [98.0, 97.0, 96.0, 95.0, 95.0];
        let reg = fit(&times, &values).unwrap();

        assert!((reg.slope - (-24.0 / 90.0)).abs() < 1e-10);
        assert!((reg.intercept - 97.8).abs() < 1e-10);
        // se = sqrt(0.4 / 3), stderr = se / sqrt(90)
        let se = (0.4f64 / 3.0).sqrt();
        assert!((reg.stderr - se / 90f64.sqrt()).abs() < 1e-10);
        assert!(reg.r_value < -0.9 && reg.r_value >= -1.0);
    }

    #[test]
    fn fit_minimizes_squared_residuals() {
        let times = [0.0, 3.0, 6.0, 9.0, 12.0, 18.0, 24.0, 36.0];
        let values = [100.0, 98.1, 96.2, 95.8, 94.7, 92.3, 90.1, 88.4];
        let reg = fit(&times, &values).unwrap();

        let (a, b) = reference(&times, &values);
        assert!((reg.intercept - a).abs() < 1e-8);
        assert!((reg.slope - b).abs() < 1e-10);

        let best = sse(&times, &values, reg.intercept, reg.slope);
        for (da, db) in [(0.01, 0.0), (-0.01, 0.0), (0.0, 1e-3), (0.0, -1e-3), (0.05, -2e-3)] {
            assert!(best < sse(&times, &values, reg.intercept + da, reg.slope + db));
        }
    }

    #[test]
    fn flat_series_has_zero_slope_and_correlation() {
        let reg = fit(&[0.0, 3.0, 6.0, 9.0], &[99.0, 99.0, 99.0, 99.0]).unwrap();
        assert!(reg.slope.abs() < 1e-12);
        assert_eq!(reg.r_value, 0.0);
        assert!(reg.stderr.abs() < 1e-12);
    }

    #[test]
    fn inexact_flat_levels_have_exact_zero_slope() {
        let times = [0.0, 3.0, 6.0, 9.0, 12.0, 18.0, 24.0, 36.0];
        for i in 0..200 {
            let level = 80.0 + i as f64 * 0.1;
            let values = [level; 8];
            let reg = fit(&times, &values).unwrap();
            assert_eq!(reg.slope, 0.0, "level {level}");
            assert_eq!(reg.intercept, mean(&values));
        }
    }

    #[test]
    fn small_real_trend_is_kept() {
        let times = [0.0, 3.0, 6.0, 9.0];
        let reg = fit(&times, &[99.0, 98.999, 98.998, 98.997]).unwrap();
        assert!(reg.slope < 0.0);
    }

    #[test]
    fn two_points_are_insufficient() {
        let err = fit(&[0.0, 3.0], &[100.0, 99.0]).unwrap_err();
        assert_eq!(err, EstimateError::InsufficientData { n: 2 });
    }

    #[test]
    fn identical_times_are_degenerate() {
        let err = fit(&[6.0, 6.0, 6.0], &[100.0, 99.0, 98.0]).unwrap_err();
        assert_eq!(err, EstimateError::DegenerateInput);
    }

    #[test]
    fn mismatched_lengths_name_values_field() {
        let err = fit(&[0.0, 3.0, 6.0], &[100.0, 99.0]).unwrap_err();
        assert!(matches!(err, EstimateError::InputFormat { ref field, .. } if field == "values"));
    }
}
