//! Summary statistics and the Student-t critical value.

use statrs::distribution::{ContinuousCDF, StudentsT};

/// Arithmetic mean (NaN for an empty slice).
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sum of squared deviations from the mean, `Σ(x - x̄)²`.
pub fn sum_sq_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum()
}

/// Cross deviation sum `Σ(x - x̄)(y - ȳ)`.
pub fn sum_cross_dev(x: &[f64], y: &[f64]) -> f64 {
    let mx = mean(x);
    let my = mean(y);
    x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum()
}

/// Student's t quantile at probability `p` with `df` degrees of freedom.
///
/// Returns `None` when `df` is not a positive finite number.
pub fn t_quantile(p: f64, df: f64) -> Option<f64> {
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    let q = dist.inverse_cdf(p);
    q.is_finite().then_some(q)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deviation_sums() {
        let t = [0.0, 3.0, 6.0, 9.0, 12.0];
        let y = [98.0, 97.0, 96.0, 95.0, 95.0];
        assert!((mean(&t) - 6.0).abs() < 1e-12);
        assert!((sum_sq_dev(&t) - 90.0).abs() < 1e-12);
        assert!((sum_cross_dev(&t, &y) + 24.0).abs() < 1e-12);
    }

    #[test]
    fn t_quantile_matches_tables() {
        // Two-sided 95% with 3 df and 90% with 6 df.
        assert!((t_quantile(0.975, 3.0).unwrap() - 3.182446).abs() < 1e-4);
        assert!((t_quantile(0.95, 6.0).unwrap() - 1.943180).abs() < 1e-4);
    }

    #[test]
    fn t_quantile_rejects_zero_df() {
        assert!(t_quantile(0.975, 0.0).is_none());
    }
}
