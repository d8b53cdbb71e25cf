//! Least squares solver.
//!
//! The estimator solves a straight-line regression problem:
//!
//! ```text
//! minimize Σ (y_i - (β0 + β1 t_i))^2
//! ```
//!
//! Implementation choices:
//! - The design matrix has a constant column followed by the time column.
//! - We use SVD so tall (more rows than columns) systems solve robustly.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)

use nalgebra::{DMatrix, DVector};

/// Build the `[1, t]` design matrix for a straight line.
pub fn line_design_matrix(times: &[f64]) -> DMatrix<f64> {
    DMatrix::from_fn(times.len(), 2, |row, col| if col == 0 { 1.0 } else { times[row] })
}

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = line_design_matrix(&[0.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn design_matrix_has_constant_then_time_column() {
        let x = line_design_matrix(&[0.0, 3.0, 6.0]);
        assert_eq!(x.shape(), (3, 2));
        assert_eq!(x[(1, 0)], 1.0);
        assert_eq!(x[(2, 1)], 6.0);
    }
}
