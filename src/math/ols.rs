//! Linear least-squares primitives used by the nonlinear solver.
//!
//! Each Levenberg–Marquardt iteration solves a small damped linear problem
//!
//! ```text
//! minimize ||J·δ + r||² + λ·||D·δ||²
//! ```
//!
//! Implementation choices:
//! - The damped problem is written as an augmented ordinary least-squares
//!   system `[J·D⁻¹; √λ·I]·(D·δ) = [-r; 0]` and solved by SVD, which stays
//!   stable when parameter scales differ by many orders of magnitude
//!   (frequencies in Hz next to phases in radians).
//! - Covariance uses the SVD pseudo-inverse of `JᵀJ` so a rank-deficient
//!   Jacobian yields `None` instead of garbage.

use nalgebra::{DMatrix, DVector};

/// Iteration cap for every SVD; nalgebra's default (0) means "until convergence".
const SVD_MAX_ITER: usize = 1000;

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is non-finite, too ill-conditioned to solve
/// robustly, or the SVD does not converge.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if !(x.iter().all(|v| v.is_finite()) && y.iter().all(|v| v.is_finite())) {
        return None;
    }
    let svd = x.clone().try_svd(true, true, f64::EPSILON, SVD_MAX_ITER)?;

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-14, 1e-12, 1e-10] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Column norms of `J`, used as Marquardt scaling. Zero columns map to `1`.
pub fn column_scales(jac: &DMatrix<f64>) -> DVector<f64> {
    DVector::from_iterator(
        jac.ncols(),
        jac.column_iter().map(|c| {
            let n = c.norm();
            if n > 0.0 && n.is_finite() { n } else { 1.0 }
        }),
    )
}

/// Solve the damped step `(JᵀJ + λ·D²)·δ = -Jᵀr`.
pub fn damped_step(
    jac: &DMatrix<f64>,
    residuals: &DVector<f64>,
    scales: &DVector<f64>,
    lambda: f64,
) -> Option<DVector<f64>> {
    let m = jac.nrows();
    let k = jac.ncols();
    let sqrt_lambda = lambda.max(0.0).sqrt();

    let mut a = DMatrix::<f64>::zeros(m + k, k);
    let mut b = DVector::<f64>::zeros(m + k);
    for j in 0..k {
        let d = scales[j];
        for i in 0..m {
            a[(i, j)] = jac[(i, j)] / d;
        }
        a[(m + j, j)] = sqrt_lambda;
    }
    for i in 0..m {
        b[i] = -residuals[i];
    }

    let scaled = solve_least_squares(&a, &b)?;
    Some(scaled.component_div(scales))
}

/// Unscaled covariance estimate `(JᵀJ)⁻¹`.
///
/// Computed on the column-normalized Jacobian and scaled back, so parameters
/// of very different magnitude do not destroy the conditioning. Returns
/// `None` when `JᵀJ` is rank-deficient or the result is not a valid
/// covariance (non-finite or negative variances).
pub fn normal_covariance(jac: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    let k = jac.ncols();
    if k == 0 || jac.nrows() < k {
        return None;
    }
    let scales = column_scales(jac);
    let mut js = jac.clone();
    for (j, mut col) in js.column_iter_mut().enumerate() {
        col /= scales[j];
    }

    if !js.iter().all(|v| v.is_finite()) {
        return None;
    }
    let svd = (js.transpose() * &js).try_svd(true, true, f64::EPSILON, SVD_MAX_ITER)?;
    let s_max = svd.singular_values.iter().cloned().fold(0.0_f64, f64::max);
    if !(s_max > 0.0 && s_max.is_finite()) {
        return None;
    }
    let eps = s_max * 1e-13;
    if svd.rank(eps) < k {
        return None;
    }
    let cov_scaled = svd.pseudo_inverse(eps).ok()?;

    let mut cov = cov_scaled;
    for i in 0..k {
        for j in 0..k {
            cov[(i, j)] /= scales[i] * scales[j];
        }
    }
    let valid = cov.iter().all(|v| v.is_finite()) && (0..k).all(|i| cov[(i, i)] >= 0.0);
    valid.then_some(cov)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn undamped_step_is_gauss_newton() {
        // Residual r = J·p - y at p = 0 is -y; the Gauss-Newton step recovers p.
        let jac = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let r = DVector::from_row_slice(&[-2.0, -5.0, -8.0]);
        let scales = column_scales(&jac);
        let step = damped_step(&jac, &r, &scales, 0.0).unwrap();
        assert!((step[0] - 2.0).abs() < 1e-10);
        assert!((step[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn damping_shrinks_the_step() {
        let jac = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let r = DVector::from_row_slice(&[-2.0, -5.0, -8.0]);
        let scales = column_scales(&jac);
        let free = damped_step(&jac, &r, &scales, 0.0).unwrap();
        let damped = damped_step(&jac, &r, &scales, 100.0).unwrap();
        assert!(damped.norm() < free.norm());
    }

    #[test]
    fn non_finite_design_is_not_solved() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, f64::INFINITY, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);
        assert!(solve_least_squares(&x, &y).is_none());

        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, f64::NAN, 8.0]);
        assert!(solve_least_squares(&x, &y).is_none());
    }

    #[test]
    fn covariance_of_identity_design() {
        let jac = DMatrix::<f64>::identity(2, 2);
        let cov = normal_covariance(&jac).unwrap();
        assert!((cov[(0, 0)] - 1.0).abs() < 1e-12);
        assert!(cov[(0, 1)].abs() < 1e-12);
    }

    #[test]
    fn covariance_of_collinear_columns_is_none() {
        let jac = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 2.0, 4.0, 3.0, 6.0]);
        assert!(normal_covariance(&jac).is_none());
    }
}
