//! Linear algebra utilities
//!
//! Small fixed-size helpers used by the information-form update: inversion
//! with a pseudo-inverse fallback, covariance validation, matrix square
//! roots for noise sampling, and angle wrapping.

use nalgebra::{Matrix2, Vector2};
use std::f64::consts::PI;

use super::errors::{EstimationError, Result};

/// Result of inverting a covariance or information matrix
#[derive(Debug, Clone, Copy)]
pub struct Inversion {
    /// The inverse (or minimal-norm pseudo-inverse)
    pub inverse: Matrix2<f64>,
    /// Ratio of largest to smallest singular value (infinite when singular)
    pub condition_number: f64,
    /// True when the SVD pseudo-inverse was used instead of Cholesky
    pub used_pseudo_inverse: bool,
}

/// Invert a symmetric positive-(semi)definite 2x2 matrix
///
/// Positive-definite input goes through a Cholesky factorization, however
/// large its condition number. The SVD pseudo-inverse is only used when the
/// matrix is numerically rank-deficient (smallest singular value at or
/// below `tolerance` times the largest, with `tolerance` floored at machine
/// epsilon) or when Cholesky fails, so a singular matrix degrades to the
/// minimal-norm solution rather than an error.
///
/// # Arguments
/// * `matrix` - Matrix to invert
/// * `tolerance` - Relative singular value cutoff (must be non-negative)
/// * `context` - Name used in error messages
pub fn invert_psd(matrix: &Matrix2<f64>, tolerance: f64, context: &str) -> Result<Inversion> {
    if !matrix.iter().all(|v| v.is_finite()) {
        return Err(EstimationError::non_finite(context));
    }

    let svd = matrix.svd(true, true);
    let (s_max, s_min) = singular_extremes(&svd.singular_values);
    let condition_number = if s_min > 0.0 { s_max / s_min } else { f64::INFINITY };
    let cutoff = tolerance.max(f64::EPSILON) * s_max;

    if s_min > cutoff {
        if let Some(chol) = matrix.cholesky() {
            let inverse = chol.inverse();
            if inverse.iter().all(|v| v.is_finite()) {
                return Ok(Inversion {
                    inverse,
                    condition_number,
                    used_pseudo_inverse: false,
                });
            }
        }
    }

    // Singular values <= cutoff are zeroed, so a zero matrix inverts to zero
    let inverse = svd
        .pseudo_inverse(cutoff)
        .map_err(|e| EstimationError::configuration(format!("{}: {}", context, e)))?;

    Ok(Inversion {
        inverse,
        condition_number,
        used_pseudo_inverse: true,
    })
}

/// Condition number (largest / smallest singular value)
///
/// Returns infinity for a singular matrix.
pub fn condition_number(matrix: &Matrix2<f64>) -> f64 {
    let (s_max, s_min) = singular_extremes(&matrix.singular_values());
    if s_min > 0.0 {
        s_max / s_min
    } else {
        f64::INFINITY
    }
}

fn singular_extremes(values: &Vector2<f64>) -> (f64, f64) {
    (values.max(), values.min())
}

/// Validate a caller-supplied covariance
///
/// Requires finite entries, symmetry within `tolerance` (relative to the
/// largest entry), and no eigenvalue below `-tolerance` times that scale.
/// Semidefinite matrices are accepted.
pub fn validate_covariance(name: &str, matrix: &Matrix2<f64>, tolerance: f64) -> Result<()> {
    if !matrix.iter().all(|v| v.is_finite()) {
        return Err(EstimationError::invalid_covariance(
            name,
            "contains NaN or infinite entries",
        ));
    }

    let scale = matrix.amax().max(1.0);
    let asymmetry = (matrix[(0, 1)] - matrix[(1, 0)]).abs();
    if asymmetry > tolerance * scale {
        return Err(EstimationError::invalid_covariance(
            name,
            format!("not symmetric (off-diagonal mismatch {:.3e})", asymmetry),
        ));
    }

    let min_eigenvalue = symmetrize(matrix).symmetric_eigenvalues().min();
    if min_eigenvalue < -tolerance * scale {
        return Err(EstimationError::invalid_covariance(
            name,
            format!("not positive semidefinite (eigenvalue {:.3e})", min_eigenvalue),
        ));
    }

    Ok(())
}

/// Matrix square root `L` with `L Lᵀ = matrix`
///
/// Uses Cholesky when the matrix is positive definite and falls back to the
/// eigendecomposition (negative eigenvalues clamped to zero) for
/// semidefinite input.
pub fn covariance_sqrt(matrix: &Matrix2<f64>) -> Matrix2<f64> {
    if let Some(chol) = matrix.cholesky() {
        return chol.l();
    }

    let eigen = symmetrize(matrix).symmetric_eigen();
    let sqrt_values = eigen.eigenvalues.map(|v| v.max(0.0).sqrt());
    eigen.eigenvectors * Matrix2::from_diagonal(&sqrt_values)
}

/// Make matrix symmetric by averaging with its transpose
#[inline]
pub fn symmetrize(matrix: &Matrix2<f64>) -> Matrix2<f64> {
    0.5 * (matrix + matrix.transpose())
}

/// Wrap an angle into `(-π, π]`
#[inline]
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI {
        wrapped + 2.0 * PI
    } else {
        wrapped
    }
}
