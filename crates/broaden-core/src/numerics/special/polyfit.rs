//! Least-squares polynomial fitting over `faer` dense storage.
//!
//! The normal equations are assembled into a small `Mat<f64>` and solved
//! with partial-pivot Gaussian elimination. Callers are expected to fit
//! in a scaled abscissa (order unity) to keep the system well
//! conditioned; the resolution models fit in reduced energy transfer.

use super::DenseMatrix;

const SINGULAR_PIVOT_RELATIVE_EPSILON: f64 = 1.0e-13;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolyfitError {
    #[error("polynomial fit length mismatch: x={x}, y={y}")]
    LengthMismatch { x: usize, y: usize },
    #[error("polynomial fit of degree {degree} needs at least {needed} points, got {actual}")]
    NotEnoughPoints {
        degree: usize,
        needed: usize,
        actual: usize,
    },
    #[error("normal equations are singular at pivot index {pivot_index}")]
    SingularSystem { pivot_index: usize },
}

/// Least-squares fit of `y ~ c[0]*x^degree + ... + c[degree]`.
///
/// Coefficients are returned highest power first, matching [`polyval`].
pub fn polyfit(x: &[f64], y: &[f64], degree: usize) -> Result<Vec<f64>, PolyfitError> {
    if x.len() != y.len() {
        return Err(PolyfitError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    let terms = degree + 1;
    if x.len() < terms {
        return Err(PolyfitError::NotEnoughPoints {
            degree,
            needed: terms,
            actual: x.len(),
        });
    }

    // A^T A c = A^T y with A the Vandermonde matrix, columns ordered to
    // match the polyval coefficient convention.
    let mut normal = DenseMatrix::zeros(terms, terms);
    let mut rhs = vec![0.0; terms];
    let mut powers = vec![0.0; terms];
    for (&xi, &yi) in x.iter().zip(y) {
        powers[terms - 1] = 1.0;
        for p in (0..terms - 1).rev() {
            powers[p] = powers[p + 1] * xi;
        }
        for row in 0..terms {
            for col in 0..terms {
                normal[(row, col)] += powers[row] * powers[col];
            }
            rhs[row] += powers[row] * yi;
        }
    }

    solve_in_place(normal, rhs)
}

/// Horner evaluation of a polynomial with coefficients highest power first.
pub fn polyval(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().fold(0.0, |acc, &c| acc * x + c)
}

fn solve_in_place(mut matrix: DenseMatrix, mut rhs: Vec<f64>) -> Result<Vec<f64>, PolyfitError> {
    let dimension = rhs.len();
    let pivot_floor = SINGULAR_PIVOT_RELATIVE_EPSILON * infinity_norm(&matrix).max(f64::MIN_POSITIVE);

    for pivot_col in 0..dimension {
        let mut pivot_row = pivot_col;
        let mut pivot_magnitude = matrix[(pivot_col, pivot_col)].abs();
        for row in (pivot_col + 1)..dimension {
            let magnitude = matrix[(row, pivot_col)].abs();
            if magnitude > pivot_magnitude {
                pivot_magnitude = magnitude;
                pivot_row = row;
            }
        }
        if pivot_magnitude <= pivot_floor {
            return Err(PolyfitError::SingularSystem {
                pivot_index: pivot_col,
            });
        }

        if pivot_row != pivot_col {
            for col in 0..dimension {
                let value = matrix[(pivot_col, col)];
                matrix[(pivot_col, col)] = matrix[(pivot_row, col)];
                matrix[(pivot_row, col)] = value;
            }
            rhs.swap(pivot_col, pivot_row);
        }

        let pivot = matrix[(pivot_col, pivot_col)];
        for row in (pivot_col + 1)..dimension {
            let multiplier = matrix[(row, pivot_col)] / pivot;
            if multiplier == 0.0 {
                continue;
            }
            for col in pivot_col..dimension {
                let updated = matrix[(row, col)] - multiplier * matrix[(pivot_col, col)];
                matrix[(row, col)] = updated;
            }
            rhs[row] -= multiplier * rhs[pivot_col];
        }
    }

    let mut solution = vec![0.0; dimension];
    for row in (0..dimension).rev() {
        let mut value = rhs[row];
        for col in (row + 1)..dimension {
            value -= matrix[(row, col)] * solution[col];
        }
        solution[row] = value / matrix[(row, row)];
    }

    Ok(solution)
}

fn infinity_norm(matrix: &DenseMatrix) -> f64 {
    let mut best_row_sum: f64 = 0.0;
    for row in 0..matrix.nrows() {
        let mut row_sum = 0.0;
        for col in 0..matrix.ncols() {
            row_sum += matrix[(row, col)].abs();
        }
        best_row_sum = best_row_sum.max(row_sum);
    }
    best_row_sum
}

#[cfg(test)]
mod tests {
    use super::{polyfit, polyval, PolyfitError};

    #[test]
    fn polyval_evaluates_highest_power_first() {
        // 2x^2 - 3x + 1
        let coefficients = [2.0, -3.0, 1.0];
        assert_eq!(polyval(&coefficients, 0.0), 1.0);
        assert_eq!(polyval(&coefficients, 1.0), 0.0);
        assert_eq!(polyval(&coefficients, 2.0), 3.0);
        assert_eq!(polyval(&[], 5.0), 0.0);
    }

    #[test]
    fn exact_quadratic_is_recovered() {
        let x: Vec<f64> = (0..12).map(|i| -1.0 + i as f64 * 0.2).collect();
        let y: Vec<f64> = x.iter().map(|&v| 0.5 * v * v - 1.25 * v + 4.0).collect();

        let coefficients = polyfit(&x, &y, 2).expect("quadratic fit");
        let expected = [0.5, -1.25, 4.0];
        for (index, (c, e)) in coefficients.iter().zip(&expected).enumerate() {
            assert!(
                (c - e).abs() <= 1.0e-10,
                "coefficient {index}: got {c}, expected {e}"
            );
        }
    }

    #[test]
    fn overdetermined_noiseless_quartic_is_recovered() {
        let x: Vec<f64> = (0..50).map(|i| i as f64 / 49.0).collect();
        let expected = [1.5, -2.0, 0.75, 0.3, -0.1];
        let y: Vec<f64> = x.iter().map(|&v| polyval(&expected, v)).collect();

        let coefficients = polyfit(&x, &y, 4).expect("quartic fit");
        for (index, (c, e)) in coefficients.iter().zip(&expected).enumerate() {
            assert!(
                (c - e).abs() <= 1.0e-8,
                "coefficient {index}: got {c}, expected {e}"
            );
        }
    }

    #[test]
    fn too_few_points_are_rejected() {
        let error = polyfit(&[0.0, 1.0], &[1.0, 2.0], 2).expect_err("underdetermined fit");
        assert_eq!(
            error,
            PolyfitError::NotEnoughPoints {
                degree: 2,
                needed: 3,
                actual: 2,
            }
        );
    }

    #[test]
    fn mismatched_inputs_are_rejected() {
        let error = polyfit(&[0.0, 1.0, 2.0], &[1.0], 1).expect_err("length mismatch");
        assert_eq!(error, PolyfitError::LengthMismatch { x: 3, y: 1 });
    }

    #[test]
    fn degenerate_abscissa_is_reported_singular() {
        let x = [2.0; 6];
        let y = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let error = polyfit(&x, &y, 1).expect_err("rank-deficient fit");
        assert!(matches!(error, PolyfitError::SingularSystem { .. }));
    }
}
