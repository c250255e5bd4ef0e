//! Normalized broadening kernel evaluators.
//!
//! Three forms of the Gaussian resolution kernel: the raw probability
//! density, the density pre-scaled by the sample spacing (so that a sum
//! over samples approximates the integral), and the exact per-bin
//! probability mass obtained by differencing the CDF at the bin edges.
//!
//! None of these guard against `sigma == 0`: the density forms divide by
//! sigma and produce non-finite values. The surrounding pipeline has
//! always relied on that behavior, so it is preserved rather than
//! clamped; the test module flags it as a known degeneracy.

use crate::numerics::special::erf;
use std::f64::consts::{PI, SQRT_2};

/// Gaussian probability density of width `sigma` around `center`,
/// evaluated at each entry of `points`.
pub fn gaussian(sigma: f64, points: &[f64], center: f64) -> Vec<f64> {
    let norm = 1.0 / (sigma * (2.0 * PI).sqrt());
    let two_sigma_sq = 2.0 * sigma * sigma;
    points
        .iter()
        .map(|&point| {
            let offset = point - center;
            norm * (-(offset * offset) / two_sigma_sq).exp()
        })
        .collect()
}

/// Gaussian density scaled by the sample spacing `points[1] - points[0]`,
/// suitable for summing directly onto a histogram.
///
/// Fewer than 2 points leave the spacing undefined; the result is then
/// all zeros rather than an error.
pub fn mesh_gaussian(sigma: f64, points: &[f64], center: f64) -> Vec<f64> {
    if points.len() < 2 {
        return vec![0.0; points.len()];
    }
    let spacing = points[1] - points[0];
    let mut values = gaussian(sigma, points, center);
    for value in &mut values {
        *value *= spacing;
    }
    values
}

/// Exact Gaussian probability mass per bin, from the CDF differenced at
/// consecutive edges; length is `bins.len() - 1`.
pub fn normal(bins: &[f64], sigma: f64, center: f64) -> Vec<f64> {
    let scale = SQRT_2 * sigma;
    let edge_values: Vec<f64> = bins.iter().map(|&edge| erf((center - edge) / scale)).collect();
    edge_values
        .windows(2)
        .map(|pair| 0.5 * (pair[0] - pair[1]))
        .collect()
}
