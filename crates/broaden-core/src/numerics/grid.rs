//! Regular frequency-grid helpers: bin geometry checks, midpoints, and
//! weighted histogramming of point data onto the grid.
//!
//! The broadening algorithms locate kernel windows by index arithmetic,
//! so they only operate on evenly spaced bin edges; [`bin_width`] is the
//! shared gatekeeper for that invariant.

const SPACING_RELATIVE_TOLERANCE: f64 = 1.0e-8;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    #[error("a bin grid needs at least 2 edges, got {actual}")]
    TooFewEdges { actual: usize },
    #[error("bin edges must be strictly increasing at index {index}: {previous} -> {current}")]
    NonIncreasingEdges {
        index: usize,
        previous: f64,
        current: f64,
    },
    #[error("bin edges must be evenly spaced: step {index} is {actual}, expected {expected}")]
    UnevenSpacing {
        index: usize,
        expected: f64,
        actual: f64,
    },
    #[error("weights length {weights} does not match values length {values}")]
    WeightLengthMismatch { values: usize, weights: usize },
}

/// Common bin width of an evenly spaced, strictly increasing edge grid.
pub fn bin_width(bins: &[f64]) -> Result<f64, GridError> {
    if bins.len() < 2 {
        return Err(GridError::TooFewEdges { actual: bins.len() });
    }

    let width = bins[1] - bins[0];
    for index in 1..bins.len() {
        let previous = bins[index - 1];
        let current = bins[index];
        let step = current - previous;
        if step <= 0.0 {
            return Err(GridError::NonIncreasingEdges {
                index,
                previous,
                current,
            });
        }
        if (step - width).abs() > SPACING_RELATIVE_TOLERANCE * width.abs().max(1.0) {
            return Err(GridError::UnevenSpacing {
                index,
                expected: width,
                actual: step,
            });
        }
    }

    Ok(width)
}

/// Midpoints of consecutive bin edges; length is `bins.len() - 1`.
pub fn bin_midpoints(bins: &[f64]) -> Vec<f64> {
    bins.windows(2).map(|pair| 0.5 * (pair[0] + pair[1])).collect()
}

/// Weighted histogram of `values` on the regular grid `bins`.
///
/// Values outside the edges are dropped; the last bin is closed on the
/// right, following the host-library convention.
pub fn weighted_histogram(
    values: &[f64],
    bins: &[f64],
    weights: &[f64],
) -> Result<Vec<f64>, GridError> {
    if values.len() != weights.len() {
        return Err(GridError::WeightLengthMismatch {
            values: values.len(),
            weights: weights.len(),
        });
    }
    let width = bin_width(bins)?;
    let bin_count = bins.len() - 1;

    let mut histogram = vec![0.0; bin_count];
    for (&value, &weight) in values.iter().zip(weights) {
        if value < bins[0] || value > bins[bin_count] {
            continue;
        }
        // division-based lookup, not edge comparison: a value exactly on
        // an interior edge can land one bin low when the width is not
        // exactly representable. The broadening paths only histogram
        // bin midpoints, which sit well clear of the edges.
        let mut index = ((value - bins[0]) / width).floor() as usize;
        if index >= bin_count {
            index = bin_count - 1;
        }
        histogram[index] += weight;
    }

    Ok(histogram)
}
