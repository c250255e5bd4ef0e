pub mod grid;
pub mod special;

pub use grid::{bin_midpoints, bin_width, weighted_histogram, GridError};
pub use special::{
    convolve_same, erf, erfc, polyfit, polyval, ConvolveError, DenseMatrix, PolyfitError,
};
