pub mod convolution;
pub mod erf;
pub mod polyfit;

pub use convolution::{convolve_same, ConvolveError};
pub use erf::{erf, erfc};
pub use polyfit::{polyfit, polyval, PolyfitError};

use faer::Mat;

pub type DenseMatrix = Mat<f64>;
