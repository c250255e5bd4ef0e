//! Frequency-dependent spectral broadening.
//!
//! [`broaden_spectrum`] takes discrete excitations (or an existing
//! histogram) plus a per-point resolution width and produces a broadened
//! histogram on a regular frequency grid. Several schemes trade accuracy
//! for speed: exact per-peak evaluation, truncated windowed summation,
//! and interpolated convolution against a geometric kernel ladder.

pub mod interpolated;
pub mod kernels;
pub mod truncated;

use crate::common::SamplingSettings;
use crate::numerics::grid;
use crate::numerics::special::ConvolveError;

pub use interpolated::{interpolated_broadening, InterpolatedInput, Spacing};
pub use truncated::{trunc_and_sum, SummationMethod, TruncatedInput, WindowKernel};

const SPACING_MATCH_TOLERANCE: f64 = 1.0e-8;

/// Broadening scheme selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// No broadening; the input is only histogrammed onto the grid.
    None,
    /// Exact Gaussian density evaluated over the whole grid per peak.
    Gaussian,
    /// Exact per-bin Gaussian mass evaluated over the whole grid per peak.
    Normal,
    /// Gaussian density over a truncated per-peak window.
    GaussianTruncated,
    /// Per-bin Gaussian mass over a truncated per-peak window.
    NormalTruncated,
    /// Kernel-ladder interpolation with sqrt(2) spacing.
    Interpolate,
    /// Kernel-ladder interpolation with factor-2 spacing.
    InterpolateCoarse,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::None => "none",
            Scheme::Gaussian => "gaussian",
            Scheme::Normal => "normal",
            Scheme::GaussianTruncated => "gaussian_truncated",
            Scheme::NormalTruncated => "normal_truncated",
            Scheme::Interpolate => "interpolate",
            Scheme::InterpolateCoarse => "interpolate_coarse",
        }
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl std::str::FromStr for Scheme {
    type Err = BroadeningError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "none" => Ok(Scheme::None),
            "gaussian" => Ok(Scheme::Gaussian),
            "normal" => Ok(Scheme::Normal),
            "gaussian_truncated" => Ok(Scheme::GaussianTruncated),
            "normal_truncated" => Ok(Scheme::NormalTruncated),
            "interpolate" => Ok(Scheme::Interpolate),
            "interpolate_coarse" => Ok(Scheme::InterpolateCoarse),
            other => Err(BroadeningError::UnknownScheme {
                value: other.to_string(),
            }),
        }
    }
}

/// Resolution width input: a single shared value or one per point.
#[derive(Debug, Clone, Copy)]
pub enum Sigma<'a> {
    Scalar(f64),
    PerPoint(&'a [f64]),
}

impl Sigma<'_> {
    fn resolve(&self, expected: usize) -> Result<Vec<f64>, BroadeningError> {
        match *self {
            Sigma::Scalar(value) => Ok(vec![value; expected]),
            Sigma::PerPoint(values) if values.len() == expected => Ok(values.to_vec()),
            Sigma::PerPoint(values) => Err(BroadeningError::SigmaLengthMismatch {
                sigma: values.len(),
                expected,
            }),
        }
    }
}

/// Input to [`broaden_spectrum`].
#[derive(Debug, Clone, Copy)]
pub struct BroadenInput<'a> {
    /// Excitation positions. `None` marks `s_dft` as an existing
    /// histogram on the midpoints of `bins`.
    pub frequencies: Option<&'a [f64]>,
    /// Output grid edges, evenly spaced and strictly increasing.
    pub bins: &'a [f64],
    /// Excitation weights (or histogram values when `frequencies` is
    /// `None`).
    pub s_dft: &'a [f64],
    /// Resolution width per excitation; the interpolated schemes resolve
    /// it per output grid point instead.
    pub sigma: Sigma<'a>,
}

impl<'a> BroadenInput<'a> {
    pub fn new(
        frequencies: Option<&'a [f64]>,
        bins: &'a [f64],
        s_dft: &'a [f64],
        sigma: Sigma<'a>,
    ) -> Self {
        Self {
            frequencies,
            bins,
            s_dft,
            sigma,
        }
    }
}

/// A broadened histogram: one intensity per midpoint of the input bins.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub freq_points: Vec<f64>,
    pub s: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BroadeningError {
    #[error(
        "unknown broadening scheme '{value}'; expected one of none, gaussian, normal, \
         gaussian_truncated, normal_truncated, interpolate, interpolate_coarse"
    )]
    UnknownScheme { value: String },
    #[error(transparent)]
    Grid(#[from] grid::GridError),
    #[error(transparent)]
    Convolve(#[from] ConvolveError),
    #[error("sigma has {sigma} entries but {expected} are required")]
    SigmaLengthMismatch { sigma: usize, expected: usize },
    #[error("intensity array has {s_dft} entries but the positions have {frequencies}")]
    IntensityLengthMismatch { s_dft: usize, frequencies: usize },
    #[error(
        "histogram input has {s_dft} entries but the grid has {points} points; \
         pass explicit frequencies for point data"
    )]
    AmbiguousFrequencies { s_dft: usize, points: usize },
    #[error("truncated kernel window of {window} points exceeds the {points}-point grid")]
    KernelWiderThanGrid { window: usize, points: usize },
    #[error("grid has {points} points but {edges} bin edges")]
    PointsBinsMismatch { points: usize, edges: usize },
    #[error("point spacing {points} does not match bin width {bins}")]
    InconsistentSpacing { points: f64, bins: f64 },
    #[error("kernel family {kernel:?} has no interpolation support")]
    UnsupportedKernelFamily { kernel: WindowKernel },
}

pub(crate) fn validate_grid_alignment(
    points: &[f64],
    bins: &[f64],
    bin_width: f64,
) -> Result<(), BroadeningError> {
    if points.len() + 1 != bins.len() {
        return Err(BroadeningError::PointsBinsMismatch {
            points: points.len(),
            edges: bins.len(),
        });
    }
    if points.len() >= 2 {
        let point_spacing = points[1] - points[0];
        if (point_spacing - bin_width).abs() > SPACING_MATCH_TOLERANCE * bin_width.abs() {
            return Err(BroadeningError::InconsistentSpacing {
                points: point_spacing,
                bins: bin_width,
            });
        }
    }
    Ok(())
}

/// Broaden a discrete spectrum onto the grid described by `input.bins`
/// with the requested scheme.
pub fn broaden_spectrum(
    input: &BroadenInput<'_>,
    scheme: Scheme,
    settings: &SamplingSettings,
) -> Result<Spectrum, BroadeningError> {
    let bin_width = grid::bin_width(input.bins)?;
    let freq_points = grid::bin_midpoints(input.bins);

    let frequencies: &[f64] = match input.frequencies {
        Some(frequencies) => frequencies,
        None => {
            if input.s_dft.len() != freq_points.len() {
                return Err(BroadeningError::AmbiguousFrequencies {
                    s_dft: input.s_dft.len(),
                    points: freq_points.len(),
                });
            }
            &freq_points
        }
    };
    if input.s_dft.len() != frequencies.len() {
        return Err(BroadeningError::IntensityLengthMismatch {
            s_dft: input.s_dft.len(),
            frequencies: frequencies.len(),
        });
    }

    // An all-zero spectrum broadens to itself under every scheme.
    if input.s_dft.iter().all(|&value| value == 0.0) {
        let s = vec![0.0; freq_points.len()];
        return Ok(Spectrum { freq_points, s });
    }

    match scheme {
        Scheme::None => {
            let s = if input.frequencies.is_none() {
                input.s_dft.to_vec()
            } else {
                grid::weighted_histogram(frequencies, input.bins, input.s_dft)?
            };
            Ok(Spectrum { freq_points, s })
        }
        Scheme::Gaussian => {
            let sigma = input.sigma.resolve(frequencies.len())?;
            Ok(full_kernel_sum(
                WindowKernel::Gaussian,
                &freq_points,
                input.bins,
                frequencies,
                input.s_dft,
                &sigma,
            ))
        }
        Scheme::Normal => {
            let sigma = input.sigma.resolve(frequencies.len())?;
            Ok(full_kernel_sum(
                WindowKernel::Normal,
                &freq_points,
                input.bins,
                frequencies,
                input.s_dft,
                &sigma,
            ))
        }
        Scheme::GaussianTruncated => {
            let sigma = input.sigma.resolve(frequencies.len())?;
            let mut spectrum = trunc_and_sum(TruncatedInput {
                kernel: WindowKernel::Gaussian,
                sigma: &sigma,
                points: &freq_points,
                bins: input.bins,
                center: frequencies,
                weights: input.s_dft,
                limit: settings.broadening_range,
                method: SummationMethod::Auto,
            })?;
            // raw-density kernel: scale to per-bin mass
            for value in &mut spectrum.s {
                *value *= bin_width;
            }
            Ok(spectrum)
        }
        Scheme::NormalTruncated => {
            let sigma = input.sigma.resolve(frequencies.len())?;
            trunc_and_sum(TruncatedInput {
                kernel: WindowKernel::Normal,
                sigma: &sigma,
                points: &freq_points,
                bins: input.bins,
                center: frequencies,
                weights: input.s_dft,
                limit: settings.broadening_range,
                method: SummationMethod::Auto,
            })
        }
        Scheme::Interpolate | Scheme::InterpolateCoarse => {
            // blending is indexed per output point, so sigma is resolved
            // against the grid rather than the excitations
            let sigma = input.sigma.resolve(freq_points.len())?;
            let spacing = if scheme == Scheme::Interpolate {
                Spacing::Sqrt2
            } else {
                Spacing::Two
            };
            interpolated_broadening(InterpolatedInput {
                kernel: WindowKernel::Gaussian,
                sigma: &sigma,
                points: &freq_points,
                bins: input.bins,
                center: frequencies,
                weights: input.s_dft,
                is_histogram: input.frequencies.is_none(),
                limit: settings.broadening_range,
                spacing,
            })
        }
    }
}

/// Exact evaluation: every excitation contributes its kernel across the
/// entire output grid.
fn full_kernel_sum(
    kernel: WindowKernel,
    freq_points: &[f64],
    bins: &[f64],
    frequencies: &[f64],
    s_dft: &[f64],
    sigma: &[f64],
) -> Spectrum {
    let mut s = vec![0.0; freq_points.len()];
    for ((&center, &weight), &width) in frequencies.iter().zip(s_dft).zip(sigma) {
        let values = match kernel {
            WindowKernel::Gaussian => kernels::mesh_gaussian(width, freq_points, center),
            WindowKernel::Normal => kernels::normal(bins, width, center),
        };
        for (slot, value) in s.iter_mut().zip(values) {
            *slot += weight * value;
        }
    }
    Spectrum {
        freq_points: freq_points.to_vec(),
        s,
    }
}
