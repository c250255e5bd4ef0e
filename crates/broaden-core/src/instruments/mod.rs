//! Instrument resolution models.
//!
//! Each model turns energy transfers into Gaussian resolution widths for
//! its spectrometer geometry; the shared
//! [`ResolutionModel::convolve_with_resolution_function`] then picks a
//! broadening scheme, pre-bins dense input when worthwhile, and hands
//! off to the broadening dispatcher.

pub mod direct;
pub mod ideal;
pub mod tosca;

use crate::broadening::{
    broaden_spectrum, BroadenInput, BroadeningError, Scheme, Sigma, Spectrum,
};
use crate::common::constants::K_SQUARED_PER_WAVENUMBER;
use crate::common::SamplingSettings;
use crate::numerics::grid::{self, GridError};
use crate::numerics::special::PolyfitError;

pub use direct::DirectGeometryChopper;
pub use ideal::IdealTwoDMap;
pub use tosca::ToscaLike;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InstrumentError {
    #[error("incident energy is not set on instrument '{instrument}'")]
    IncidentEnergyNotSet { instrument: &'static str },
    #[error("incident energy must be a positive finite wavenumber, got {value}")]
    InvalidIncidentEnergy { value: f64 },
    #[error("unknown chopper setting '{setting}'; available settings: {available}")]
    UnknownSetting { setting: String, available: String },
    #[error(transparent)]
    ResolutionFit(#[from] PolyfitError),
    #[error(transparent)]
    Broadening(#[from] BroadeningError),
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Scheme selection for a resolution convolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeChoice {
    /// Pick truncated summation for small inputs, interpolation for
    /// large ones, using the sampling settings' point threshold.
    Auto,
    Fixed(Scheme),
}

/// Detector angular coverage in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleRange {
    pub min_deg: f64,
    pub max_deg: f64,
}

/// Momentum transfer squared (1/angstrom^2) from the powder-averaged
/// cosine law, with both energies in wavenumbers.
pub(crate) fn q_powder_cosine_law(
    incident_energy: f64,
    final_energy: f64,
    cos_scattering_angle: f64,
) -> f64 {
    let k2_i = incident_energy * K_SQUARED_PER_WAVENUMBER;
    let k2_f = final_energy * K_SQUARED_PER_WAVENUMBER;
    k2_i + k2_f - 2.0 * (k2_i * k2_f).sqrt() * cos_scattering_angle
}

pub trait ResolutionModel {
    fn name(&self) -> &'static str;

    /// Preferred scheme selection for this instrument's typical spectra.
    fn sampling(&self) -> SchemeChoice {
        SchemeChoice::Auto
    }

    /// Gaussian resolution sigma for each energy transfer, in the same
    /// units as the frequencies.
    fn calculate_sigma(&self, frequencies: &[f64]) -> Result<Vec<f64>, InstrumentError>;

    /// Broaden a discrete spectrum with this instrument's resolution.
    ///
    /// The interpolated schemes always work on a histogram, so dense
    /// point data is binned onto the grid first; the other schemes
    /// pre-bin only when the input is much denser than the grid.
    fn convolve_with_resolution_function(
        &self,
        frequencies: &[f64],
        bins: &[f64],
        s_dft: &[f64],
        choice: SchemeChoice,
        settings: &SamplingSettings,
    ) -> Result<Spectrum, InstrumentError> {
        let scheme = match choice {
            SchemeChoice::Fixed(scheme) => scheme,
            SchemeChoice::Auto => {
                if frequencies.len() >= settings.auto_scheme_point_threshold {
                    Scheme::Interpolate
                } else {
                    Scheme::GaussianTruncated
                }
            }
        };
        tracing::debug!(
            instrument = self.name(),
            scheme = %scheme,
            points = frequencies.len(),
            "resolved broadening scheme"
        );

        let bin_count = bins.len().saturating_sub(1);
        let prebin = matches!(scheme, Scheme::Interpolate | Scheme::InterpolateCoarse)
            || frequencies.len() as f64 > settings.prebin_input_ratio * bin_count as f64;

        if prebin {
            let histogram = grid::weighted_histogram(frequencies, bins, s_dft)?;
            let freq_points = grid::bin_midpoints(bins);
            tracing::debug!(
                instrument = self.name(),
                input_points = frequencies.len(),
                grid_points = freq_points.len(),
                "pre-binned input onto the output grid"
            );
            let sigma = self.calculate_sigma(&freq_points)?;
            let input = BroadenInput::new(None, bins, &histogram, Sigma::PerPoint(&sigma));
            Ok(broaden_spectrum(&input, scheme, settings)?)
        } else {
            let sigma = self.calculate_sigma(frequencies)?;
            let input =
                BroadenInput::new(Some(frequencies), bins, s_dft, Sigma::PerPoint(&sigma));
            Ok(broaden_spectrum(&input, scheme, settings)?)
        }
    }
}
