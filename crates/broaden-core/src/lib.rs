//! Spectral broadening for neutron-scattering data reduction.
//!
//! The crate turns discrete excitation spectra into histograms broadened
//! by a frequency-dependent Gaussian resolution. The pieces:
//!
//! - [`broadening`]: kernel evaluators and the [`broadening::broaden_spectrum`]
//!   dispatcher with its exact, truncated, and interpolated schemes.
//! - [`instruments`]: resolution models for indirect-geometry,
//!   direct-geometry chopper, and idealized 2D-map spectrometers, plus
//!   the shared resolution-convolution entry point.
//! - [`numerics`]: the grid, convolution, and polynomial-fit helpers the
//!   schemes are built on.
//! - [`common`]: physical constants and the JSON-backed settings blocks.

pub mod broadening;
pub mod common;
pub mod instruments;
pub mod numerics;

pub use broadening::{
    broaden_spectrum, BroadenInput, BroadeningError, Scheme, Sigma, Spectrum,
};
pub use common::{load_settings, SamplingSettings, Settings, SettingsError};
pub use instruments::{
    DirectGeometryChopper, IdealTwoDMap, InstrumentError, ResolutionModel, SchemeChoice,
    ToscaLike,
};
