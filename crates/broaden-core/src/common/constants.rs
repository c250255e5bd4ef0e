//! Physical constants for neutron kinematics and kernel width conversions.
//!
//! Energies throughout the crate are wavenumbers (cm^-1); momentum
//! transfer is reported as Q^2 in inverse square Angstroms.

/// One wavenumber (cm^-1) of energy in joules.
pub const CM1_IN_J: f64 = 1.986_445_857e-23;

/// Neutron rest mass in kg (CODATA 2018).
pub const NEUTRON_MASS_KG: f64 = 1.674_927_498_04e-27;

/// Reduced Planck constant in J*s.
pub const HBAR: f64 = 1.054_571_817e-34;

/// Squared neutron wavevector in 1/Angstrom^2 per wavenumber of kinetic
/// energy: k^2 = 2 m E / hbar^2.
pub const K_SQUARED_PER_WAVENUMBER: f64 =
    2.0 * NEUTRON_MASS_KG * CM1_IN_J / (HBAR * HBAR) * 1.0e-20;

/// Full width at half maximum of a unit-sigma Gaussian, 2*sqrt(2*ln 2).
pub const SIGMA_TO_FWHM: f64 = 2.354_820_045_030_949;
