//! Direct-geometry chopper spectrometer resolution model.
//!
//! The energy resolution comes from the time widths of the moderator
//! pulse and the Fermi chopper burst, propagated through the flight
//! paths. Evaluating that expression per point is cheap but the model is
//! queried once per excitation, so the curve is sampled in reduced
//! energy transfer, fitted with a low-degree polynomial, and the fit is
//! cached per incident energy.

use super::{q_powder_cosine_law, AngleRange, InstrumentError, ResolutionModel};
use crate::common::constants::{CM1_IN_J, NEUTRON_MASS_KG, SIGMA_TO_FWHM};
use crate::common::{ChopperSetting, DirectSettings};
use crate::numerics::special::{polyfit, polyval};
use std::cell::RefCell;
use std::collections::HashMap;

const MICROSECONDS_TO_SECONDS: f64 = 1.0e-6;

/// A chopper spectrometer in one of two states: before and after the
/// incident energy is chosen. Sigma and momentum-transfer queries need
/// the energy and fail until it is set.
#[derive(Debug)]
pub struct DirectGeometryChopper {
    settings: DirectSettings,
    setting_name: String,
    incident_energy: Option<f64>,
    // polynomial coefficients keyed by the exact bit pattern of the
    // incident energy they were fitted for
    fit_cache: RefCell<HashMap<u64, Vec<f64>>>,
}

impl DirectGeometryChopper {
    /// Construct with the instrument's default chopper setting.
    pub fn new(settings: DirectSettings) -> Result<Self, InstrumentError> {
        let setting = settings.default_setting.clone();
        Self::with_setting(settings, &setting)
    }

    /// Construct with a named chopper setting.
    pub fn with_setting(settings: DirectSettings, setting: &str) -> Result<Self, InstrumentError> {
        if !settings.settings.contains_key(setting) {
            let available: Vec<&str> =
                settings.settings.keys().map(String::as_str).collect();
            return Err(InstrumentError::UnknownSetting {
                setting: setting.to_string(),
                available: available.join(", "),
            });
        }
        Ok(Self {
            settings,
            setting_name: setting.to_string(),
            incident_energy: None,
            fit_cache: RefCell::new(HashMap::new()),
        })
    }

    /// Select the incident energy, in wavenumbers, for subsequent sigma
    /// and momentum-transfer queries.
    pub fn set_incident_energy(&mut self, energy: f64) -> Result<(), InstrumentError> {
        if !energy.is_finite() || energy <= 0.0 {
            return Err(InstrumentError::InvalidIncidentEnergy { value: energy });
        }
        self.incident_energy = Some(energy);
        Ok(())
    }

    pub fn incident_energy(&self) -> Option<f64> {
        self.incident_energy
    }

    pub fn setting_name(&self) -> &str {
        &self.setting_name
    }

    pub fn setting(&self) -> &ChopperSetting {
        // validated at construction
        &self.settings.settings[&self.setting_name]
    }

    pub fn angle_range(&self) -> AngleRange {
        AngleRange {
            min_deg: self.settings.angle_min_deg,
            max_deg: self.settings.angle_max_deg,
        }
    }

    /// Number of incident energies with a cached resolution fit.
    pub fn cached_fit_count(&self) -> usize {
        self.fit_cache.borrow().len()
    }

    fn require_incident_energy(&self) -> Result<f64, InstrumentError> {
        self.incident_energy
            .ok_or(InstrumentError::IncidentEnergyNotSet {
                instrument: self.name(),
            })
    }

    /// Momentum transfer squared (1/angstrom^2) at each energy transfer
    /// for a detector at the given scattering angle.
    ///
    /// Transfers above the incident energy leave no final-state neutron;
    /// the cosine law then takes the square root of a negative final
    /// energy and the corresponding entries are NaN. Callers restrict
    /// frequencies to the accessible range, unlike `calculate_sigma`
    /// which clamps.
    pub fn calculate_q_powder(
        &self,
        frequencies: &[f64],
        cos_scattering_angle: f64,
    ) -> Result<Vec<f64>, InstrumentError> {
        let incident_energy = self.require_incident_energy()?;
        Ok(frequencies
            .iter()
            .map(|&frequency| {
                q_powder_cosine_law(
                    incident_energy,
                    incident_energy - frequency,
                    cos_scattering_angle,
                )
            })
            .collect())
    }

    /// Fermi-chopper resolution FWHM at reduced energy transfer
    /// `x = omega / incident_energy`.
    fn resolution_fwhm(&self, incident_energy: f64, x: f64) -> f64 {
        let chopper_width =
            self.setting().chopper_time_width_us * MICROSECONDS_TO_SECONDS;
        let moderator_width = self.settings.moderator_time_width_us * MICROSECONDS_TO_SECONDS;
        let l1 = self.settings.moderator_to_chopper_m;
        let l2 = self.settings.chopper_to_sample_m;
        let l3 = self.settings.sample_to_detector_m;

        let incident_velocity =
            (2.0 * incident_energy * CM1_IN_J / NEUTRON_MASS_KG).sqrt();
        let incident_time = l1 / incident_velocity;

        let energy_ratio = (1.0 - x).max(0.0).powf(1.5);
        let chopper_term =
            chopper_width / incident_time * (1.0 + (l1 + l2) / l3 * energy_ratio);
        let moderator_term =
            moderator_width / incident_time * (1.0 + l2 / l3 * energy_ratio);
        2.0 * incident_energy * (chopper_term * chopper_term + moderator_term * moderator_term).sqrt()
    }

    /// Polynomial fit of sigma against reduced energy transfer, cached
    /// per incident energy.
    fn resolution_fit(&self, incident_energy: f64) -> Result<Vec<f64>, InstrumentError> {
        let key = incident_energy.to_bits();
        if let Some(coefficients) = self.fit_cache.borrow().get(&key) {
            return Ok(coefficients.clone());
        }

        let count = self.settings.fit_sample_count;
        let x: Vec<f64> = (0..count).map(|i| i as f64 / count as f64).collect();
        let sigma: Vec<f64> = x
            .iter()
            .map(|&xi| self.resolution_fwhm(incident_energy, xi) / SIGMA_TO_FWHM)
            .collect();
        let coefficients = polyfit(&x, &sigma, self.settings.fit_degree)?;

        tracing::debug!(
            instrument = self.name(),
            incident_energy,
            degree = self.settings.fit_degree,
            "refreshed resolution fit cache"
        );
        self.fit_cache.borrow_mut().insert(key, coefficients.clone());
        Ok(coefficients)
    }
}

impl ResolutionModel for DirectGeometryChopper {
    fn name(&self) -> &'static str {
        "direct-geometry-chopper"
    }

    fn calculate_sigma(&self, frequencies: &[f64]) -> Result<Vec<f64>, InstrumentError> {
        let incident_energy = self.require_incident_energy()?;
        let coefficients = self.resolution_fit(incident_energy)?;
        Ok(frequencies
            .iter()
            .map(|&frequency| {
                let x = (frequency / incident_energy).clamp(0.0, 1.0);
                polyval(&coefficients, x)
            })
            .collect())
    }
}
