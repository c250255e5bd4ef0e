//! Idealized 2D-map instrument.
//!
//! A stand-in for scans over many incident energies: the resolution is a
//! fixed fraction of the incident energy, independent of the transfer,
//! and the detector bank covers a wide angular range.

use super::{q_powder_cosine_law, AngleRange, InstrumentError, ResolutionModel};
use crate::common::TwoDMapSettings;

#[derive(Debug, Clone)]
pub struct IdealTwoDMap {
    settings: TwoDMapSettings,
    incident_energy: Option<f64>,
}

impl IdealTwoDMap {
    pub fn new(settings: TwoDMapSettings) -> Self {
        Self {
            settings,
            incident_energy: None,
        }
    }

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

    pub fn angle_range(&self) -> AngleRange {
        AngleRange {
            min_deg: self.settings.angle_min_deg,
            max_deg: self.settings.angle_max_deg,
        }
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
    /// Transfers above the incident energy have no final-state neutron
    /// and yield NaN entries; callers restrict frequencies to the
    /// accessible range.
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
}

impl ResolutionModel for IdealTwoDMap {
    fn name(&self) -> &'static str {
        "ideal-2d-map"
    }

    fn calculate_sigma(&self, frequencies: &[f64]) -> Result<Vec<f64>, InstrumentError> {
        let incident_energy = self.require_incident_energy()?;
        let sigma = self.settings.resolution * incident_energy;
        Ok(vec![sigma; frequencies.len()])
    }
}
