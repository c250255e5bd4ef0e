//! Indirect-geometry (TOSCA-like) resolution model.
//!
//! The analyser fixes the final neutron energy, so the incident energy
//! follows directly from the energy transfer and the resolution is a
//! quadratic empirical fit in the transfer itself. No per-measurement
//! state is needed.

use super::{q_powder_cosine_law, InstrumentError, ResolutionModel};
use crate::common::ToscaSettings;

#[derive(Debug, Clone)]
pub struct ToscaLike {
    settings: ToscaSettings,
}

impl ToscaLike {
    pub fn new(settings: ToscaSettings) -> Self {
        Self { settings }
    }

    /// Momentum transfer squared (1/angstrom^2) at each energy transfer,
    /// for the fixed detector-bank angle.
    pub fn calculate_q_powder(&self, frequencies: &[f64]) -> Vec<f64> {
        let final_energy = self.settings.final_neutron_energy;
        frequencies
            .iter()
            .map(|&frequency| {
                q_powder_cosine_law(
                    frequency + final_energy,
                    final_energy,
                    self.settings.cos_scattering_angle,
                )
            })
            .collect()
    }
}

impl ResolutionModel for ToscaLike {
    fn name(&self) -> &'static str {
        "tosca-like"
    }

    fn calculate_sigma(&self, frequencies: &[f64]) -> Result<Vec<f64>, InstrumentError> {
        let quadratic = self.settings.resolution_quadratic;
        let linear = self.settings.resolution_linear;
        let constant = self.settings.resolution_constant;
        Ok(frequencies
            .iter()
            .map(|&frequency| quadratic * frequency * frequency + linear * frequency + constant)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::ToscaLike;
    use crate::common::constants::K_SQUARED_PER_WAVENUMBER;
    use crate::common::ToscaSettings;
    use crate::instruments::ResolutionModel;

    #[test]
    fn sigma_follows_the_quadratic_fit() {
        let instrument = ToscaLike::new(ToscaSettings::default());
        let sigma = instrument
            .calculate_sigma(&[0.0, 1000.0])
            .expect("tosca sigma");

        assert!((sigma[0] - 2.5).abs() <= 1.0e-12);
        // 1e-7 * 1e6 + 5e-3 * 1e3 + 2.5
        assert!((sigma[1] - 7.6).abs() <= 1.0e-12);
    }

    #[test]
    fn sigma_grows_with_energy_transfer() {
        let instrument = ToscaLike::new(ToscaSettings::default());
        let sigma = instrument
            .calculate_sigma(&[10.0, 100.0, 1000.0, 4000.0])
            .expect("tosca sigma");
        assert!(sigma.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn elastic_line_q_matches_the_fixed_geometry() {
        let settings = ToscaSettings::default();
        let instrument = ToscaLike::new(settings);
        let q2 = instrument.calculate_q_powder(&[0.0])[0];

        let k2 = settings.final_neutron_energy * K_SQUARED_PER_WAVENUMBER;
        let expected = 2.0 * k2 * (1.0 - settings.cos_scattering_angle);
        assert!((q2 - expected).abs() <= 1.0e-12 * expected);
    }

    #[test]
    fn q_grows_with_energy_transfer_in_backscattering() {
        let instrument = ToscaLike::new(ToscaSettings::default());
        let q2 = instrument.calculate_q_powder(&[0.0, 500.0, 2000.0]);
        assert!(q2.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
