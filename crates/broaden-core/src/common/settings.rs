//! Sampling and instrument parameter blocks.
//!
//! The original reduction scripts read these values from a process-wide
//! parameter dictionary. Here every consumer receives an explicit
//! settings struct instead; the structs deserialize from a single JSON
//! document whose layout mirrors the old dictionary (a `sampling` block
//! plus one block per instrument family).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Shared sampling policy consumed by the broadening dispatcher and the
/// instrument models.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingSettings {
    /// Sigma-multiple cutoff used by the truncated and interpolated schemes.
    #[serde(default = "default_broadening_range")]
    pub broadening_range: f64,
    /// Input sizes at or above this resolve an `auto` scheme to the
    /// interpolated method instead of truncated summation.
    #[serde(default = "default_auto_scheme_point_threshold")]
    pub auto_scheme_point_threshold: usize,
    /// Pre-bin the input when it holds this many times more points than
    /// the output grid.
    #[serde(default = "default_prebin_input_ratio")]
    pub prebin_input_ratio: f64,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            broadening_range: default_broadening_range(),
            auto_scheme_point_threshold: default_auto_scheme_point_threshold(),
            prebin_input_ratio: default_prebin_input_ratio(),
        }
    }
}

fn default_broadening_range() -> f64 {
    3.0
}

fn default_auto_scheme_point_threshold() -> usize {
    1000
}

fn default_prebin_input_ratio() -> f64 {
    5.0
}

/// Parameters of an indirect-geometry (TOSCA-like) spectrometer with a
/// fixed final energy and a quadratic empirical resolution fit.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToscaSettings {
    /// Analyser final energy in cm^-1.
    #[serde(default = "default_final_neutron_energy")]
    pub final_neutron_energy: f64,
    /// Cosine of the (fixed) detector-bank scattering angle.
    #[serde(default = "default_cos_scattering_angle")]
    pub cos_scattering_angle: f64,
    /// Quadratic coefficient of sigma(frequency), cm.
    #[serde(default = "default_resolution_quadratic")]
    pub resolution_quadratic: f64,
    /// Linear coefficient of sigma(frequency), dimensionless.
    #[serde(default = "default_resolution_linear")]
    pub resolution_linear: f64,
    /// Constant term of sigma(frequency), cm^-1.
    #[serde(default = "default_resolution_constant")]
    pub resolution_constant: f64,
}

impl Default for ToscaSettings {
    fn default() -> Self {
        Self {
            final_neutron_energy: default_final_neutron_energy(),
            cos_scattering_angle: default_cos_scattering_angle(),
            resolution_quadratic: default_resolution_quadratic(),
            resolution_linear: default_resolution_linear(),
            resolution_constant: default_resolution_constant(),
        }
    }
}

fn default_final_neutron_energy() -> f64 {
    32.0
}

fn default_cos_scattering_angle() -> f64 {
    // backscattering bank at 135 degrees
    -std::f64::consts::FRAC_1_SQRT_2
}

fn default_resolution_quadratic() -> f64 {
    1.0e-7
}

fn default_resolution_linear() -> f64 {
    5.0e-3
}

fn default_resolution_constant() -> f64 {
    2.5
}

/// One selectable chopper package/frequency combination of a
/// direct-geometry spectrometer.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChopperSetting {
    /// Burst time width (FWHM) of the Fermi chopper in microseconds.
    pub chopper_time_width_us: f64,
}

/// Parameters of a direct-geometry chopper spectrometer.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectSettings {
    /// Moderator pulse width (FWHM) in microseconds.
    #[serde(default = "default_moderator_time_width_us")]
    pub moderator_time_width_us: f64,
    /// Moderator to chopper flight path in meters.
    #[serde(default = "default_moderator_to_chopper_m")]
    pub moderator_to_chopper_m: f64,
    /// Chopper to sample flight path in meters.
    #[serde(default = "default_chopper_to_sample_m")]
    pub chopper_to_sample_m: f64,
    /// Sample to detector flight path in meters.
    #[serde(default = "default_sample_to_detector_m")]
    pub sample_to_detector_m: f64,
    /// Smallest detector scattering angle in degrees.
    #[serde(default = "default_direct_angle_min_deg")]
    pub angle_min_deg: f64,
    /// Largest detector scattering angle in degrees.
    #[serde(default = "default_direct_angle_max_deg")]
    pub angle_max_deg: f64,
    /// Degree of the polynomial fitted to the sampled resolution curve.
    #[serde(default = "default_fit_degree")]
    pub fit_degree: usize,
    /// Number of energy-transfer samples used for the fit.
    #[serde(default = "default_fit_sample_count")]
    pub fit_sample_count: usize,
    /// Chopper setting selected when the caller does not name one.
    #[serde(default = "default_setting_name")]
    pub default_setting: String,
    /// Named chopper settings available on this instrument.
    #[serde(default = "default_chopper_settings")]
    pub settings: BTreeMap<String, ChopperSetting>,
}

impl Default for DirectSettings {
    fn default() -> Self {
        Self {
            moderator_time_width_us: default_moderator_time_width_us(),
            moderator_to_chopper_m: default_moderator_to_chopper_m(),
            chopper_to_sample_m: default_chopper_to_sample_m(),
            sample_to_detector_m: default_sample_to_detector_m(),
            angle_min_deg: default_direct_angle_min_deg(),
            angle_max_deg: default_direct_angle_max_deg(),
            fit_degree: default_fit_degree(),
            fit_sample_count: default_fit_sample_count(),
            default_setting: default_setting_name(),
            settings: default_chopper_settings(),
        }
    }
}

fn default_moderator_time_width_us() -> f64 {
    32.0
}

fn default_moderator_to_chopper_m() -> f64 {
    10.0
}

fn default_chopper_to_sample_m() -> f64 {
    1.7
}

fn default_sample_to_detector_m() -> f64 {
    4.0
}

fn default_direct_angle_min_deg() -> f64 {
    3.0
}

fn default_direct_angle_max_deg() -> f64 {
    60.0
}

fn default_fit_degree() -> usize {
    4
}

fn default_fit_sample_count() -> usize {
    40
}

fn default_setting_name() -> String {
    "high-resolution".to_string()
}

fn default_chopper_settings() -> BTreeMap<String, ChopperSetting> {
    BTreeMap::from([
        (
            "high-flux".to_string(),
            ChopperSetting {
                chopper_time_width_us: 8.0,
            },
        ),
        (
            "high-resolution".to_string(),
            ChopperSetting {
                chopper_time_width_us: 3.0,
            },
        ),
    ])
}

/// Parameters of the idealized 2D-map instrument with a constant
/// fractional energy resolution.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoDMapSettings {
    /// Energy resolution sigma as a fraction of the incident energy.
    #[serde(default = "default_two_d_map_resolution")]
    pub resolution: f64,
    #[serde(default = "default_two_d_map_angle_min_deg")]
    pub angle_min_deg: f64,
    #[serde(default = "default_two_d_map_angle_max_deg")]
    pub angle_max_deg: f64,
}

impl Default for TwoDMapSettings {
    fn default() -> Self {
        Self {
            resolution: default_two_d_map_resolution(),
            angle_min_deg: default_two_d_map_angle_min_deg(),
            angle_max_deg: default_two_d_map_angle_max_deg(),
        }
    }
}

fn default_two_d_map_resolution() -> f64 {
    0.01
}

fn default_two_d_map_angle_min_deg() -> f64 {
    3.0
}

fn default_two_d_map_angle_max_deg() -> f64 {
    135.0
}

/// Top-level settings document: the shared sampling block plus one block
/// per instrument family.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub sampling: SamplingSettings,
    #[serde(default)]
    pub tosca: ToscaSettings,
    #[serde(default)]
    pub direct: DirectSettings,
    #[serde(default)]
    pub two_d_map: TwoDMapSettings,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse settings '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub fn load_settings(path: impl AsRef<Path>) -> Result<Settings, SettingsError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&source).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
