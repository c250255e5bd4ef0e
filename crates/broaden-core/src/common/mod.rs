pub mod constants;
pub mod settings;

pub use settings::{
    load_settings, ChopperSetting, DirectSettings, SamplingSettings, Settings, SettingsError,
    ToscaSettings, TwoDMapSettings,
};
