// Core modules
mod device_settings;
mod error;
mod services;
mod settings;

// CLI module
pub mod cli;

// Public exports
pub use device_settings::{
    Activation, Control, InfoRequest, InfoResponse, Phase, SettingsLayout, SettingsState,
    SettingsView, StatusKind, StatusLine,
};
pub use error::AppError;
pub use services::{strip_version_prefix, DeviceApi, DeviceInfo, DeviceInfoFetcher};
pub use settings::{get_settings, update_settings, AppSettings, Connection};
