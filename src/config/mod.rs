//! Configuration loading and validation.

mod settings;

pub use settings::{default_settings_path, ScanSettings, SETTINGS_FILE};
