//! BonusCraft Settings
//!
//! Run configuration for the bonus distributor.
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use bonuscraft_settings::Settings;
//!
//! let settings = Settings::load_from(Path::new("config.json"))?;
//! println!("distributing {} from {}", settings.bonus, settings.data_file.display());
//! # Ok::<(), bonuscraft_settings::SettingsError>(())
//! ```

mod config;

pub use config::{Mode, Settings};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    ReadError(std::io::Error),

    #[error("Failed to write settings: {0}")]
    WriteError(std::io::Error),

    #[error("Failed to parse settings: {0}")]
    ParseError(serde_json::Error),

    #[error("Failed to create config directory: {0}")]
    CreateDirError(std::io::Error),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, SettingsError>;

/// Default config file, relative to the working directory
pub fn default_settings_path() -> PathBuf {
    PathBuf::from("config.json")
}
