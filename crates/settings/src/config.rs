//! Configuration types

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use bonuscraft_core::DEFAULT_BATCH_SIZE;

use crate::{Result, SettingsError};

/// Run configuration, stored as JSON with PascalCase keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Settings {
    /// RPC endpoint of the ledger
    #[serde(default = "default_rpc_address")]
    pub json_rpc_address: String,

    /// Operator wallet file
    #[serde(default = "default_wallet_file")]
    pub wallet_file: PathBuf,

    /// Contribution log (newline-delimited JSON)
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    /// Tokens to distribute per round
    #[serde(default)]
    pub bonus: u64,

    /// Compute-unit price (0 = network default)
    #[serde(default)]
    pub gas_price: u64,

    /// Compute-unit limit (0 = network default)
    #[serde(default)]
    pub gas_limit: u64,

    /// Eligible peer public keys (absent = every peer)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_list: Option<Vec<String>>,

    /// Rounds covered by this run; the safety check allows `bonus * multiplier`
    #[serde(default = "default_multiplier")]
    pub bonus_multiplier: u64,

    /// Transfers per transaction (null = one transaction for everything)
    #[serde(default = "default_batch_size")]
    pub batch_size: Option<usize>,

    /// Drop transfers whose share rounds down to zero
    #[serde(default)]
    pub skip_zero_shares: bool,

    /// `address<TAB>amount` audit ledger (null = don't write)
    #[serde(default = "default_record_file")]
    pub record_file: Option<PathBuf>,

    /// Directory for per-batch raw transaction dumps (null = don't write)
    #[serde(default = "default_dump_dir")]
    pub transaction_dump_dir: Option<PathBuf>,

    /// Submit to a live cluster or to the in-memory mock ledger
    #[serde(default)]
    pub mode: Mode,

    /// Settings file path (not serialized)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_rpc_address() -> String {
    "http://127.0.0.1:8899".to_string()
}

fn default_wallet_file() -> PathBuf {
    PathBuf::from("wallet.json")
}

fn default_data_file() -> PathBuf {
    PathBuf::from("data.json")
}

fn default_multiplier() -> u64 {
    1
}

fn default_batch_size() -> Option<usize> {
    Some(DEFAULT_BATCH_SIZE)
}

fn default_record_file() -> Option<PathBuf> {
    Some(PathBuf::from("record.txt"))
}

fn default_dump_dir() -> Option<PathBuf> {
    Some(PathBuf::from("."))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            json_rpc_address: default_rpc_address(),
            wallet_file: default_wallet_file(),
            data_file: default_data_file(),
            bonus: 0,
            gas_price: 0,
            gas_limit: 0,
            allow_list: None,
            bonus_multiplier: default_multiplier(),
            batch_size: default_batch_size(),
            skip_zero_shares: false,
            record_file: default_record_file(),
            transaction_dump_dir: default_dump_dir(),
            mode: Mode::default(),
            config_path: None,
        }
    }
}

impl Settings {
    /// Load and validate settings from `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(SettingsError::ReadError)?;
        let mut settings = Self::from_json(&content)?;
        settings.config_path = Some(path.to_path_buf());
        info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Parse and validate settings from a JSON string.
    pub fn from_json(content: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(content).map_err(SettingsError::ParseError)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(SettingsError::CreateDirError)?;
            }
        }

        let content = serde_json::to_string_pretty(self).map_err(SettingsError::ParseError)?;
        std::fs::write(path, content).map_err(SettingsError::WriteError)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Path these settings were loaded from, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Reject configurations that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<()> {
        if self.json_rpc_address.trim().is_empty() {
            return Err(SettingsError::Invalid("JsonRpcAddress is empty".to_string()));
        }
        if self.wallet_file.as_os_str().is_empty() {
            return Err(SettingsError::Invalid("WalletFile is empty".to_string()));
        }
        if self.data_file.as_os_str().is_empty() {
            return Err(SettingsError::Invalid("DataFile is empty".to_string()));
        }
        if self.bonus == 0 {
            return Err(SettingsError::Invalid("Bonus must be greater than zero".to_string()));
        }
        if self.bonus_multiplier == 0 {
            return Err(SettingsError::Invalid(
                "BonusMultiplier must be greater than zero".to_string(),
            ));
        }
        if self.batch_size == Some(0) {
            return Err(SettingsError::Invalid("BatchSize must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Where transactions go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// In-memory ledger, nothing leaves the process
    Mock,
    /// Real RPC submission
    #[default]
    Live,
}
