//! User configuration
//!
//! A YAML file under the platform config directory.  If none exists,
//! defaults are generated and written on first load.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::error::{Result, config};
use crate::models::Currency;

/// Settings that apply across ledgers
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Currency that gain reports are stated in
    pub functional_currency: Currency,
    /// Ledger file used when `--ledger` isn't given
    pub ledger: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            functional_currency: Currency::USD,
            ledger: None,
        }
    }
}

impl Config {
    /// Load the user config, writing defaults if no file exists yet
    pub fn load() -> Result<Config> {
        let path = config_path();
        if path.exists() {
            let raw =
                fs::read_to_string(&path).map_err(|e| config::read_failed(&path, e.to_string()))?;
            return serde_yaml::from_str(&raw)
                .map_err(|e| config::parse_failed(&path, e.to_string()));
        }

        let defaults = Config::default();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| config::write_failed(&path, e.to_string()))?;
        }
        let raw = serde_yaml::to_string(&defaults)
            .map_err(|e| config::write_failed(&path, e.to_string()))?;
        fs::write(&path, raw).map_err(|e| config::write_failed(&path, e.to_string()))?;
        Ok(defaults)
    }

    /// The ledger file to use: configured path, else the platform data dir
    pub fn ledger_path(&self) -> PathBuf {
        match &self.ledger {
            Some(path) => path.clone(),
            None => default_ledger_path(),
        }
    }
}

/// Path of the user config file
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("capgains")
        .join("capgains.yaml")
}

fn default_ledger_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("capgains")
        .join("ledger.json")
}
