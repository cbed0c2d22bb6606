//! # Configuration
//!
//! Homebound reads a single TOML file. Every section and every key has a default, so an
//! empty file is a valid configuration.
//!
//! ```toml
//! [homes]
//! data_dir = "./data"
//! save_file = "homes.csv"
//! backup_file = "homes_backup.csv"
//!
//! [costs]
//! default_currency = "coins"
//! aggregation = "sum"          # or "max"
//!
//! [capacity]
//! overwrite_policy = "exempt"  # or "check_new_scope"
//!
//! [logging]
//! level = "info"
//! file = "homebound.log"
//! ```
//!
//! ```rust,no_run
//! use homebound::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("homebound.toml").await?;
//!     println!("Homes file: {}", config.homes.save_path().display());
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::homes::capacity::OverwritePolicy;
use crate::homes::cost::CostAggregation;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub homes: HomesConfig,
    #[serde(default)]
    pub costs: CostsConfig,
    #[serde(default)]
    pub capacity: CapacityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where homes are persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomesConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_save_file")]
    pub save_file: String,
    /// The previous save is moved here before each write.
    #[serde(default = "default_backup_file")]
    pub backup_file: String,
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_save_file() -> String {
    "homes.csv".to_string()
}

fn default_backup_file() -> String {
    "homes_backup.csv".to_string()
}

impl Default for HomesConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            save_file: default_save_file(),
            backup_file: default_backup_file(),
        }
    }
}

impl HomesConfig {
    pub fn save_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.save_file)
    }

    pub fn backup_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.backup_file)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostsConfig {
    /// Currency charged by cost lines that name none.
    #[serde(default = "default_currency")]
    pub default_currency: String,
    #[serde(default)]
    pub aggregation: CostAggregation,
}

fn default_currency() -> String {
    "coins".to_string()
}

impl Default for CostsConfig {
    fn default() -> Self {
        Self {
            default_currency: default_currency(),
            aggregation: CostAggregation::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapacityConfig {
    #[serde(default)]
    pub overwrite_policy: OverwritePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config
            .validate()
            .map_err(|e| anyhow!("Invalid config file {}: {}", path, e))?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let content = toml::to_string_pretty(&Config::default())
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.costs.default_currency.trim().is_empty() {
            return Err(anyhow!("costs.default_currency must not be empty"));
        }
        if self.homes.save_file.trim().is_empty() {
            return Err(anyhow!("homes.save_file must not be empty"));
        }
        if self.homes.save_file == self.homes.backup_file {
            return Err(anyhow!(
                "homes.save_file and homes.backup_file must differ (both are {:?})",
                self.homes.save_file
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.homes.save_file, "homes.csv");
        assert_eq!(config.homes.backup_file, "homes_backup.csv");
        assert_eq!(config.costs.default_currency, "coins");
        assert_eq!(config.costs.aggregation, CostAggregation::Sum);
        assert_eq!(config.capacity.overwrite_policy, OverwritePolicy::Exempt);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn policies_parse_from_snake_case() {
        let config: Config = toml::from_str(
            "[costs]\naggregation = \"max\"\n[capacity]\noverwrite_policy = \"check_new_scope\"\n",
        )
        .unwrap();
        assert_eq!(config.costs.aggregation, CostAggregation::Max);
        assert_eq!(config.capacity.overwrite_policy, OverwritePolicy::CheckNewScope);
    }

    #[test]
    fn validate_rejects_clashing_files_and_blank_currency() {
        let mut config = Config::default();
        config.homes.backup_file = config.homes.save_file.clone();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.costs.default_currency = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn paths_join_data_dir() {
        let config = Config::default();
        assert_eq!(config.homes.save_path(), PathBuf::from("./data").join("homes.csv"));
        assert_eq!(
            config.homes.backup_path(),
            PathBuf::from("./data").join("homes_backup.csv")
        );
    }
}
