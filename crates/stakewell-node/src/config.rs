//! Configuration file management.
//!
//! The node reads `config.toml` from its data directory. Every field has a
//! default, so a missing file or a partial one is fine.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use stakewell_ledger::PoolParams;
use stakewell_types::{Address, Timestamp, DEFAULT_REWARDS_DURATION_SECS};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "STAKEWELL_DATA_DIR";

/// Complete node configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Pool deployment settings.
    #[serde(default)]
    pub pool: PoolConfig,
    /// Clock settings.
    #[serde(default)]
    pub clock: ClockConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Pool deployment parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Custody address of the pool.
    #[serde(default = "default_pool_address")]
    pub address: Address,
    /// Initial owner.
    #[serde(default = "default_admin")]
    pub owner: Address,
    /// Initial rewards distributor.
    #[serde(default = "default_admin")]
    pub rewards_distributor: Address,
    /// Reward period length in seconds applied right after deployment.
    #[serde(default = "default_rewards_duration")]
    pub rewards_duration: u64,
    /// Identifier of the staking asset.
    #[serde(default = "default_staking_asset")]
    pub staking_asset: String,
    /// Identifier of the reward asset.
    #[serde(default = "default_reward_asset")]
    pub reward_asset: String,
}

/// Clock configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Start a manual clock at this Unix time instead of following the
    /// system clock. Scripts advance it explicitly.
    #[serde(default)]
    pub manual_start: Option<Timestamp>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace" | "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions

fn default_pool_address() -> Address {
    Address::repeat_byte(0x50)
}

fn default_admin() -> Address {
    Address::repeat_byte(0x01)
}

fn default_rewards_duration() -> u64 {
    DEFAULT_REWARDS_DURATION_SECS
}

fn default_staking_asset() -> String {
    "STAKE".to_string()
}

fn default_reward_asset() -> String {
    "REWARD".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            address: default_pool_address(),
            owner: default_admin(),
            rewards_distributor: default_admin(),
            rewards_duration: default_rewards_duration(),
            staking_asset: default_staking_asset(),
            reward_asset: default_reward_asset(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl PoolConfig {
    /// Construction parameters for the ledger.
    pub fn params(&self) -> PoolParams {
        PoolParams {
            address: self.address,
            owner: self.owner,
            rewards_distributor: self.rewards_distributor,
        }
    }
}

impl NodeConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if the file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from `path`.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: NodeConfig =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the ledger cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.pool.rewards_duration == 0 {
            anyhow::bail!("pool.rewards_duration must be greater than zero");
        }
        if self.pool.staking_asset == self.pool.reward_asset {
            anyhow::bail!("staking and reward assets must differ");
        }
        Ok(())
    }

    /// Get the config file path.
    fn config_path() -> PathBuf {
        Self::data_dir().join("config.toml")
    }

    /// Data directory, honouring [`DATA_DIR_ENV`].
    pub fn data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            return PathBuf::from(dir);
        }
        std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".stakewell"))
            .unwrap_or_else(|_| PathBuf::from("/tmp/stakewell"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NodeConfig::default();
        assert_eq!(config.pool.rewards_duration, 604_800);
        assert_eq!(config.pool.owner, config.pool.rewards_distributor);
        assert_eq!(config.pool.staking_asset, "STAKE");
        assert_eq!(config.logging.level, "info");
        assert!(config.clock.manual_start.is_none());
        config.validate().expect("defaults are valid");
    }

    #[test]
    fn test_config_serialization() {
        let config = NodeConfig::default();
        let toml_str = toml::to_string(&config).expect("serialize");
        let parsed: NodeConfig = toml::from_str(&toml_str).expect("parse");
        assert_eq!(parsed.pool.address, config.pool.address);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = format!(
            r#"
            [pool]
            owner = "{}"
            rewards_duration = 86400

            [clock]
            manual_start = 1700000000
            "#,
            "aa".repeat(20)
        );
        let config: NodeConfig = toml::from_str(&toml_str).expect("parse");
        assert_eq!(config.pool.owner, Address::repeat_byte(0xaa));
        assert_eq!(config.pool.rewards_distributor, Address::repeat_byte(0x01));
        assert_eq!(config.pool.rewards_duration, 86_400);
        assert_eq!(config.clock.manual_start, Some(1_700_000_000));
    }

    #[test]
    fn test_zero_duration_invalid() {
        let mut config = NodeConfig::default();
        config.pool.rewards_duration = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_same_assets_invalid() {
        let mut config = NodeConfig::default();
        config.pool.reward_asset = config.pool.staking_asset.clone();
        assert!(config.validate().is_err());
    }
}
