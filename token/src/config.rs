//! Token configuration (TOML)
//!
//! Amounts are given in whole tokens and scaled by `decimals`, since TOML
//! integers cannot hold 18-decimal base units.
//!
//! Example:
//! ```toml
//! name = "SafeMoonLikeToken"
//! symbol = "SMLT"
//! total_supply = 1_000_000_000
//! buy_tax = 5
//! sell_tax = 5
//! minimum_holding = 250
//! conversion_threshold = 100
//! ```

use reflect_economics::{EconomicsError, TaxConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<EconomicsError> for ConfigError {
    fn from(e: EconomicsError) -> Self {
        ConfigError::Invalid(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,

    /// Whole tokens minted to the deployer
    pub total_supply: u64,

    pub buy_tax: u8,
    pub sell_tax: u8,
    /// Rate for transfers that do not touch the pool
    pub transfer_tax: u8,

    /// Liquidity weight of collected tax
    pub liquidity_allocation: u8,
    /// Reward weight of collected tax
    pub reward_allocation: u8,

    /// Whole tokens needed for reward eligibility
    pub minimum_holding: u64,
    /// Whole tokens of held tax that trigger a conversion
    pub conversion_threshold: u64,

    /// Pay settled rewards to both parties during transfers
    pub auto_claim_on_transfer: bool,

    /// Accepted shortfall against the venue quote, in basis points
    pub max_slippage_bps: u16,
    pub swap_deadline_secs: i64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: "SafeMoonLikeToken".to_string(),
            symbol: "SMLT".to_string(),
            decimals: 18,
            total_supply: 1_000_000_000,
            buy_tax: 5,
            sell_tax: 5,
            transfer_tax: 5,
            liquidity_allocation: 2,
            reward_allocation: 3,
            minimum_holding: 250,
            conversion_threshold: 100,
            auto_claim_on_transfer: false,
            max_slippage_bps: 0,
            swap_deadline_secs: 600,
        }
    }
}

impl TokenConfig {
    /// Load configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: TokenConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() || self.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("name and symbol are required".to_string()));
        }
        if self.decimals > 18 {
            return Err(ConfigError::Invalid(format!(
                "decimals must be at most 18, got {}",
                self.decimals
            )));
        }
        if self.total_supply == 0 {
            return Err(ConfigError::Invalid("total supply must be positive".to_string()));
        }
        if self.max_slippage_bps > 10_000 {
            return Err(ConfigError::Invalid(format!(
                "slippage {} bps exceeds 10000",
                self.max_slippage_bps
            )));
        }
        if self.swap_deadline_secs <= 0 {
            return Err(ConfigError::Invalid("swap deadline must be positive".to_string()));
        }
        self.tax_config()?;
        Ok(())
    }

    pub fn tax_config(&self) -> Result<TaxConfig, EconomicsError> {
        TaxConfig::new(
            self.buy_tax,
            self.sell_tax,
            self.transfer_tax,
            self.liquidity_allocation,
            self.reward_allocation,
        )
    }

    /// One whole token in base units
    pub fn unit(&self) -> u128 {
        10u128.pow(self.decimals as u32)
    }

    /// Whole tokens to base units; cannot overflow with decimals <= 18
    pub fn to_base_units(&self, tokens: u64) -> u128 {
        tokens as u128 * self.unit()
    }

    pub fn total_supply_units(&self) -> u128 {
        self.to_base_units(self.total_supply)
    }

    pub fn minimum_holding_units(&self) -> u128 {
        self.to_base_units(self.minimum_holding)
    }

    pub fn conversion_threshold_units(&self) -> u128 {
        self.to_base_units(self.conversion_threshold)
    }
}
