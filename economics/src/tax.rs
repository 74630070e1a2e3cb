//! Transfer taxation
//!
//! Rate selection: `sell_tax` when the recipient is the liquidity pool,
//! `buy_tax` when the sender is, `transfer_tax` otherwise. Exempt transfers
//! pay nothing. Collected tax is split between liquidity and rewards by the
//! ratio `liquidity_allocation : reward_allocation` and held pending until
//! the conversion step consumes it.

use log::info;
use reflect_core::Address;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{EconomicsError, Result};
use crate::math::mul_div;

/// Direction of a transfer relative to the liquidity pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferKind {
    /// Tokens leave the pool
    Buy,
    /// Tokens enter the pool
    Sell,
    /// Neither party is the pool
    Peer,
}

impl TransferKind {
    pub fn classify(from: &Address, to: &Address, pool: &Address) -> Self {
        if to == pool {
            TransferKind::Sell
        } else if from == pool {
            TransferKind::Buy
        } else {
            TransferKind::Peer
        }
    }

    pub fn touches_pool(&self) -> bool {
        !matches!(self, TransferKind::Peer)
    }
}

/// Tax rates and the liquidity/reward weighting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxConfig {
    buy_tax: u8,
    sell_tax: u8,
    transfer_tax: u8,
    liquidity_allocation: u8,
    reward_allocation: u8,
}

impl TaxConfig {
    pub fn new(
        buy_tax: u8,
        sell_tax: u8,
        transfer_tax: u8,
        liquidity_allocation: u8,
        reward_allocation: u8,
    ) -> Result<Self> {
        validate_taxes(buy_tax, sell_tax)?;
        validate_transfer_tax(transfer_tax)?;
        validate_allocation(liquidity_allocation, reward_allocation)?;

        Ok(Self {
            buy_tax,
            sell_tax,
            transfer_tax,
            liquidity_allocation,
            reward_allocation,
        })
    }

    pub fn buy_tax(&self) -> u8 {
        self.buy_tax
    }

    pub fn sell_tax(&self) -> u8 {
        self.sell_tax
    }

    pub fn transfer_tax(&self) -> u8 {
        self.transfer_tax
    }

    pub fn liquidity_allocation(&self) -> u8 {
        self.liquidity_allocation
    }

    pub fn reward_allocation(&self) -> u8 {
        self.reward_allocation
    }

    pub fn rate_for(&self, kind: TransferKind) -> u8 {
        match kind {
            TransferKind::Buy => self.buy_tax,
            TransferKind::Sell => self.sell_tax,
            TransferKind::Peer => self.transfer_tax,
        }
    }

    /// Replace both rates, or neither
    pub fn set_taxes(&mut self, buy: u8, sell: u8) -> Result<()> {
        validate_taxes(buy, sell)?;
        self.buy_tax = buy;
        self.sell_tax = sell;
        Ok(())
    }

    pub fn set_transfer_tax(&mut self, rate: u8) -> Result<()> {
        validate_transfer_tax(rate)?;
        self.transfer_tax = rate;
        Ok(())
    }

    pub fn set_allocations(&mut self, liquidity: u8, reward: u8) -> Result<()> {
        validate_allocation(liquidity, reward)?;
        self.liquidity_allocation = liquidity;
        self.reward_allocation = reward;
        Ok(())
    }
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self {
            buy_tax: DEFAULT_BUY_TAX,
            sell_tax: DEFAULT_SELL_TAX,
            transfer_tax: DEFAULT_TRANSFER_TAX,
            liquidity_allocation: DEFAULT_LIQUIDITY_ALLOCATION,
            reward_allocation: DEFAULT_REWARD_ALLOCATION,
        }
    }
}

fn validate_taxes(buy: u8, sell: u8) -> Result<()> {
    if buy > MAX_TAX_PERCENT || sell > MAX_TAX_PERCENT {
        return Err(EconomicsError::TaxTooHigh { buy, sell });
    }
    Ok(())
}

fn validate_transfer_tax(rate: u8) -> Result<()> {
    if rate > MAX_TAX_PERCENT {
        return Err(EconomicsError::TransferTaxTooHigh(rate));
    }
    Ok(())
}

fn validate_allocation(liquidity: u8, reward: u8) -> Result<()> {
    let total = liquidity as u16 + reward as u16;
    if total == 0 || total > PERCENT as u16 {
        return Err(EconomicsError::InvalidAllocation { liquidity, reward });
    }
    Ok(())
}

/// Tax computed for one transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxQuote {
    pub kind: TransferKind,
    pub rate: u8,
    pub gross: u128,
    pub tax: u128,
    pub net: u128,
}

/// Collected tax divided into its liquidity and reward shares
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSplit {
    pub liquidity: u128,
    pub reward: u128,
}

impl TaxSplit {
    /// Split `tax` by the configured weights; rounding favours the reward share
    pub fn of(tax: u128, config: &TaxConfig) -> Result<Self> {
        let weight = config.liquidity_allocation as u128 + config.reward_allocation as u128;
        let liquidity = mul_div(tax, config.liquidity_allocation as u128, weight)?;
        Ok(TaxSplit {
            liquidity,
            reward: tax - liquidity,
        })
    }

    pub fn total(&self) -> u128 {
        self.liquidity + self.reward
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Rates plus the pending, not yet converted, tax split
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxEngine {
    config: TaxConfig,
    pending: TaxSplit,
    total_collected: u128,
}

impl TaxEngine {
    pub fn new(config: TaxConfig) -> Self {
        Self {
            config,
            pending: TaxSplit::default(),
            total_collected: 0,
        }
    }

    pub fn config(&self) -> &TaxConfig {
        &self.config
    }

    pub fn pending(&self) -> TaxSplit {
        self.pending
    }

    pub fn total_collected(&self) -> u128 {
        self.total_collected
    }

    pub fn set_taxes(&mut self, buy: u8, sell: u8) -> Result<()> {
        self.config.set_taxes(buy, sell)?;
        info!("taxes set: buy {}%, sell {}%", buy, sell);
        Ok(())
    }

    pub fn set_transfer_tax(&mut self, rate: u8) -> Result<()> {
        self.config.set_transfer_tax(rate)?;
        info!("transfer tax set: {}%", rate);
        Ok(())
    }

    pub fn set_allocations(&mut self, liquidity: u8, reward: u8) -> Result<()> {
        self.config.set_allocations(liquidity, reward)?;
        info!("tax allocation set: liquidity {} / reward {}", liquidity, reward);
        Ok(())
    }

    /// Compute the tax for a transfer without recording anything
    pub fn quote(&self, kind: TransferKind, amount: u128, exempt: bool) -> Result<TaxQuote> {
        let rate = if exempt { 0 } else { self.config.rate_for(kind) };
        let tax = mul_div(amount, rate as u128, PERCENT)?;

        Ok(TaxQuote {
            kind,
            rate,
            gross: amount,
            tax,
            net: amount - tax,
        })
    }

    /// Split `tax` under the current allocation
    pub fn split(&self, tax: u128) -> Result<TaxSplit> {
        TaxSplit::of(tax, &self.config)
    }

    /// Add a split of collected tax to the pending split
    pub fn record(&mut self, split: TaxSplit) {
        self.pending.liquidity += split.liquidity;
        self.pending.reward += split.reward;
        self.total_collected = self.total_collected.saturating_add(split.total());
    }

    /// Shrink the pending split to at most `held` tokens, keeping its
    /// liquidity to reward proportion
    pub fn cap_pending(&mut self, held: u128) -> Result<()> {
        let total = self.pending.total();
        if total <= held {
            return Ok(());
        }
        let liquidity = mul_div(self.pending.liquidity, held, total)?;
        self.pending = TaxSplit {
            liquidity,
            reward: held - liquidity,
        };
        Ok(())
    }

    /// Remove converted tokens from the pending split
    pub fn consume(&mut self, liquidity: u128, reward: u128) {
        self.pending.liquidity = self.pending.liquidity.saturating_sub(liquidity);
        self.pending.reward = self.pending.reward.saturating_sub(reward);
    }
}
