//! Reflect Economics Module
//!
//! Implements the economic model of the reflection token:
//! - Transfer taxation and the liquidity/reward split
//! - The reward-per-eligible-unit accumulator
//! - Eligibility tracking against the minimum holding
//!
//! Every operation here is O(1) in the number of holders.

pub mod eligibility;
pub mod error;
pub mod math;
pub mod rewards;
pub mod tax;

pub use eligibility::{EligibilityChange, EligibilityTracker};
pub use error::{EconomicsError, Result};
pub use rewards::RewardAccumulator;
pub use tax::{TaxConfig, TaxEngine, TaxQuote, TaxSplit, TransferKind};

/// Economic constants
pub mod constants {
    /// Upper bound for any single tax rate, in percent
    pub const MAX_TAX_PERCENT: u8 = 10;

    /// Percent denominator
    pub const PERCENT: u128 = 100;

    /// Decimal exponent of the reward index scale (10^36)
    pub const SCALE_EXPONENT: usize = 36;

    /// Default buy tax (5%)
    pub const DEFAULT_BUY_TAX: u8 = 5;

    /// Default sell tax (5%)
    pub const DEFAULT_SELL_TAX: u8 = 5;

    /// Default peer-to-peer tax (5%)
    pub const DEFAULT_TRANSFER_TAX: u8 = 5;

    /// Default liquidity weight of collected tax
    pub const DEFAULT_LIQUIDITY_ALLOCATION: u8 = 2;

    /// Default reward weight of collected tax
    pub const DEFAULT_REWARD_ALLOCATION: u8 = 3;
}
