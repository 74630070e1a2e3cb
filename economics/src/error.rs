//! Economics error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EconomicsError {
    #[error("Tax cannot exceed 10%: buy {buy}, sell {sell}")]
    TaxTooHigh { buy: u8, sell: u8 },

    #[error("Transfer tax cannot exceed 10%: {0}")]
    TransferTaxTooHigh(u8),

    #[error("Invalid allocation: liquidity {liquidity} + reward {reward} must be in 1..=100")]
    InvalidAllocation { liquidity: u8, reward: u8 },

    #[error("No eligible holders; {amount} held back for the next funding")]
    NoEligibleHolders { amount: u128 },

    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),
}

pub type Result<T> = std::result::Result<T, EconomicsError>;
