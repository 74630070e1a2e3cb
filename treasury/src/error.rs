//! Treasury error types

use reflect_core::Address;
use thiserror::Error;

/// Failures reported by the liquidity venue
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VenueError {
    #[error("Venue unavailable")]
    Unavailable,

    #[error("Deadline {deadline} passed at {now}")]
    DeadlineExpired { deadline: i64, now: i64 },

    #[error("Slippage: wanted at least {min_out}, got {amount_out}")]
    SlippageExceeded { min_out: u128, amount_out: u128 },

    #[error("Insufficient liquidity")]
    InsufficientLiquidity,

    #[error("Invalid swap path")]
    InvalidPath,

    #[error("Insufficient paired asset: requested {requested}, available {available}")]
    InsufficientPairedAsset { requested: u128, available: u128 },

    #[error("Rejected: {0}")]
    Rejected(String),
}

/// Failures reported by the settlement asset
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    #[error("Insufficient settlement funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: u128, available: u128 },

    #[error("Transfer rejected: {0}")]
    Rejected(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreasuryError {
    #[error("Conversion failed: {0}")]
    ConversionFailed(VenueError),

    #[error("Conversion already in progress")]
    ConversionInProgress,

    #[error("Nothing pending to convert")]
    NothingToConvert,

    #[error("Payout of {amount} to {account} failed: {reason}")]
    PayoutFailed {
        account: Address,
        amount: u128,
        reason: SettlementError,
    },

    #[error("Arithmetic error: {0}")]
    Arithmetic(#[from] reflect_economics::EconomicsError),
}

pub type Result<T> = std::result::Result<T, TreasuryError>;
