//! Token error types

use reflect_core::{Address, LedgerError};
use reflect_economics::EconomicsError;
use reflect_treasury::{TreasuryError, VenueError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Economics(#[from] EconomicsError),

    #[error(transparent)]
    Treasury(#[from] TreasuryError),

    #[error("Liquidity venue error: {0}")]
    Venue(#[from] VenueError),

    #[error("Nothing to claim for {0}")]
    NothingToClaim(Address),

    #[error("Tax held by {0} only moves through a conversion")]
    TaxAccountLocked(Address),

    #[error("Caller {0} is not the owner")]
    NotOwner(Address),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TokenError {
    pub fn is_insufficient_balance(&self) -> bool {
        matches!(self, TokenError::Ledger(LedgerError::InsufficientBalance { .. }))
    }

    pub fn is_tax_too_high(&self) -> bool {
        matches!(
            self,
            TokenError::Economics(EconomicsError::TaxTooHigh { .. })
                | TokenError::Economics(EconomicsError::TransferTaxTooHigh(_))
        )
    }

    pub fn is_conversion_failed(&self) -> bool {
        matches!(self, TokenError::Treasury(TreasuryError::ConversionFailed(_)))
    }

    pub fn is_payout_failed(&self) -> bool {
        matches!(self, TokenError::Treasury(TreasuryError::PayoutFailed { .. }))
    }
}

pub type Result<T> = std::result::Result<T, TokenError>;
