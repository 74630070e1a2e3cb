//! Ledger error types

use thiserror::Error;

use crate::account::Address;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient balance for {account}: requested {requested}, available {available}")]
    InsufficientBalance {
        account: Address,
        requested: u128,
        available: u128,
    },

    #[error("Insufficient allowance for {spender} on {owner}: requested {requested}, available {available}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        requested: u128,
        available: u128,
    },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Tax {tax} exceeds transfer amount {amount}")]
    TaxExceedsAmount { tax: u128, amount: u128 },

    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
