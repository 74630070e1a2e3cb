//! Reflect Core Library
//!
//! Balance ledger for the reflection token:
//! - Account records with reward bookkeeping fields
//! - Balances, allowances and a fixed total supply
//! - Conservation checks
//!
//! Tax, reward and conversion rules live in the `economics` and `treasury` crates.

pub mod account;
pub mod error;
pub mod ledger;

pub use account::{Account, Address};
pub use error::{LedgerError, Result};
pub use ledger::Ledger;

/// Ledger constants
pub mod constants {
    /// Decimal places of the native token
    pub const DECIMALS: u8 = 18;

    /// One whole token in base units
    pub const TOKEN_UNIT: u128 = 1_000_000_000_000_000_000;

    /// Supply minted at deployment (1 billion tokens)
    pub const INITIAL_SUPPLY: u128 = 1_000_000_000 * TOKEN_UNIT;

    /// Allowance value treated as unlimited
    pub const UNLIMITED_ALLOWANCE: u128 = u128::MAX;
}
