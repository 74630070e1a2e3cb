//! Reflect Treasury Module
//!
//! Turns collected tax into liquidity and reward funding:
//! - Interfaces to the external liquidity venue and settlement asset
//! - The conversion trigger with its two-phase reservation
//!
//! The treasury never touches ledger balances itself; it returns a
//! `ConversionOutcome` that the token commits.

pub mod conversion;
pub mod error;
pub mod venue;

pub use conversion::{ConversionOutcome, ConversionPlan, ConversionRoute, ConversionTrigger};
pub use error::{Result, SettlementError, TreasuryError, VenueError};
pub use venue::{LiquidityReceipt, LiquidityVenue, SettlementAsset};

/// Basis-point denominator for slippage limits
pub const BPS: u128 = 10_000;
