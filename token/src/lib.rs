//! Reflect Token
//!
//! The reflection token as a single context object: a taxed balance ledger
//! whose collected tax is converted into liquidity and into settlement-asset
//! rewards shared by every eligible holder in O(1) per operation.
//!
//! Transfer pipeline:
//! tax quote -> settle parties -> move balances -> re-evaluate eligibility
//! -> optional auto payout -> conversion check.

pub mod config;
pub mod error;
pub mod events;
pub mod shared;
pub mod token;

pub use config::{ConfigError, TokenConfig};
pub use error::{Result, TokenError};
pub use events::LedgerEvent;
pub use shared::SharedReflectionToken;
pub use token::{ConversionReport, ConversionStatus, ReflectionToken, TokenSnapshot, TransferReceipt};

pub use reflect_core::{Account, Address};
pub use reflect_economics::{TaxConfig, TaxQuote, TaxSplit, TransferKind};
pub use reflect_treasury::{LiquidityReceipt, LiquidityVenue, SettlementAsset};
