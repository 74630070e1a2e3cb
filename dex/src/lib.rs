//! In-memory collaborators for the reflection token
//!
//! Reference implementations of the venue and settlement interfaces, used
//! by tests and local simulations:
//! - `SettlementLedger` / `SettlementVault`: a WETH-like settlement asset and
//!   the vault that pays rewards out of it
//! - `ConstantProductPool`: an x*y=k pool pairing the native token with the
//!   settlement asset

pub mod pool;
pub mod settlement;

pub use pool::{ConstantProductPool, SWAP_FEE_BPS};
pub use settlement::{SettlementLedger, SettlementVault, SharedSettlement};
