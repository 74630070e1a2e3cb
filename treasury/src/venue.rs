//! External collaborators
//!
//! The token consumes two interfaces it does not implement: a liquidity
//! venue that swaps native tokens for the paired asset and mints liquidity
//! positions, and a settlement asset used to pay rewards out of a vault.
//! Both calls are blocking and must either fully apply or fail.

use reflect_core::Address;
use serde::{Deserialize, Serialize};

use crate::error::{SettlementError, VenueError};

/// Result of a successful liquidity deposit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityReceipt {
    /// Native tokens the venue actually took
    pub token_used: u128,
    /// Paired asset the venue actually took
    pub paired_used: u128,
    /// Liquidity shares minted to the recipient
    pub liquidity_minted: u128,
}

pub trait LiquidityVenue {
    /// Ledger account that holds the pool's native tokens
    fn pool_address(&self) -> Address;

    /// Expected paired-asset output for `amount_in` native tokens
    fn quote_paired_out(&self, amount_in: u128) -> Result<u128, VenueError>;

    /// Swap `amount_in` native tokens for at least `min_out` of the paired
    /// asset, paid to `recipient`
    fn swap_exact_tokens_for_paired_asset(
        &mut self,
        amount_in: u128,
        min_out: u128,
        path: &[Address],
        recipient: &Address,
        deadline: i64,
    ) -> Result<u128, VenueError>;

    /// Deposit native tokens with paired asset drawn from `provider`,
    /// minting the position to `recipient`
    fn add_liquidity(
        &mut self,
        token_amount: u128,
        paired_amount: u128,
        provider: &Address,
        recipient: &Address,
    ) -> Result<LiquidityReceipt, VenueError>;
}

pub trait SettlementAsset {
    /// Identifier of the settlement asset, used as the swap path's last hop
    fn asset_address(&self) -> Address;

    /// Account holding settlement asset owed to holders
    fn vault_address(&self) -> Address;

    /// Pay `amount` out of the vault
    fn transfer(&mut self, to: &Address, amount: u128) -> Result<(), SettlementError>;
}
