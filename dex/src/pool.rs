//! Constant-product liquidity pool
//!
//! Pairs the native token with the settlement asset. The native side is
//! accounted here as a reserve; the token's ledger mirrors it on the pool
//! account. The paired side lives in the shared settlement ledger under the
//! pool's address.

use chrono::Utc;
use log::debug;
use primitive_types::U256;
use reflect_core::Address;
use reflect_treasury::{LiquidityReceipt, LiquidityVenue, VenueError};
use std::collections::HashMap;

use crate::settlement::SharedSettlement;

/// Swap fee (0.3%)
pub const SWAP_FEE_BPS: u128 = 30;

const BPS: u128 = 10_000;

#[derive(Debug)]
pub struct ConstantProductPool {
    address: Address,
    token: Address,
    paired: Address,
    token_reserve: u128,
    paired_reserve: u128,
    total_shares: u128,
    shares: HashMap<Address, u128>,
    settlement: SharedSettlement,
    offline: bool,
    reject_liquidity: bool,
}

impl ConstantProductPool {
    /// Create the pair for `token`; its address is derived from both assets
    pub fn new(token: &Address, settlement: SharedSettlement) -> Self {
        let paired = settlement.lock().asset().clone();
        let address = Address::derive(token, &format!("pair:{}", paired));

        Self {
            address,
            token: token.clone(),
            paired,
            token_reserve: 0,
            paired_reserve: 0,
            total_shares: 0,
            shares: HashMap::new(),
            settlement,
            offline: false,
            reject_liquidity: false,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// (native token reserve, paired asset reserve)
    pub fn reserves(&self) -> (u128, u128) {
        (self.token_reserve, self.paired_reserve)
    }

    pub fn total_shares(&self) -> u128 {
        self.total_shares
    }

    pub fn shares_of(&self, holder: &Address) -> u128 {
        self.shares.get(holder).copied().unwrap_or(0)
    }

    /// Simulate an unreachable venue
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// Reject deposits while still serving swaps
    pub fn set_reject_liquidity(&mut self, reject: bool) {
        self.reject_liquidity = reject;
    }

    fn amount_out(&self, amount_in: u128) -> Result<u128, VenueError> {
        if self.token_reserve == 0 || self.paired_reserve == 0 {
            return Err(VenueError::InsufficientLiquidity);
        }
        let in_with_fee = U256::from(amount_in) * U256::from(BPS - SWAP_FEE_BPS);
        let numerator = in_with_fee * U256::from(self.paired_reserve);
        let denominator = U256::from(self.token_reserve) * U256::from(BPS) + in_with_fee;

        // always below paired_reserve, so it fits
        Ok((numerator / denominator).as_u128())
    }

    fn ratio(a: u128, b: u128, c: u128) -> u128 {
        (U256::from(a) * U256::from(b) / U256::from(c)).as_u128()
    }
}

impl LiquidityVenue for ConstantProductPool {
    fn pool_address(&self) -> Address {
        self.address.clone()
    }

    fn quote_paired_out(&self, amount_in: u128) -> Result<u128, VenueError> {
        if self.offline {
            return Err(VenueError::Unavailable);
        }
        self.amount_out(amount_in)
    }

    fn swap_exact_tokens_for_paired_asset(
        &mut self,
        amount_in: u128,
        min_out: u128,
        path: &[Address],
        recipient: &Address,
        deadline: i64,
    ) -> Result<u128, VenueError> {
        if self.offline {
            return Err(VenueError::Unavailable);
        }
        let now = Utc::now().timestamp();
        if deadline < now {
            return Err(VenueError::DeadlineExpired { deadline, now });
        }
        if path.len() != 2 || path[0] != self.token || path[1] != self.paired {
            return Err(VenueError::InvalidPath);
        }

        let amount_out = self.amount_out(amount_in)?;
        if amount_out == 0 {
            return Err(VenueError::InsufficientLiquidity);
        }
        if amount_out < min_out {
            return Err(VenueError::SlippageExceeded { min_out, amount_out });
        }

        self.settlement
            .lock()
            .transfer(&self.address, recipient, amount_out)
            .map_err(|e| VenueError::Rejected(e.to_string()))?;

        self.token_reserve += amount_in;
        self.paired_reserve -= amount_out;
        debug!("swapped {} tokens for {} paired", amount_in, amount_out);
        Ok(amount_out)
    }

    fn add_liquidity(
        &mut self,
        token_amount: u128,
        paired_amount: u128,
        provider: &Address,
        recipient: &Address,
    ) -> Result<LiquidityReceipt, VenueError> {
        if self.offline {
            return Err(VenueError::Unavailable);
        }
        if self.reject_liquidity {
            return Err(VenueError::Rejected("deposits disabled".to_string()));
        }
        if token_amount == 0 || paired_amount == 0 {
            return Err(VenueError::Rejected("zero deposit".to_string()));
        }

        let (token_used, paired_used, minted) = if self.total_shares == 0 {
            let minted = (U256::from(token_amount) * U256::from(paired_amount))
                .integer_sqrt()
                .as_u128();
            (token_amount, paired_amount, minted)
        } else {
            let paired_optimal = Self::ratio(token_amount, self.paired_reserve, self.token_reserve);
            let (token_used, paired_used) = if paired_optimal <= paired_amount {
                (token_amount, paired_optimal)
            } else {
                let token_optimal = Self::ratio(paired_amount, self.token_reserve, self.paired_reserve);
                (token_optimal, paired_amount)
            };
            let minted = Self::ratio(token_used, self.total_shares, self.token_reserve)
                .min(Self::ratio(paired_used, self.total_shares, self.paired_reserve));
            (token_used, paired_used, minted)
        };

        if minted == 0 {
            return Err(VenueError::InsufficientLiquidity);
        }

        {
            let mut settlement = self.settlement.lock();
            let available = settlement.balance_of(provider);
            if available < paired_used {
                return Err(VenueError::InsufficientPairedAsset {
                    requested: paired_used,
                    available,
                });
            }
            settlement
                .transfer(provider, &self.address, paired_used)
                .map_err(|e| VenueError::Rejected(e.to_string()))?;
        }

        self.token_reserve += token_used;
        self.paired_reserve += paired_used;
        self.total_shares += minted;
        *self.shares.entry(recipient.clone()).or_insert(0) += minted;

        debug!(
            "liquidity added: {} tokens + {} paired, {} shares to {}",
            token_used, paired_used, minted, recipient
        );
        Ok(LiquidityReceipt {
            token_used,
            paired_used,
            liquidity_minted: minted,
        })
    }
}
