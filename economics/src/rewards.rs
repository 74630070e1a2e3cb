//! Reward-per-eligible-unit accumulator
//!
//! Funding bumps a single global index by `amount * SCALE / eligible_supply`.
//! An account's share since its last settlement is
//! `balance * (global_index - reward_snapshot) / SCALE`, so neither funding
//! nor settlement ever walks the holder set.
//!
//! Both divisions floor. Per-account rounding loses less than one unit per
//! settlement, so the total owed to holders never exceeds what was funded.
//! The part of a funding that the floored index cannot represent is kept in
//! `undistributed` and rolled into the next funding.

use log::{debug, warn};
use primitive_types::U256;
use reflect_core::Account;
use serde::{Deserialize, Serialize};

use crate::error::{EconomicsError, Result};
use crate::math::{scale, to_u128};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardAccumulator {
    /// Cumulative settlement asset per eligible unit, scaled by 10^36
    global_index: U256,
    /// Funded value not yet reflected in the index
    undistributed: u128,
    /// Value reflected in the index since genesis
    total_funded: u128,
    /// Value paid out through claims
    total_claimed: u128,
}

impl RewardAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global_index(&self) -> U256 {
        self.global_index
    }

    pub fn undistributed(&self) -> u128 {
        self.undistributed
    }

    pub fn total_funded(&self) -> u128 {
        self.total_funded
    }

    pub fn total_claimed(&self) -> u128 {
        self.total_claimed
    }

    /// Distribute `amount` (plus anything held back earlier) across the
    /// current eligible supply. Returns the index increment.
    ///
    /// With no eligible supply the value is held back and
    /// `NoEligibleHolders` is returned; nothing is lost.
    pub fn fund(&mut self, amount: u128, eligible_supply: u128) -> Result<U256> {
        let available = amount
            .checked_add(self.undistributed)
            .ok_or_else(|| EconomicsError::ArithmeticOverflow("undistributed rewards".to_string()))?;

        if eligible_supply == 0 {
            self.undistributed = available;
            warn!("no eligible holders, holding back {} for the next funding", available);
            return Err(EconomicsError::NoEligibleHolders { amount: available });
        }

        let supply = U256::from(eligible_supply);
        let increment = U256::from(available)
            .checked_mul(scale())
            .ok_or_else(|| EconomicsError::ArithmeticOverflow("index increment".to_string()))?
            / supply;
        let new_index = self
            .global_index
            .checked_add(increment)
            .ok_or_else(|| EconomicsError::ArithmeticOverflow("global index".to_string()))?;

        // increment * supply <= available * SCALE, so this fits back into u128
        let distributed = to_u128(increment * supply / scale(), "distributed rewards")?;
        let total_funded = self
            .total_funded
            .checked_add(distributed)
            .ok_or_else(|| EconomicsError::ArithmeticOverflow("total funded".to_string()))?;

        self.global_index = new_index;
        self.undistributed = available - distributed;
        self.total_funded = total_funded;

        debug!(
            "funded {} over eligible supply {}: index +{} (carry {})",
            distributed, eligible_supply, increment, self.undistributed
        );
        Ok(increment)
    }

    /// Reward accrued since the account's snapshot, not yet settled
    pub fn pending(&self, account: &Account) -> Result<u128> {
        if !account.eligible || account.balance == 0 {
            return Ok(0);
        }
        let index_delta = self.global_index.saturating_sub(account.reward_snapshot);
        if index_delta.is_zero() {
            return Ok(0);
        }
        let accrued = U256::from(account.balance)
            .checked_mul(index_delta)
            .ok_or_else(|| EconomicsError::ArithmeticOverflow("accrued reward".to_string()))?
            / scale();
        to_u128(accrued, "accrued reward")
    }

    /// Move the pending reward into `unclaimed_reward` and advance the snapshot.
    /// A second call with no intervening change settles zero.
    pub fn settle(&self, account: &mut Account) -> Result<u128> {
        let delta = self.pending(account)?;
        account.unclaimed_reward = account
            .unclaimed_reward
            .checked_add(delta)
            .ok_or_else(|| EconomicsError::ArithmeticOverflow("unclaimed reward".to_string()))?;
        account.reward_snapshot = self.global_index;
        Ok(delta)
    }

    /// Settled plus pending reward, without touching the account
    pub fn claimable(&self, account: &Account) -> Result<u128> {
        account
            .unclaimed_reward
            .checked_add(self.pending(account)?)
            .ok_or_else(|| EconomicsError::ArithmeticOverflow("claimable reward".to_string()))
    }

    pub fn record_claim(&mut self, amount: u128) {
        self.total_claimed = self.total_claimed.saturating_add(amount);
    }
}
