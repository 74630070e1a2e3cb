//! Eligibility tracking
//!
//! An account is eligible while `balance >= minimum_holding` and it is not
//! excluded from fees. The tracker keeps `eligible_supply` equal to the sum
//! of eligible balances by bracketing every balance or exclusion change:
//!
//! 1. `before_change`: settle the account and remove its old balance
//! 2. mutate the account
//! 3. `after_change`: re-evaluate, add the new balance, reset the snapshot
//!
//! Settling first means nothing accrued while eligible is lost; resetting the
//! snapshot afterwards means nothing accrued before eligibility is claimed.

use log::debug;
use reflect_core::Account;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::rewards::RewardAccumulator;

/// Eligibility transition caused by a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EligibilityChange {
    Joined,
    Left,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityTracker {
    minimum_holding: u128,
    eligible_supply: u128,
    eligible_accounts: u64,
}

impl EligibilityTracker {
    pub fn new(minimum_holding: u128) -> Self {
        Self {
            minimum_holding,
            eligible_supply: 0,
            eligible_accounts: 0,
        }
    }

    pub fn minimum_holding(&self) -> u128 {
        self.minimum_holding
    }

    pub fn eligible_supply(&self) -> u128 {
        self.eligible_supply
    }

    pub fn eligible_accounts(&self) -> u64 {
        self.eligible_accounts
    }

    pub fn qualifies(&self, account: &Account) -> bool {
        !account.excluded_from_fees && account.balance >= self.minimum_holding
    }

    /// Settle an eligible account and take its balance out of the eligible supply.
    /// Call before changing the account's balance or exclusion flag.
    pub fn before_change(&mut self, account: &mut Account, rewards: &RewardAccumulator) -> Result<()> {
        if account.eligible {
            rewards.settle(account)?;
            self.eligible_supply -= account.balance;
        }
        Ok(())
    }

    /// Re-evaluate after the change; eligible balance re-enters the supply at
    /// the current index.
    pub fn after_change(
        &mut self,
        account: &mut Account,
        rewards: &RewardAccumulator,
    ) -> Option<EligibilityChange> {
        let was_eligible = account.eligible;
        let now_eligible = self.qualifies(account);

        if now_eligible {
            // bounded by total supply
            self.eligible_supply += account.balance;
            account.reward_snapshot = rewards.global_index();
        }
        account.eligible = now_eligible;

        match (was_eligible, now_eligible) {
            (false, true) => {
                self.eligible_accounts += 1;
                debug!("{} became eligible with {}", account.address, account.balance);
                Some(EligibilityChange::Joined)
            }
            (true, false) => {
                self.eligible_accounts -= 1;
                debug!("{} left eligibility at {}", account.address, account.balance);
                Some(EligibilityChange::Left)
            }
            _ => None,
        }
    }
}
