//! Balance ledger
//!
//! Holds every account, the allowance table and the total supply. The
//! supply is minted once at construction; afterwards balances only move
//! between accounts so `sum(balance) == total_supply` always holds.

use log::debug;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::account::{Account, Address};
use crate::constants::UNLIMITED_ALLOWANCE;
use crate::error::{LedgerError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    accounts: HashMap<Address, Account>,
    allowances: HashMap<Address, HashMap<Address, u128>>,
    total_supply: u128,
}

impl Ledger {
    /// Create a ledger and mint the whole supply to `holder`
    pub fn with_initial_supply(holder: &Address, supply: u128) -> Result<Self> {
        if holder.is_empty() {
            return Err(LedgerError::InvalidAddress("empty mint recipient".to_string()));
        }

        let mut account = Account::new(holder.clone(), U256::zero());
        account.balance = supply;

        let mut accounts = HashMap::new();
        accounts.insert(holder.clone(), account);

        Ok(Ledger {
            accounts,
            allowances: HashMap::new(),
            total_supply: supply,
        })
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn balance_of(&self, address: &Address) -> u128 {
        self.accounts
            .get(address)
            .map(|acc| acc.balance)
            .unwrap_or(0)
    }

    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    pub fn account_mut(&mut self, address: &Address) -> Option<&mut Account> {
        self.accounts.get_mut(address)
    }

    /// Fetch an account, creating it on first touch with the given snapshot
    pub fn touch(&mut self, address: &Address, reward_snapshot: U256) -> &mut Account {
        self.accounts.entry(address.clone()).or_insert_with(|| {
            debug!("creating account {}", address);
            Account::new(address.clone(), reward_snapshot)
        })
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Fail with `InsufficientBalance` unless `address` holds at least `amount`
    pub fn ensure_balance(&self, address: &Address, amount: u128) -> Result<()> {
        let available = self.balance_of(address);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account: address.clone(),
                requested: amount,
                available,
            });
        }
        Ok(())
    }

    /// Move `amount` out of `from`: `amount - tax` to `to` and `tax` to the
    /// collector. Everything is validated before the first balance changes,
    /// so an error leaves the ledger untouched.
    pub fn move_balance(
        &mut self,
        from: &Address,
        to: &Address,
        amount: u128,
        collector: &Address,
        tax: u128,
    ) -> Result<()> {
        if from.is_empty() || to.is_empty() {
            return Err(LedgerError::InvalidAddress("empty transfer party".to_string()));
        }
        if tax > amount {
            return Err(LedgerError::TaxExceedsAmount { tax, amount });
        }
        if tax > 0 && collector.is_empty() {
            return Err(LedgerError::InvalidAddress("empty tax collector".to_string()));
        }
        self.ensure_balance(from, amount)?;

        let net = amount - tax;

        // Credits cannot overflow: every balance is bounded by total_supply.
        if let Some(sender) = self.accounts.get_mut(from) {
            sender.balance -= amount;
        }
        self.touch(to, U256::zero()).balance += net;
        if tax > 0 {
            self.touch(collector, U256::zero()).balance += tax;
        }

        Ok(())
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: u128) -> Result<()> {
        if owner.is_empty() || spender.is_empty() {
            return Err(LedgerError::InvalidAddress("empty approval party".to_string()));
        }
        self.allowances
            .entry(owner.clone())
            .or_default()
            .insert(spender.clone(), amount);
        Ok(())
    }

    /// Check that `spender` may move `amount` on behalf of `owner`
    pub fn ensure_allowance(&self, owner: &Address, spender: &Address, amount: u128) -> Result<()> {
        let available = self.allowance(owner, spender);
        if available < amount {
            return Err(LedgerError::InsufficientAllowance {
                owner: owner.clone(),
                spender: spender.clone(),
                requested: amount,
                available,
            });
        }
        Ok(())
    }

    /// Consume allowance. An unlimited allowance is never decremented.
    pub fn spend_allowance(&mut self, owner: &Address, spender: &Address, amount: u128) -> Result<()> {
        self.ensure_allowance(owner, spender, amount)?;

        if let Some(current) = self
            .allowances
            .get_mut(owner)
            .and_then(|spenders| spenders.get_mut(spender))
        {
            if *current != UNLIMITED_ALLOWANCE {
                *current -= amount;
            }
        }
        Ok(())
    }

    /// Literal sum of balances. Verification only; never used by transfers.
    pub fn sum_of_balances(&self) -> u128 {
        self.accounts.values().map(|acc| acc.balance).sum()
    }

    pub fn is_conserved(&self) -> bool {
        self.sum_of_balances() == self.total_supply
    }
}
