//! Settlement asset ledger and reward vault

use log::debug;
use parking_lot::Mutex;
use reflect_core::Address;
use reflect_treasury::{SettlementAsset, SettlementError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Settlement ledger shared between the pool and the vault
pub type SharedSettlement = Arc<Mutex<SettlementLedger>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementLedger {
    asset: Address,
    balances: HashMap<Address, u128>,
    total_supply: u128,
}

impl SettlementLedger {
    pub fn new(asset: Address) -> Self {
        Self {
            asset,
            balances: HashMap::new(),
            total_supply: 0,
        }
    }

    pub fn shared(asset: Address) -> SharedSettlement {
        Arc::new(Mutex::new(Self::new(asset)))
    }

    pub fn asset(&self) -> &Address {
        &self.asset
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn balance_of(&self, address: &Address) -> u128 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    /// Wrap native value into the settlement asset
    pub fn mint(&mut self, to: &Address, amount: u128) {
        *self.balances.entry(to.clone()).or_insert(0) += amount;
        self.total_supply += amount;
    }

    pub fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), SettlementError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(SettlementError::InsufficientFunds {
                requested: amount,
                available,
            });
        }

        if let Some(balance) = self.balances.get_mut(from) {
            *balance -= amount;
        }
        *self.balances.entry(to.clone()).or_insert(0) += amount;
        Ok(())
    }
}

/// Vault holding settlement asset on behalf of the token's holders
#[derive(Debug, Clone)]
pub struct SettlementVault {
    address: Address,
    ledger: SharedSettlement,
    reject_payouts: bool,
    payouts: u64,
}

impl SettlementVault {
    pub fn new(address: Address, ledger: SharedSettlement) -> Self {
        Self {
            address,
            ledger,
            reject_payouts: false,
            payouts: 0,
        }
    }

    pub fn balance(&self) -> u128 {
        self.ledger.lock().balance_of(&self.address)
    }

    pub fn payouts(&self) -> u64 {
        self.payouts
    }

    /// Make every payout fail until switched back
    pub fn set_reject_payouts(&mut self, reject: bool) {
        self.reject_payouts = reject;
    }
}

impl SettlementAsset for SettlementVault {
    fn asset_address(&self) -> Address {
        self.ledger.lock().asset().clone()
    }

    fn vault_address(&self) -> Address {
        self.address.clone()
    }

    fn transfer(&mut self, to: &Address, amount: u128) -> Result<(), SettlementError> {
        if self.reject_payouts {
            return Err(SettlementError::Rejected("vault payouts disabled".to_string()));
        }
        self.ledger.lock().transfer(&self.address, to, amount)?;
        self.payouts += 1;
        debug!("vault paid {} to {}", amount, to);
        Ok(())
    }
}
