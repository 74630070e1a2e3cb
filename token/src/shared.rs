//! Thread-safe handle to a reflection token
//!
//! Operations need `&mut` access, so concurrent callers go through a single
//! writer lock. Reads share the lock and always see a state between two
//! complete operations.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use primitive_types::U256;
use reflect_core::Address;
use reflect_treasury::{LiquidityVenue, SettlementAsset};
use std::sync::Arc;

use crate::error::Result;
use crate::token::{ReflectionToken, TransferReceipt};

pub struct SharedReflectionToken<V, S> {
    inner: Arc<RwLock<ReflectionToken<V, S>>>,
}

impl<V, S> Clone for SharedReflectionToken<V, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: LiquidityVenue, S: SettlementAsset> SharedReflectionToken<V, S> {
    pub fn new(token: ReflectionToken<V, S>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(token)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, ReflectionToken<V, S>> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, ReflectionToken<V, S>> {
        self.inner.write()
    }

    pub fn transfer(&self, from: &Address, to: &Address, amount: u128) -> Result<TransferReceipt> {
        self.inner.write().transfer(from, to, amount)
    }

    pub fn claim_reflections(&self, account: &Address) -> Result<u128> {
        self.inner.write().claim_reflections(account)
    }

    pub fn balance_of(&self, address: &Address) -> u128 {
        self.inner.read().balance_of(address)
    }

    pub fn calculate_claimable(&self, address: &Address) -> Result<u128> {
        self.inner.read().calculate_claimable(address)
    }

    /// Global index and eligible supply read under one lock
    pub fn reward_view(&self) -> (U256, u128) {
        let token = self.inner.read();
        (token.global_index(), token.eligible_supply())
    }
}
