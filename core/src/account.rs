//! Account records

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::fmt;

/// Opaque account identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(value: impl Into<String>) -> Self {
        Address(value.into())
    }

    /// Derive a deterministic 20-byte address from a creator and a salt,
    /// the way contract addresses are derived from their deployer.
    pub fn derive(creator: &Address, salt: &str) -> Self {
        let mut hasher = Sha3_256::new();
        hasher.update(creator.0.as_bytes());
        hasher.update(b":");
        hasher.update(salt.as_bytes());
        let digest = hasher.finalize();

        Address(format!("0x{}", hex::encode(&digest[..20])))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Address::new(value)
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Address(value)
    }
}

/// Ledger entry for a single holder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: Address,
    pub balance: u128,
    /// No tax on transfers touching this account; never reward-eligible
    pub excluded_from_fees: bool,
    /// Cached `balance >= minimum holding && !excluded_from_fees`
    pub eligible: bool,
    /// Global reward index at the last settlement
    pub reward_snapshot: U256,
    /// Settled settlement-asset amount not yet paid out
    pub unclaimed_reward: u128,
}

impl Account {
    /// Fresh zero-balance account. The snapshot starts at the current
    /// global index so a new account never claims past rewards.
    pub fn new(address: Address, reward_snapshot: U256) -> Self {
        Self {
            address,
            balance: 0,
            excluded_from_fees: false,
            eligible: false,
            reward_snapshot,
            unclaimed_reward: 0,
        }
    }
}
