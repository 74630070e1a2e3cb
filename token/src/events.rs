//! Ledger event journal

use primitive_types::U256;
use reflect_core::Address;
use reflect_economics::TransferKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// `from` is `None` for the deployment mint
    Transfer {
        from: Option<Address>,
        to: Address,
        value: u128,
    },
    Approval {
        owner: Address,
        spender: Address,
        value: u128,
    },
    TaxCollected {
        from: Address,
        kind: TransferKind,
        amount: u128,
        liquidity_share: u128,
        reward_share: u128,
    },
    EligibilityChanged {
        account: Address,
        eligible: bool,
        balance: u128,
    },
    RewardsFunded {
        amount: u128,
        eligible_supply: u128,
        global_index: U256,
    },
    /// Funding held back until someone is eligible
    FundingDeferred {
        amount: u128,
    },
    RewardsClaimed {
        account: Address,
        amount: u128,
    },
    /// Automatic payout failed; the amount stays claimable
    PayoutDeferred {
        account: Address,
        amount: u128,
        reason: String,
    },
    ConversionCompleted {
        tokens_converted: u128,
        paired_received: u128,
        reward_amount: u128,
        liquidity_tokens_added: u128,
    },
    ConversionFailed {
        reason: String,
    },
    TaxesUpdated {
        buy: u8,
        sell: u8,
        transfer: u8,
    },
    FeeExclusionUpdated {
        account: Address,
        excluded: bool,
    },
    OwnershipTransferred {
        previous: Address,
        new: Address,
    },
}
