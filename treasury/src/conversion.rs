//! Conversion trigger
//!
//! Once the tax held by the ledger reaches the threshold, the pending split
//! is converted in two phases:
//!
//! 1. reserve the pending split and plan the amounts
//! 2. call the venue: one swap covering half the liquidity share plus the
//!    whole reward share, then a liquidity deposit of the other half with its
//!    slice of the swap output
//!
//! The reservation is released whatever happens. A failed swap changes
//! nothing. A failed deposit after a successful swap keeps the unswapped
//! tokens pending and carries the paired asset into the next attempt, where
//! it is deposited with pending liquidity tokens before anything is swapped.

use log::{info, warn};
use reflect_core::Address;
use reflect_economics::math::mul_div;
use reflect_economics::TaxSplit;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TreasuryError, VenueError};
use crate::venue::{LiquidityReceipt, LiquidityVenue};
use crate::BPS;

/// Where conversion proceeds go and how much slippage is tolerated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRoute {
    /// Swap path, native token first
    pub path: Vec<Address>,
    /// Receives swap output and provides paired asset for liquidity
    pub vault: Address,
    /// Receives minted liquidity shares
    pub lp_recipient: Address,
    pub max_slippage_bps: u16,
    pub deadline: i64,
}

/// Token amounts for one conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionPlan {
    /// Native tokens deposited alongside the paired asset
    pub liquidity_tokens: u128,
    /// Native tokens swapped to pair with `liquidity_tokens`
    pub swap_for_liquidity: u128,
    /// Native tokens swapped into reward funding
    pub swap_for_rewards: u128,
    /// Paired asset left over from an earlier deposit
    pub carried_paired: u128,
}

impl ConversionPlan {
    pub fn from_split(split: TaxSplit, carried_paired: u128) -> Self {
        let swap_for_liquidity = split.liquidity / 2;
        Self {
            liquidity_tokens: split.liquidity - swap_for_liquidity,
            swap_for_liquidity,
            swap_for_rewards: split.reward,
            carried_paired,
        }
    }

    pub fn swap_amount(&self) -> u128 {
        self.swap_for_liquidity + self.swap_for_rewards
    }

    /// Divide swap output into (liquidity pairing, reward funding) in
    /// proportion to the tokens each part put in
    pub fn apportion(&self, paired_out: u128) -> Result<(u128, u128)> {
        let for_liquidity = mul_div(paired_out, self.swap_for_liquidity, self.swap_amount())?;
        Ok((for_liquidity, paired_out - for_liquidity))
    }
}

/// What a conversion did; the caller commits the ledger side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOutcome {
    pub plan: ConversionPlan,
    pub paired_received: u128,
    /// Settlement asset now in the vault for reward funding
    pub reward_amount: u128,
    /// Deposit of pending liquidity tokens against the carried paired asset
    pub carry_deposit: Option<LiquidityReceipt>,
    pub liquidity: Option<LiquidityReceipt>,
    pub liquidity_error: Option<VenueError>,
    /// Set when the swap failed after the carry deposit went through
    pub swap_error: Option<TreasuryError>,
    /// Paired asset held for the next deposit
    pub carried_paired: u128,
}

impl ConversionOutcome {
    pub fn liquidity_tokens_consumed(&self) -> u128 {
        let deposited = |r: Option<LiquidityReceipt>| r.map(|r| r.token_used).unwrap_or(0);
        deposited(self.carry_deposit) + self.plan.swap_for_liquidity + deposited(self.liquidity)
    }

    /// Both deposits of this run folded into one receipt
    pub fn liquidity_added(&self) -> Option<LiquidityReceipt> {
        match (self.carry_deposit, self.liquidity) {
            (Some(a), Some(b)) => Some(LiquidityReceipt {
                token_used: a.token_used + b.token_used,
                paired_used: a.paired_used + b.paired_used,
                liquidity_minted: a.liquidity_minted.saturating_add(b.liquidity_minted),
            }),
            (a, b) => a.or(b),
        }
    }

    pub fn reward_tokens_consumed(&self) -> u128 {
        self.plan.swap_for_rewards
    }

    /// Native tokens that left the ledger's tax account for the pool
    pub fn tokens_consumed(&self) -> u128 {
        self.liquidity_tokens_consumed() + self.reward_tokens_consumed()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionTrigger {
    threshold: u128,
    reserved: Option<TaxSplit>,
    carried_paired: u128,
    completed: u64,
    failed: u64,
}

impl ConversionTrigger {
    pub fn new(threshold: u128) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    pub fn threshold(&self) -> u128 {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: u128) {
        self.threshold = threshold;
    }

    pub fn in_progress(&self) -> bool {
        self.reserved.is_some()
    }

    pub fn reserved(&self) -> Option<TaxSplit> {
        self.reserved
    }

    pub fn carried_paired(&self) -> u128 {
        self.carried_paired
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn failed(&self) -> u64 {
        self.failed
    }

    pub fn should_trigger(&self, tax_held: u128) -> bool {
        !self.in_progress() && tax_held > 0 && tax_held >= self.threshold
    }

    /// Convert `pending` through `venue`
    pub fn run<V: LiquidityVenue + ?Sized>(
        &mut self,
        pending: TaxSplit,
        venue: &mut V,
        route: &ConversionRoute,
    ) -> Result<ConversionOutcome> {
        if self.in_progress() {
            return Err(TreasuryError::ConversionInProgress);
        }
        if pending.is_empty() && self.carried_paired == 0 {
            return Err(TreasuryError::NothingToConvert);
        }

        self.reserved = Some(pending);
        let result = self.execute(pending, venue, route);
        self.reserved = None;

        match &result {
            Ok(outcome) => {
                self.completed += 1;
                info!(
                    "converted {} tokens: {} paired received, {} for rewards",
                    outcome.tokens_consumed(),
                    outcome.paired_received,
                    outcome.reward_amount
                );
            }
            Err(e) => {
                self.failed += 1;
                warn!("conversion failed, tax stays pending: {}", e);
            }
        }
        result
    }

    fn execute<V: LiquidityVenue + ?Sized>(
        &mut self,
        pending: TaxSplit,
        venue: &mut V,
        route: &ConversionRoute,
    ) -> Result<ConversionOutcome> {
        let mut pending = pending;
        let mut carry_deposit = None;
        let mut liquidity_error = None;
        if self.carried_paired > 0 && pending.liquidity > 0 {
            match venue.add_liquidity(
                pending.liquidity,
                self.carried_paired,
                &route.vault,
                &route.lp_recipient,
            ) {
                Ok(receipt) => {
                    pending.liquidity = pending.liquidity.saturating_sub(receipt.token_used);
                    self.carried_paired = self.carried_paired.saturating_sub(receipt.paired_used);
                    carry_deposit = Some(receipt);
                }
                Err(e) => {
                    // liquidity share stays pending until the carry goes in
                    warn!("deposit of carried {} paired failed: {}", self.carried_paired, e);
                    pending.liquidity = 0;
                    liquidity_error = Some(e);
                }
            }
        }

        let mut plan = ConversionPlan::from_split(pending, self.carried_paired);
        let mut swap_error = None;
        let paired_received = match Self::swap(&plan, venue, route) {
            Ok(received) => received,
            Err(e) if carry_deposit.is_some() => {
                // the carry deposit already went through and must be reported
                warn!("swap after carry deposit failed: {}", e);
                plan = ConversionPlan::from_split(TaxSplit::default(), self.carried_paired);
                swap_error = Some(e);
                0
            }
            Err(e) => return Err(e),
        };

        let (paired_for_liquidity, reward_amount) = plan.apportion(paired_received)?;
        let paired_total = paired_for_liquidity + self.carried_paired;

        let mut outcome = ConversionOutcome {
            plan,
            paired_received,
            reward_amount,
            carry_deposit,
            liquidity: None,
            liquidity_error,
            swap_error,
            carried_paired: paired_total,
        };

        if plan.liquidity_tokens > 0 && paired_total > 0 {
            match venue.add_liquidity(
                plan.liquidity_tokens,
                paired_total,
                &route.vault,
                &route.lp_recipient,
            ) {
                Ok(receipt) => {
                    outcome.carried_paired = paired_total.saturating_sub(receipt.paired_used);
                    outcome.liquidity = Some(receipt);
                }
                Err(e) => {
                    warn!("liquidity deposit failed, carrying {} paired: {}", paired_total, e);
                    outcome.liquidity_error = Some(e);
                }
            }
        }

        self.carried_paired = outcome.carried_paired;
        Ok(outcome)
    }

    /// Swap the planned tokens into the vault, bounded by the route's slippage
    fn swap<V: LiquidityVenue + ?Sized>(
        plan: &ConversionPlan,
        venue: &mut V,
        route: &ConversionRoute,
    ) -> Result<u128> {
        if plan.swap_amount() == 0 {
            return Ok(0);
        }
        let quoted = venue
            .quote_paired_out(plan.swap_amount())
            .map_err(TreasuryError::ConversionFailed)?;
        let tolerance = BPS - (route.max_slippage_bps as u128).min(BPS);
        let min_out = mul_div(quoted, tolerance, BPS)?;

        venue
            .swap_exact_tokens_for_paired_asset(
                plan.swap_amount(),
                min_out,
                &route.path,
                &route.vault,
                route.deadline,
            )
            .map_err(TreasuryError::ConversionFailed)
    }
}
