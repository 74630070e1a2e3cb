//! Reflection token context
//!
//! `ReflectionToken` owns the ledger, the eligibility tracker, the reward
//! accumulator, the tax engine and the conversion trigger, plus the two
//! external collaborators. Every operation runs to completion against this
//! one object; nothing is global.

use chrono::Utc;
use log::{debug, info, warn};
use primitive_types::U256;
use reflect_core::{Account, Address, Ledger, LedgerError};
use reflect_economics::{
    EconomicsError, EligibilityChange, EligibilityTracker, RewardAccumulator, TaxConfig, TaxEngine,
    TaxQuote, TaxSplit, TransferKind,
};
use reflect_treasury::{
    ConversionRoute, ConversionTrigger, LiquidityReceipt, LiquidityVenue, SettlementAsset,
    TreasuryError, VenueError,
};
use serde::{Deserialize, Serialize};

use crate::config::TokenConfig;
use crate::error::{Result, TokenError};
use crate::events::LedgerEvent;

/// Result of a conversion that reached the venue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionReport {
    pub tokens_converted: u128,
    pub paired_received: u128,
    /// Settlement asset handed to the accumulator
    pub reward_amount: u128,
    /// False when no one was eligible and the funding was held back
    pub reward_distributed: bool,
    pub liquidity: Option<LiquidityReceipt>,
    /// Set when the swap went through but the deposit did not
    pub liquidity_error: Option<VenueError>,
    /// Set when carried paired asset was deposited but the swap failed
    pub swap_error: Option<TreasuryError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionStatus {
    Completed(ConversionReport),
    Failed(TokenError),
}

/// What a successful transfer did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub quote: TaxQuote,
    /// Automatic reward payouts made to the parties
    pub payouts: Vec<(Address, u128)>,
    /// Present when the transfer triggered a conversion
    pub conversion: Option<ConversionStatus>,
}

/// Serialisable read-only view of the token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSnapshot {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub address: Address,
    pub owner: Address,
    pub liquidity_pool: Address,
    pub total_supply: u128,
    pub eligible_supply: u128,
    pub tax_held: u128,
    pub pending_tax: TaxSplit,
    pub global_index: U256,
    pub undistributed_rewards: u128,
    pub taxes: TaxConfig,
    pub accounts: Vec<Account>,
}

pub struct ReflectionToken<V, S> {
    name: String,
    symbol: String,
    decimals: u8,
    /// The token's own account; collected tax is held here
    address: Address,
    owner: Address,
    liquidity_pool: Address,
    ledger: Ledger,
    eligibility: EligibilityTracker,
    rewards: RewardAccumulator,
    taxes: TaxEngine,
    conversion: ConversionTrigger,
    auto_claim: bool,
    max_slippage_bps: u16,
    swap_deadline_secs: i64,
    venue: V,
    settlement: S,
    events: Vec<LedgerEvent>,
}

impl<V: LiquidityVenue, S: SettlementAsset> ReflectionToken<V, S> {
    /// Mint the supply to `deployer` and wire the collaborators. The token's
    /// own account, the pool and the settlement vault start fee-exempt.
    pub fn deploy(
        config: &TokenConfig,
        deployer: Address,
        address: Address,
        venue: V,
        settlement: S,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|e| TokenError::Config(e.to_string()))?;
        if address.is_empty() {
            return Err(LedgerError::InvalidAddress("empty token address".to_string()).into());
        }

        let supply = config.total_supply_units();
        let liquidity_pool = venue.pool_address();
        let mut ledger = Ledger::with_initial_supply(&deployer, supply)?;
        let mut eligibility = EligibilityTracker::new(config.minimum_holding_units());
        let rewards = RewardAccumulator::new();

        for exempt in [&address, &liquidity_pool, &settlement.vault_address()] {
            ledger.touch(exempt, rewards.global_index()).excluded_from_fees = true;
        }
        if let Some(account) = ledger.account_mut(&deployer) {
            eligibility.after_change(account, &rewards);
        }

        info!(
            "deployed {} ({}) at {}: supply {}, pool {}",
            config.name, config.symbol, address, supply, liquidity_pool
        );

        Ok(Self {
            name: config.name.clone(),
            symbol: config.symbol.clone(),
            decimals: config.decimals,
            address,
            owner: deployer.clone(),
            liquidity_pool,
            ledger,
            eligibility,
            rewards,
            taxes: TaxEngine::new(config.tax_config()?),
            conversion: ConversionTrigger::new(config.conversion_threshold_units()),
            auto_claim: config.auto_claim_on_transfer,
            max_slippage_bps: config.max_slippage_bps,
            swap_deadline_secs: config.swap_deadline_secs,
            venue,
            settlement,
            events: vec![LedgerEvent::Transfer {
                from: None,
                to: deployer,
                value: supply,
            }],
        })
    }

    // ---- query surface -------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn liquidity_pool(&self) -> &Address {
        &self.liquidity_pool
    }

    pub fn total_supply(&self) -> u128 {
        self.ledger.total_supply()
    }

    pub fn balance_of(&self, address: &Address) -> u128 {
        self.ledger.balance_of(address)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.ledger.allowance(owner, spender)
    }

    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.ledger.account(address)
    }

    pub fn buy_tax(&self) -> u8 {
        self.taxes.config().buy_tax()
    }

    pub fn sell_tax(&self) -> u8 {
        self.taxes.config().sell_tax()
    }

    pub fn transfer_tax(&self) -> u8 {
        self.taxes.config().transfer_tax()
    }

    pub fn tax_config(&self) -> &TaxConfig {
        self.taxes.config()
    }

    pub fn is_excluded_from_fees(&self, address: &Address) -> bool {
        self.ledger
            .account(address)
            .map(|acc| acc.excluded_from_fees)
            .unwrap_or(false)
    }

    pub fn is_eligible(&self, address: &Address) -> bool {
        self.ledger
            .account(address)
            .map(|acc| acc.eligible)
            .unwrap_or(false)
    }

    pub fn minimum_holding(&self) -> u128 {
        self.eligibility.minimum_holding()
    }

    pub fn eligible_supply(&self) -> u128 {
        self.eligibility.eligible_supply()
    }

    pub fn global_index(&self) -> U256 {
        self.rewards.global_index()
    }

    pub fn undistributed_rewards(&self) -> u128 {
        self.rewards.undistributed()
    }

    /// Native tokens collected as tax and not yet converted
    pub fn tax_held_balance(&self) -> u128 {
        self.ledger.balance_of(&self.address)
    }

    pub fn pending_tax_split(&self) -> TaxSplit {
        self.taxes.pending()
    }

    /// Paired asset swapped for liquidity but not yet deposited
    pub fn carried_paired(&self) -> u128 {
        self.conversion.carried_paired()
    }

    pub fn conversion_threshold(&self) -> u128 {
        self.conversion.threshold()
    }

    /// Settled plus pending reward; never mutates
    pub fn calculate_claimable(&self, address: &Address) -> Result<u128> {
        match self.ledger.account(address) {
            Some(account) => Ok(self.rewards.claimable(account)?),
            None => Ok(0),
        }
    }

    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn venue(&self) -> &V {
        &self.venue
    }

    pub fn venue_mut(&mut self) -> &mut V {
        &mut self.venue
    }

    pub fn settlement(&self) -> &S {
        &self.settlement
    }

    pub fn settlement_mut(&mut self) -> &mut S {
        &mut self.settlement
    }

    pub fn state_snapshot(&self) -> TokenSnapshot {
        let mut accounts: Vec<Account> = self.ledger.accounts().cloned().collect();
        accounts.sort_by(|a, b| a.address.cmp(&b.address));

        TokenSnapshot {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            decimals: self.decimals,
            address: self.address.clone(),
            owner: self.owner.clone(),
            liquidity_pool: self.liquidity_pool.clone(),
            total_supply: self.total_supply(),
            eligible_supply: self.eligible_supply(),
            tax_held: self.tax_held_balance(),
            pending_tax: self.pending_tax_split(),
            global_index: self.global_index(),
            undistributed_rewards: self.undistributed_rewards(),
            taxes: self.taxes.config().clone(),
            accounts,
        }
    }

    // ---- transfers ----------------------------------------------------

    pub fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> Result<TransferReceipt> {
        self.ensure_not_tax_account(from)?;
        let quote = self.move_tokens(from, to, amount, false)?;
        Ok(self.after_transfer(from, to, quote))
    }

    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: u128) -> Result<()> {
        self.ledger.approve(owner, spender, amount)?;
        self.events.push(LedgerEvent::Approval {
            owner: owner.clone(),
            spender: spender.clone(),
            value: amount,
        });
        Ok(())
    }

    /// Taxed transfer on behalf of `from`, consuming `spender`'s allowance
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<TransferReceipt> {
        self.ensure_not_tax_account(from)?;
        self.ledger.ensure_allowance(from, spender, amount)?;
        let quote = self.move_tokens(from, to, amount, false)?;
        // checked above and untouched by the move
        self.ledger.spend_allowance(from, spender, amount)?;
        Ok(self.after_transfer(from, to, quote))
    }

    fn ensure_not_tax_account(&self, from: &Address) -> Result<()> {
        if from == &self.address {
            return Err(TokenError::TaxAccountLocked(from.clone()));
        }
        Ok(())
    }

    /// Core balance move: quote, settle, mutate, re-evaluate. Nothing is
    /// written until every fallible step has passed.
    fn move_tokens(
        &mut self,
        from: &Address,
        to: &Address,
        amount: u128,
        force_exempt: bool,
    ) -> Result<TaxQuote> {
        if from.is_empty() || to.is_empty() {
            return Err(LedgerError::InvalidAddress("empty transfer party".to_string()).into());
        }
        self.ledger.ensure_balance(from, amount)?;

        let kind = TransferKind::classify(from, to, &self.liquidity_pool);
        let exempt = force_exempt
            || self.is_excluded_from_fees(from)
            || self.is_excluded_from_fees(to);
        let quote = self.taxes.quote(kind, amount, exempt)?;
        let split = self.taxes.split(quote.tax)?;

        let parties = self.parties(from, to, quote.tax > 0);
        // settlement must not be able to fail once balances start moving
        for party in &parties {
            if let Some(account) = self.ledger.account(party) {
                self.rewards.pending(account)?;
            }
        }

        let index = self.rewards.global_index();
        for party in &parties {
            let account = self.ledger.touch(party, index);
            self.eligibility.before_change(account, &self.rewards)?;
        }

        self.ledger
            .move_balance(from, to, amount, &self.address, quote.tax)?;

        let mut events = Vec::new();
        for party in &parties {
            if let Some(account) = self.ledger.account_mut(party) {
                if let Some(change) = self.eligibility.after_change(account, &self.rewards) {
                    events.push(LedgerEvent::EligibilityChanged {
                        account: party.clone(),
                        eligible: change == EligibilityChange::Joined,
                        balance: account.balance,
                    });
                }
            }
        }

        events.insert(
            0,
            LedgerEvent::Transfer {
                from: Some(from.clone()),
                to: to.clone(),
                value: quote.net,
            },
        );
        if quote.tax > 0 {
            self.taxes.record(split);
            events.insert(
                1,
                LedgerEvent::Transfer {
                    from: Some(from.clone()),
                    to: self.address.clone(),
                    value: quote.tax,
                },
            );
            events.insert(
                2,
                LedgerEvent::TaxCollected {
                    from: from.clone(),
                    kind,
                    amount: quote.tax,
                    liquidity_share: split.liquidity,
                    reward_share: split.reward,
                },
            );
        }
        self.events.extend(events);

        debug!(
            "{:?} transfer {} -> {}: {} (tax {} at {}%)",
            kind, from, to, amount, quote.tax, quote.rate
        );
        Ok(quote)
    }

    fn parties(&self, from: &Address, to: &Address, with_collector: bool) -> Vec<Address> {
        let mut parties = vec![from.clone()];
        if to != from {
            parties.push(to.clone());
        }
        if with_collector && !parties.contains(&self.address) {
            parties.push(self.address.clone());
        }
        parties
    }

    fn after_transfer(&mut self, from: &Address, to: &Address, quote: TaxQuote) -> TransferReceipt {
        let mut payouts = Vec::new();
        if self.auto_claim {
            for party in self.parties(from, to, false) {
                if let Some(amount) = self.auto_payout(&party) {
                    payouts.push((party, amount));
                }
            }
        }

        let conversion = if !quote.kind.touches_pool()
            && self.conversion.should_trigger(self.tax_held_balance())
        {
            Some(match self.convert() {
                Ok(report) => ConversionStatus::Completed(report),
                Err(e) => ConversionStatus::Failed(e),
            })
        } else {
            None
        };

        TransferReceipt {
            quote,
            payouts,
            conversion,
        }
    }

    fn auto_payout(&mut self, party: &Address) -> Option<u128> {
        if self.is_excluded_from_fees(party) {
            return None;
        }
        let amount = match self.calculate_claimable(party) {
            Ok(0) => return None,
            Ok(amount) => amount,
            Err(e) => {
                warn!("automatic payout to {} deferred: {}", party, e);
                self.events.push(LedgerEvent::PayoutDeferred {
                    account: party.clone(),
                    amount: 0,
                    reason: e.to_string(),
                });
                return None;
            }
        };

        match self.claim_reflections(party) {
            Ok(paid) => Some(paid),
            Err(e) => {
                warn!("automatic payout of {} to {} deferred: {}", amount, party, e);
                self.events.push(LedgerEvent::PayoutDeferred {
                    account: party.clone(),
                    amount,
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    // ---- rewards ------------------------------------------------------

    /// Settle `account` and pay its whole unclaimed reward. If the payout
    /// is rejected nothing changes.
    pub fn claim_reflections(&mut self, account: &Address) -> Result<u128> {
        let mut settled = match self.ledger.account(account) {
            Some(existing) => existing.clone(),
            None => return Err(TokenError::NothingToClaim(account.clone())),
        };
        self.rewards.settle(&mut settled)?;

        let amount = settled.unclaimed_reward;
        if amount == 0 {
            return Err(TokenError::NothingToClaim(account.clone()));
        }

        if let Err(reason) = self.settlement.transfer(account, amount) {
            warn!("payout of {} to {} failed: {}", amount, account, reason);
            return Err(TreasuryError::PayoutFailed {
                account: account.clone(),
                amount,
                reason,
            }
            .into());
        }

        settled.unclaimed_reward = 0;
        if let Some(stored) = self.ledger.account_mut(account) {
            *stored = settled;
        }
        self.rewards.record_claim(amount);
        self.events.push(LedgerEvent::RewardsClaimed {
            account: account.clone(),
            amount,
        });

        info!("{} claimed {}", account, amount);
        Ok(amount)
    }

    /// Hand settlement asset to the accumulator. Funding with nobody
    /// eligible is held back and reported as not distributed.
    fn fund_rewards(&mut self, amount: u128) -> Result<bool> {
        if amount == 0 && self.rewards.undistributed() == 0 {
            return Ok(false);
        }

        let eligible_supply = self.eligibility.eligible_supply();
        match self.rewards.fund(amount, eligible_supply) {
            Ok(_) => {
                self.events.push(LedgerEvent::RewardsFunded {
                    amount,
                    eligible_supply,
                    global_index: self.rewards.global_index(),
                });
                info!("funded {} across eligible supply {}", amount, eligible_supply);
                Ok(true)
            }
            Err(EconomicsError::NoEligibleHolders { amount }) => {
                self.events.push(LedgerEvent::FundingDeferred { amount });
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    // ---- conversion ---------------------------------------------------

    fn convert(&mut self) -> Result<ConversionReport> {
        // tokens sent straight to the token's account join the pending split
        let pending = self.taxes.pending();
        let surplus = self.tax_held_balance().saturating_sub(pending.total());
        if surplus > 0 {
            let split = self.taxes.split(surplus)?;
            self.taxes.record(split);
        }
        // the commit below must be able to move everything the venue takes
        self.taxes.cap_pending(self.tax_held_balance())?;

        let route = ConversionRoute {
            path: vec![self.address.clone(), self.settlement.asset_address()],
            vault: self.settlement.vault_address(),
            lp_recipient: self.owner.clone(),
            max_slippage_bps: self.max_slippage_bps,
            deadline: Utc::now().timestamp() + self.swap_deadline_secs,
        };

        let outcome = match self
            .conversion
            .run(self.taxes.pending(), &mut self.venue, &route)
        {
            Ok(outcome) => outcome,
            Err(e) => {
                self.events.push(LedgerEvent::ConversionFailed {
                    reason: e.to_string(),
                });
                return Err(e.into());
            }
        };

        // the venue now holds the swapped and deposited tokens
        let consumed = outcome.tokens_consumed();
        if consumed > 0 {
            let token = self.address.clone();
            let pool = self.liquidity_pool.clone();
            self.move_tokens(&token, &pool, consumed, true)?;
        }
        self.taxes.consume(
            outcome.liquidity_tokens_consumed(),
            outcome.reward_tokens_consumed(),
        );
        let reward_distributed = self.fund_rewards(outcome.reward_amount)?;

        let liquidity = outcome.liquidity_added();
        let liquidity_tokens_added = liquidity.map(|r| r.token_used).unwrap_or(0);
        self.events.push(LedgerEvent::ConversionCompleted {
            tokens_converted: consumed,
            paired_received: outcome.paired_received,
            reward_amount: outcome.reward_amount,
            liquidity_tokens_added,
        });
        if let Some(e) = &outcome.liquidity_error {
            self.events.push(LedgerEvent::ConversionFailed {
                reason: format!("liquidity deposit: {}", e),
            });
        }
        if let Some(e) = &outcome.swap_error {
            self.events.push(LedgerEvent::ConversionFailed {
                reason: format!("swap: {}", e),
            });
        }

        Ok(ConversionReport {
            tokens_converted: consumed,
            paired_received: outcome.paired_received,
            reward_amount: outcome.reward_amount,
            reward_distributed,
            liquidity,
            liquidity_error: outcome.liquidity_error,
            swap_error: outcome.swap_error,
        })
    }

    /// Run the conversion now, regardless of the threshold
    pub fn process_conversion(&mut self, caller: &Address) -> Result<ConversionReport> {
        self.ensure_owner(caller)?;
        self.convert()
    }

    /// Seed the pool: move `token_amount` from `provider` into the pool
    /// alongside `paired_amount` of the provider's settlement asset
    pub fn add_liquidity(
        &mut self,
        provider: &Address,
        token_amount: u128,
        paired_amount: u128,
    ) -> Result<LiquidityReceipt> {
        self.ensure_not_tax_account(provider)?;
        self.ledger.ensure_balance(provider, token_amount)?;

        let receipt = self
            .venue
            .add_liquidity(token_amount, paired_amount, provider, provider)?;

        let pool = self.liquidity_pool.clone();
        self.move_tokens(provider, &pool, receipt.token_used, true)?;
        info!(
            "{} added {} tokens and {} paired to the pool",
            provider, receipt.token_used, receipt.paired_used
        );
        Ok(receipt)
    }

    // ---- administration -----------------------------------------------

    fn ensure_owner(&self, caller: &Address) -> Result<()> {
        if caller != &self.owner {
            return Err(TokenError::NotOwner(caller.clone()));
        }
        Ok(())
    }

    fn record_taxes_updated(&mut self) {
        let config = self.taxes.config();
        self.events.push(LedgerEvent::TaxesUpdated {
            buy: config.buy_tax(),
            sell: config.sell_tax(),
            transfer: config.transfer_tax(),
        });
    }

    /// Replace both buy and sell rates; each must be at most 10%
    pub fn set_taxes(&mut self, caller: &Address, buy: u8, sell: u8) -> Result<()> {
        self.ensure_owner(caller)?;
        self.taxes.set_taxes(buy, sell)?;
        self.record_taxes_updated();
        Ok(())
    }

    pub fn set_transfer_tax(&mut self, caller: &Address, rate: u8) -> Result<()> {
        self.ensure_owner(caller)?;
        self.taxes.set_transfer_tax(rate)?;
        self.record_taxes_updated();
        Ok(())
    }

    pub fn set_allocations(&mut self, caller: &Address, liquidity: u8, reward: u8) -> Result<()> {
        self.ensure_owner(caller)?;
        self.taxes.set_allocations(liquidity, reward)?;
        Ok(())
    }

    pub fn set_conversion_threshold(&mut self, caller: &Address, threshold: u128) -> Result<()> {
        self.ensure_owner(caller)?;
        self.conversion.set_threshold(threshold);
        info!("conversion threshold set to {}", threshold);
        Ok(())
    }

    pub fn set_auto_claim(&mut self, caller: &Address, enabled: bool) -> Result<()> {
        self.ensure_owner(caller)?;
        self.auto_claim = enabled;
        Ok(())
    }

    /// Excluding settles the account and removes it from the eligible
    /// supply; re-including re-evaluates it at the current index.
    pub fn exclude_from_fees(&mut self, caller: &Address, account: &Address, excluded: bool) -> Result<()> {
        self.ensure_owner(caller)?;
        if account.is_empty() {
            return Err(LedgerError::InvalidAddress("empty account".to_string()).into());
        }
        if let Some(existing) = self.ledger.account(account) {
            if existing.excluded_from_fees == excluded {
                return Ok(());
            }
            self.rewards.pending(existing)?;
        }

        let index = self.rewards.global_index();
        let record = self.ledger.touch(account, index);
        self.eligibility.before_change(record, &self.rewards)?;
        record.excluded_from_fees = excluded;
        let change = self.eligibility.after_change(record, &self.rewards);
        let balance = record.balance;

        self.events.push(LedgerEvent::FeeExclusionUpdated {
            account: account.clone(),
            excluded,
        });
        if let Some(change) = change {
            self.events.push(LedgerEvent::EligibilityChanged {
                account: account.clone(),
                eligible: change == EligibilityChange::Joined,
                balance,
            });
        }

        info!("{} fee exclusion set to {}", account, excluded);
        Ok(())
    }

    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: &Address) -> Result<()> {
        self.ensure_owner(caller)?;
        if new_owner.is_empty() {
            return Err(LedgerError::InvalidAddress("empty owner".to_string()).into());
        }

        let previous = std::mem::replace(&mut self.owner, new_owner.clone());
        self.events.push(LedgerEvent::OwnershipTransferred {
            previous,
            new: new_owner.clone(),
        });
        info!("ownership transferred to {}", new_owner);
        Ok(())
    }
}
