//! End-to-end scenarios for the reflection token against the in-memory pool
//! and settlement vault

use reflect_dex::{ConstantProductPool, SettlementLedger, SettlementVault, SharedSettlement};
use reflect_token::*;

type TestToken = ReflectionToken<ConstantProductPool, SettlementVault>;

const ONE_WETH: u128 = 1_000_000_000_000_000_000;

struct Deployment {
    token: TestToken,
    settlement: SharedSettlement,
    owner: Address,
    unit: u128,
}

impl Deployment {
    fn tokens(&self, whole: u128) -> u128 {
        whole * self.unit
    }

    fn weth_of(&self, address: &Address) -> u128 {
        self.settlement.lock().balance_of(address)
    }

    fn claimable(&self, address: &Address) -> u128 {
        self.token.calculate_claimable(address).unwrap()
    }
}

fn setup_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Deploy, then seed the pool with 2,500,000 tokens against 1 WETH from the owner
fn deploy(config: TokenConfig) -> Deployment {
    setup_logging();

    let owner = Address::from("0xowner");
    let address = Address::derive(&owner, &config.symbol);
    let settlement = SettlementLedger::shared(Address::from("0xweth"));
    let pool = ConstantProductPool::new(&address, settlement.clone());
    let vault = SettlementVault::new(Address::from("0xvault"), settlement.clone());

    let mut token = ReflectionToken::deploy(&config, owner.clone(), address, pool, vault)
        .expect("deployment should succeed");

    settlement.lock().mint(&owner, ONE_WETH);
    token
        .add_liquidity(&owner, config.to_base_units(2_500_000), ONE_WETH)
        .expect("seeding liquidity should succeed");

    Deployment {
        token,
        settlement,
        owner,
        unit: config.unit(),
    }
}

fn assert_invariants(token: &TestToken) {
    let snapshot = token.state_snapshot();

    let total: u128 = snapshot.accounts.iter().map(|acc| acc.balance).sum();
    assert_eq!(total, snapshot.total_supply, "balances must sum to the total supply");

    let eligible: u128 = snapshot
        .accounts
        .iter()
        .filter(|acc| acc.eligible)
        .map(|acc| acc.balance)
        .sum();
    assert_eq!(eligible, snapshot.eligible_supply, "eligible supply out of sync");

    assert!(
        snapshot
            .accounts
            .iter()
            .all(|acc| !(acc.eligible && acc.excluded_from_fees)),
        "an excluded account can never be eligible"
    );
    assert!(snapshot.pending_tax.total() <= snapshot.tax_held);
}

#[test]
fn test_deployment() {
    let d = deploy(TokenConfig::default());

    assert_eq!(d.token.name(), "SafeMoonLikeToken");
    assert_eq!(d.token.symbol(), "SMLT");
    assert_eq!(d.token.decimals(), 18);
    assert!(!d.token.liquidity_pool().is_empty());
    assert!(d.token.is_excluded_from_fees(d.token.liquidity_pool()));
    assert_eq!(d.token.balance_of(d.token.liquidity_pool()), d.tokens(2_500_000));
    assert_eq!(d.token.balance_of(&d.owner), d.tokens(997_500_000));
    assert_eq!(d.token.venue().reserves(), (d.tokens(2_500_000), ONE_WETH));
    assert_invariants(&d.token);
}

#[test]
fn test_set_taxes_bounds() {
    let mut d = deploy(TokenConfig::default());
    let owner = d.owner.clone();

    d.token.set_taxes(&owner, 6, 4).unwrap();
    assert_eq!(d.token.buy_tax(), 6);
    assert_eq!(d.token.sell_tax(), 4);

    let err = d.token.set_taxes(&owner, 11, 5).unwrap_err();
    assert!(err.is_tax_too_high());
    assert!(err.to_string().contains("Tax cannot exceed 10%"));
    assert_eq!((d.token.buy_tax(), d.token.sell_tax()), (6, 4), "rejected update must not apply");

    d.token.set_taxes(&owner, 10, 10).unwrap();
    assert_eq!((d.token.buy_tax(), d.token.sell_tax()), (10, 10));
    assert!(matches!(
        d.token.events().last(),
        Some(LedgerEvent::TaxesUpdated { buy: 10, sell: 10, .. })
    ));
}

#[test]
fn test_excluded_party_pays_no_tax() {
    let mut d = deploy(TokenConfig::default());
    let owner = d.owner.clone();
    let addr1 = Address::from("0xaddr1");
    let addr2 = Address::from("0xaddr2");
    let amount = d.tokens(1);

    d.token.exclude_from_fees(&owner, &addr1, true).unwrap();
    d.token.transfer(&owner, &addr1, amount).unwrap();
    assert_eq!(d.token.balance_of(&addr1), amount);

    d.token.exclude_from_fees(&owner, &addr1, false).unwrap();
    d.token.transfer(&owner, &addr2, amount).unwrap();
    assert_eq!(d.token.balance_of(&addr2), amount - amount * 5 / 100);
    assert_invariants(&d.token);
}

#[test]
fn test_sell_tax_applies_once_pool_is_included() {
    let mut d = deploy(TokenConfig::default());
    let owner = d.owner.clone();
    let pool = d.token.liquidity_pool().clone();
    let seller = Address::from("0xseller");
    let threshold = d.tokens(1_000_000);
    d.token.set_conversion_threshold(&owner, threshold).unwrap();
    d.token.set_taxes(&owner, 3, 7).unwrap();
    d.token.transfer(&owner, &seller, d.tokens(10_000)).unwrap();

    d.token.exclude_from_fees(&owner, &pool, false).unwrap();
    let receipt = d.token.transfer(&seller, &pool, d.tokens(1_000)).unwrap();

    assert_eq!(receipt.quote.kind, TransferKind::Sell);
    assert_eq!(receipt.quote.tax, d.tokens(70));
    assert!(receipt.conversion.is_none(), "a sell never nests a conversion");

    let receipt = d.token.transfer(&pool, &seller, d.tokens(1_000)).unwrap();
    assert_eq!(receipt.quote.kind, TransferKind::Buy);
    assert_eq!(receipt.quote.tax, d.tokens(30));
    assert_invariants(&d.token);
}

#[test]
fn test_peer_transfer_funds_existing_holders() {
    let mut config = TokenConfig::default();
    config.conversion_threshold = 1_000;
    let mut d = deploy(config);
    let owner = d.owner.clone();
    let b = Address::from("0xb");

    let held_before = d.token.tax_held_balance();
    let receipt = d.token.transfer(&owner, &b, d.tokens(5_000)).unwrap();

    assert!(receipt.conversion.is_none(), "250 tokens is below the threshold");
    assert_eq!(d.token.balance_of(&b), d.tokens(4_750));
    assert_eq!(d.token.tax_held_balance() - held_before, d.tokens(250));
    assert!(d.token.is_eligible(&b));
    assert_eq!(d.claimable(&b), 0, "fresh snapshot for the new holder");
    assert_eq!(d.claimable(&owner), 0);

    let report = d.token.process_conversion(&owner).unwrap();
    assert!(report.reward_amount > 0);
    assert!(report.reward_distributed);
    assert!(report.liquidity.is_some());

    let owner_claim = d.claimable(&owner);
    let b_claim = d.claimable(&b);
    assert!(owner_claim > 0);
    assert!(owner_claim > b_claim);

    // shares follow eligible balances
    let balance_ratio = d.token.balance_of(&owner) as f64 / d.token.balance_of(&b) as f64;
    let claim_ratio = owner_claim as f64 / b_claim.max(1) as f64;
    assert!(
        (claim_ratio / balance_ratio - 1.0).abs() < 1e-3,
        "claims {} vs balances {}",
        claim_ratio,
        balance_ratio
    );
    assert!(owner_claim + b_claim <= report.reward_amount);
    assert_invariants(&d.token);
}

#[test]
fn test_conversion_triggers_at_threshold() {
    let mut d = deploy(TokenConfig::default());
    let owner = d.owner.clone();
    let vault = d.token.settlement().vault_address();
    let seeded_shares = d.token.venue().shares_of(&owner);

    let receipt = d.token.transfer(&owner, &Address::from("0xb"), d.tokens(5_000)).unwrap();
    let report = match receipt.conversion {
        Some(ConversionStatus::Completed(report)) => report,
        other => panic!("expected a completed conversion, got {:?}", other),
    };

    assert!(report.tokens_converted > d.tokens(200));
    assert!(report.tokens_converted <= d.tokens(250));
    assert_eq!(d.token.tax_held_balance(), d.tokens(250) - report.tokens_converted);
    assert_eq!(d.token.pending_tax_split().total(), d.token.tax_held_balance());
    assert_eq!(d.token.pending_tax_split().reward, 0);
    assert!(d.weth_of(&vault) >= report.reward_amount);
    assert!(
        d.token.venue().shares_of(&owner) > seeded_shares,
        "LP shares go to the owner"
    );

    let events = d.token.events();
    assert!(events
        .iter()
        .any(|e| matches!(e, LedgerEvent::ConversionCompleted { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, LedgerEvent::RewardsFunded { .. })));
    assert_invariants(&d.token);
}

#[test]
fn test_invariants_hold_over_mixed_sequence() {
    let mut d = deploy(TokenConfig::default());
    let owner = d.owner.clone();
    let holders: Vec<Address> = (0..6).map(|i| Address::new(format!("0xholder{}", i))).collect();

    for (i, holder) in holders.iter().enumerate() {
        let amount = d.tokens(200 + 150 * i as u128);
        d.token.transfer(&owner, holder, amount).unwrap();
        assert_invariants(&d.token);
    }
    for round in 0..3 {
        for i in 0..holders.len() {
            let from = &holders[i];
            let to = &holders[(i + round + 1) % holders.len()];
            let amount = d.token.balance_of(from) / 3;
            d.token.transfer(from, to, amount).unwrap();
            assert_invariants(&d.token);
        }
    }

    let err = d.token.transfer(&holders[0], &holders[1], u128::MAX).unwrap_err();
    assert!(err.is_insufficient_balance());
    assert_invariants(&d.token);
}

#[test]
fn test_below_minimum_never_eligible() {
    let mut d = deploy(TokenConfig::default());
    let owner = d.owner.clone();
    let c = Address::from("0xc");

    d.token.transfer(&owner, &c, d.tokens(100)).unwrap();
    assert!(!d.token.is_eligible(&c));

    for i in 0..3 {
        let recipient = Address::new(format!("0xbuyer{}", i));
        d.token.transfer(&owner, &recipient, d.tokens(5_000)).unwrap();
        assert!(d.token.global_index() > primitive_types::U256::zero());
        assert!(!d.token.is_eligible(&c));
        assert_eq!(d.claimable(&c), 0);
    }

    assert!(!d.token.events().iter().any(|e| matches!(
        e,
        LedgerEvent::EligibilityChanged { account, eligible: true, .. } if account == &c
    )));
    assert_eq!(
        d.token.claim_reflections(&c),
        Err(TokenError::NothingToClaim(c.clone()))
    );
}

#[test]
fn test_exclusion_stops_accrual() {
    let mut d = deploy(TokenConfig::default());
    let owner = d.owner.clone();
    let x = Address::from("0xx");

    d.token.transfer(&owner, &x, d.tokens(10_000)).unwrap();
    d.token.transfer(&owner, &Address::from("0xy"), d.tokens(5_000)).unwrap();
    let accrued = d.claimable(&x);
    assert!(accrued > 0, "x was eligible during the second funding");

    let supply_before = d.token.eligible_supply();
    d.token.exclude_from_fees(&owner, &x, true).unwrap();
    assert!(!d.token.is_eligible(&x));
    assert_eq!(supply_before - d.token.eligible_supply(), d.token.balance_of(&x));

    let index_before = d.token.global_index();
    d.token.transfer(&owner, &Address::from("0xz"), d.tokens(5_000)).unwrap();
    assert!(d.token.global_index() > index_before);
    assert_eq!(d.claimable(&x), accrued, "settled reward is kept, nothing new accrues");

    // back in at the current index, no credit for the excluded period
    d.token.exclude_from_fees(&owner, &x, false).unwrap();
    assert!(d.token.is_eligible(&x));
    assert_eq!(d.claimable(&x), accrued);
    assert_invariants(&d.token);
}

#[test]
fn test_no_retroactive_credit() {
    let mut d = deploy(TokenConfig::default());
    let owner = d.owner.clone();
    let late = Address::from("0xlate");

    d.token.transfer(&owner, &Address::from("0xb"), d.tokens(5_000)).unwrap();
    assert!(d.token.global_index() > primitive_types::U256::zero());

    let threshold = d.tokens(1_000_000);
    d.token.set_conversion_threshold(&owner, threshold).unwrap();
    d.token.transfer(&owner, &late, d.tokens(1_000)).unwrap();

    assert!(d.token.is_eligible(&late));
    assert_eq!(d.claimable(&late), 0);
}

#[test]
fn test_eligibility_gap_preserves_settled_reward() {
    let mut d = deploy(TokenConfig::default());
    let owner = d.owner.clone();
    let a = Address::from("0xa");
    let sink = Address::from("0xsink");

    d.token.transfer(&owner, &a, d.tokens(1_000)).unwrap();
    d.token.transfer(&owner, &Address::from("0xb"), d.tokens(5_000)).unwrap();
    let accrued = d.claimable(&a);
    assert!(accrued > 0);

    // drop below the minimum, then come back
    let threshold = d.tokens(1_000_000);
    d.token.set_conversion_threshold(&owner, threshold).unwrap();
    d.token.transfer(&a, &sink, d.tokens(900)).unwrap();
    assert!(!d.token.is_eligible(&a));
    assert_eq!(d.token.account(&a).unwrap().unclaimed_reward, accrued);

    d.token.transfer(&owner, &a, d.tokens(1_000)).unwrap();
    assert!(d.token.is_eligible(&a));
    assert_eq!(d.claimable(&a), accrued);
}

#[test]
fn test_claim_pays_and_zeroes_debt() {
    let mut d = deploy(TokenConfig::default());
    let owner = d.owner.clone();
    let vault = d.token.settlement().vault_address();

    d.token.transfer(&owner, &Address::from("0xb"), d.tokens(5_000)).unwrap();
    let claimable = d.claimable(&owner);
    assert!(claimable > 0);

    let vault_before = d.weth_of(&vault);
    let weth_before = d.weth_of(&owner);
    let paid = d.token.claim_reflections(&owner).unwrap();

    assert_eq!(paid, claimable);
    assert_eq!(d.weth_of(&owner) - weth_before, paid);
    assert_eq!(vault_before - d.weth_of(&vault), paid);
    assert_eq!(d.claimable(&owner), 0);
    assert!(matches!(
        d.token.claim_reflections(&owner),
        Err(TokenError::NothingToClaim(_))
    ));
    assert_eq!(
        d.token.events().last(),
        Some(&LedgerEvent::RewardsClaimed {
            account: owner.clone(),
            amount: paid
        })
    );
}

#[test]
fn test_rejected_payout_keeps_claimable() {
    let mut d = deploy(TokenConfig::default());
    let owner = d.owner.clone();

    d.token.transfer(&owner, &Address::from("0xb"), d.tokens(5_000)).unwrap();
    let claimable = d.claimable(&owner);
    let snapshot = d.token.state_snapshot();
    let events = d.token.events().len();

    d.token.settlement_mut().set_reject_payouts(true);
    let err = d.token.claim_reflections(&owner).unwrap_err();

    assert!(err.is_payout_failed());
    assert_eq!(d.claimable(&owner), claimable);
    assert_eq!(d.token.state_snapshot(), snapshot, "a failed claim changes nothing");
    assert_eq!(d.token.events().len(), events);

    d.token.settlement_mut().set_reject_payouts(false);
    assert_eq!(d.token.claim_reflections(&owner).unwrap(), claimable);
}

#[test]
fn test_offline_venue_retains_tax_for_retry() {
    let mut d = deploy(TokenConfig::default());
    let owner = d.owner.clone();
    let b = Address::from("0xb");

    d.token.venue_mut().set_offline(true);
    let receipt = d.token.transfer(&owner, &b, d.tokens(5_000)).unwrap();

    match &receipt.conversion {
        Some(ConversionStatus::Failed(err)) => assert!(err.is_conversion_failed()),
        other => panic!("expected a failed conversion, got {:?}", other),
    }
    assert_eq!(d.token.balance_of(&b), d.tokens(4_750), "the transfer itself stands");
    assert_eq!(d.token.tax_held_balance(), d.tokens(250));
    assert_eq!(d.token.pending_tax_split().total(), d.tokens(250));
    assert!(d.token.global_index().is_zero());
    assert!(matches!(
        d.token.events().last(),
        Some(LedgerEvent::ConversionFailed { .. })
    ));
    assert_invariants(&d.token);

    d.token.venue_mut().set_offline(false);
    let receipt = d.token.transfer(&owner, &b, d.tokens(1_000)).unwrap();
    assert!(matches!(receipt.conversion, Some(ConversionStatus::Completed(_))));
    assert!(d.token.tax_held_balance() < d.tokens(50));
    assert!(!d.token.global_index().is_zero());
    assert_invariants(&d.token);
}

#[test]
fn test_rejected_deposit_carries_paired_asset() {
    let mut config = TokenConfig::default();
    config.conversion_threshold = 1_000;
    let mut d = deploy(config);
    let owner = d.owner.clone();

    d.token.transfer(&owner, &Address::from("0xb"), d.tokens(5_000)).unwrap();
    d.token.venue_mut().set_reject_liquidity(true);
    let report = d.token.process_conversion(&owner).unwrap();

    assert!(report.liquidity.is_none());
    assert!(report.liquidity_error.is_some());
    assert!(report.reward_distributed, "the reward part is funded anyway");
    assert_eq!(report.tokens_converted, d.tokens(200));
    assert_eq!(
        d.token.pending_tax_split(),
        TaxSplit {
            liquidity: d.tokens(50),
            reward: 0
        }
    );
    assert_eq!(d.token.tax_held_balance(), d.tokens(50));

    let carried = d.token.carried_paired();
    assert!(carried > 0);
    assert_eq!(d.weth_of(&Address::from("0xvault")), report.reward_amount + carried);

    d.token.venue_mut().set_reject_liquidity(false);
    let retry = d.token.process_conversion(&owner).unwrap();
    let deposited = retry.liquidity.expect("the carry pairs with the pending tokens");
    assert!(deposited.paired_used >= carried);
    assert_eq!(d.token.carried_paired(), 0, "carried asset must not be stranded");
    assert_eq!(d.weth_of(&Address::from("0xvault")), report.reward_amount);
    assert!(d.token.tax_held_balance() < d.tokens(50));
    assert_eq!(
        d.token.venue().reserves().0,
        d.token.balance_of(d.token.liquidity_pool())
    );
    assert_invariants(&d.token);
}

#[test]
fn test_tax_account_drain_rejected() {
    let mut config = TokenConfig::default();
    config.conversion_threshold = 1_000;
    let mut d = deploy(config);
    let owner = d.owner.clone();
    let thief = Address::from("0xthief");
    let tax_account = d.token.address().clone();

    d.token.transfer(&owner, &Address::from("0xb"), d.tokens(5_000)).unwrap();
    assert_eq!(d.token.tax_held_balance(), d.tokens(250));

    let err = d.token.transfer(&tax_account, &thief, d.tokens(250)).unwrap_err();
    assert_eq!(err, TokenError::TaxAccountLocked(tax_account.clone()));
    d.token.approve(&tax_account, &thief, d.tokens(250)).unwrap();
    assert!(d
        .token
        .transfer_from(&thief, &tax_account, &thief, d.tokens(250))
        .is_err());

    assert_eq!(d.token.balance_of(&thief), 0);
    assert_eq!(d.token.tax_held_balance(), d.tokens(250));
    assert!(d.token.pending_tax_split().total() <= d.token.tax_held_balance());
    assert_invariants(&d.token);

    // the venue and the ledger agree after the conversion commits
    let report = d.token.process_conversion(&owner).unwrap();
    assert!(report.tokens_converted > 0);
    assert_eq!(
        d.token.venue().reserves().0,
        d.token.balance_of(d.token.liquidity_pool())
    );
    assert!(!d.token.global_index().is_zero());
    assert_invariants(&d.token);
}

#[test]
fn test_conversion_commit_is_untaxed() {
    let mut config = TokenConfig::default();
    config.conversion_threshold = 1_000;
    let mut d = deploy(config);
    let owner = d.owner.clone();
    let tax_account = d.token.address().clone();
    let pool = d.token.liquidity_pool().clone();

    d.token.transfer(&owner, &Address::from("0xb"), d.tokens(5_000)).unwrap();
    let before = d.token.events().len();
    let report = d.token.process_conversion(&owner).unwrap();

    let events = &d.token.events()[before..];
    assert!(events.contains(&LedgerEvent::Transfer {
        from: Some(tax_account.clone()),
        to: pool,
        value: report.tokens_converted,
    }));
    assert!(!events
        .iter()
        .any(|e| matches!(e, LedgerEvent::TaxCollected { .. })));
    assert_eq!(
        d.token.tax_held_balance(),
        d.tokens(250) - report.tokens_converted
    );
    assert_invariants(&d.token);
}

#[test]
fn test_pool_transfers_do_not_trigger_conversion() {
    let mut config = TokenConfig::default();
    config.conversion_threshold = 1_000;
    let mut d = deploy(config);
    let owner = d.owner.clone();
    let alice = Address::from("0xalice");
    let pool = d.token.liquidity_pool().clone();

    d.token.transfer(&owner, &alice, d.tokens(10_000)).unwrap();
    let lowered = d.tokens(400);
    d.token.set_conversion_threshold(&owner, lowered).unwrap();
    assert_eq!(d.token.tax_held_balance(), d.tokens(500));

    let receipt = d.token.transfer(&alice, &pool, d.tokens(100)).unwrap();
    assert_eq!(receipt.quote.tax, 0, "the pool is fee-exempt");
    assert!(receipt.conversion.is_none());
    assert_eq!(d.token.tax_held_balance(), d.tokens(500));

    let receipt = d.token.transfer(&alice, &Address::from("0xcarol"), d.tokens(100)).unwrap();
    assert!(matches!(receipt.conversion, Some(ConversionStatus::Completed(_))));

    assert!(matches!(
        d.token.process_conversion(&alice),
        Err(TokenError::NotOwner(_))
    ));
}

#[test]
fn test_transfer_from_consumes_allowance() {
    let mut d = deploy(TokenConfig::default());
    let owner = d.owner.clone();
    let spender = Address::from("0xrouter");
    let recipient = Address::from("0xrecipient");

    d.token.approve(&owner, &spender, d.tokens(300)).unwrap();
    assert_eq!(d.token.allowance(&owner, &spender), d.tokens(300));

    d.token
        .transfer_from(&spender, &owner, &recipient, d.tokens(200))
        .unwrap();
    assert_eq!(d.token.allowance(&owner, &spender), d.tokens(100));
    assert_eq!(d.token.balance_of(&recipient), d.tokens(190));

    let snapshot = d.token.state_snapshot();
    let err = d
        .token
        .transfer_from(&spender, &owner, &recipient, d.tokens(200))
        .unwrap_err();
    assert!(matches!(
        err,
        TokenError::Ledger(reflect_core::LedgerError::InsufficientAllowance { .. })
    ));
    assert_eq!(d.token.state_snapshot(), snapshot);
    assert_eq!(d.token.allowance(&owner, &spender), d.tokens(100));
}

#[test]
fn test_auto_claim_pushes_rewards() {
    let mut config = TokenConfig::default();
    config.auto_claim_on_transfer = true;
    let mut d = deploy(config);
    let owner = d.owner.clone();
    let addr1 = Address::from("0xaddr1");
    let addr2 = Address::from("0xaddr2");

    d.token.transfer(&owner, &addr1, d.tokens(5_000)).unwrap();
    assert!(d.claimable(&owner) > 0);
    assert!(d.claimable(&addr1) > 0);

    let weth_before = d.weth_of(&addr1);
    let receipt = d.token.transfer(&addr1, &addr2, d.tokens(100)).unwrap();
    assert_eq!(receipt.payouts.len(), 1);
    assert_eq!(receipt.payouts[0].0, addr1);
    assert!(d.weth_of(&addr1) > weth_before);
    assert_eq!(d.claimable(&addr1), 0);
    assert!(d.claimable(&owner) > 0, "owner was not a party");

    d.token.settlement_mut().set_reject_payouts(true);
    let owed = d.claimable(&owner);
    let receipt = d.token.transfer(&owner, &addr2, d.tokens(100)).unwrap();
    assert!(receipt.payouts.is_empty());
    assert_eq!(d.claimable(&owner), owed);
    assert!(d.token.events().iter().any(|e| matches!(
        e,
        LedgerEvent::PayoutDeferred { account, .. } if account == &owner
    )));

    d.token.settlement_mut().set_reject_payouts(false);
    d.token.transfer(&owner, &addr2, d.tokens(100)).unwrap();
    assert_eq!(d.claimable(&owner), 0);
}

#[test]
fn test_funding_without_eligible_holders_is_held_back() {
    let mut config = TokenConfig::default();
    config.minimum_holding = 600_000_000;
    config.conversion_threshold = 1_000_000_000;
    let mut d = deploy(config);
    let owner = d.owner.clone();
    let alice = Address::from("0xalice");

    d.token.transfer(&owner, &alice, d.tokens(500_000_000)).unwrap();
    assert_eq!(d.token.eligible_supply(), 0);

    let report = d.token.process_conversion(&owner).unwrap();
    assert!(!report.reward_distributed);
    assert_eq!(d.token.undistributed_rewards(), report.reward_amount);
    assert!(d.token.global_index().is_zero());
    assert!(d
        .token
        .events()
        .iter()
        .any(|e| matches!(e, LedgerEvent::FundingDeferred { .. })));

    d.token.transfer(&owner, &alice, d.tokens(200_000_000)).unwrap();
    assert!(d.token.is_eligible(&alice));
    let second = d.token.process_conversion(&owner).unwrap();
    assert!(second.reward_distributed);

    let claimable = d.claimable(&alice);
    assert!(claimable > report.reward_amount, "held-back funding reaches the next holders");
    assert!(claimable + d.token.undistributed_rewards() <= report.reward_amount + second.reward_amount);
}

#[test]
fn test_ownership_and_admin_guards() {
    let mut d = deploy(TokenConfig::default());
    let owner = d.owner.clone();
    let heir = Address::from("0xheir");

    assert!(matches!(
        d.token.set_taxes(&heir, 1, 1),
        Err(TokenError::NotOwner(_))
    ));
    d.token.transfer_ownership(&owner, &heir).unwrap();
    assert_eq!(d.token.owner(), &heir);
    assert!(matches!(
        d.token.exclude_from_fees(&owner, &heir, true),
        Err(TokenError::NotOwner(_))
    ));
    d.token.set_allocations(&heir, 1, 4).unwrap();
    assert_eq!(d.token.tax_config().reward_allocation(), 4);
    assert!(d.token.set_allocations(&heir, 0, 0).is_err());
}

#[test]
fn test_snapshot_serializes() {
    let mut d = deploy(TokenConfig::default());
    let owner = d.owner.clone();
    d.token.transfer(&owner, &Address::from("0xb"), d.tokens(5_000)).unwrap();

    let snapshot = d.token.state_snapshot();
    let json = serde_json::to_string(&snapshot).unwrap();
    assert!(json.contains("\"symbol\":\"SMLT\""));

    let restored: TokenSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, snapshot);
    assert!(restored.accounts.len() >= 4);

    let events = d.token.drain_events();
    assert!(!events.is_empty());
    assert!(d.token.events().is_empty());
    serde_json::to_string(&events).unwrap();
}

#[test]
fn test_shared_handle_reads_consistent_view() {
    let d = deploy(TokenConfig::default());
    let owner = d.owner.clone();
    let b = Address::from("0xb");
    let five_thousand = d.tokens(5_000);
    let shared = SharedReflectionToken::new(d.token);

    shared.transfer(&owner, &b, five_thousand).unwrap();

    let (index, eligible_supply) = shared.reward_view();
    assert!(!index.is_zero());
    assert_eq!(eligible_supply, shared.read().eligible_supply());
    assert!(shared.calculate_claimable(&owner).unwrap() > 0);

    let paid = shared.claim_reflections(&owner).unwrap();
    assert!(paid > 0);
    assert_eq!(shared.calculate_claimable(&owner).unwrap(), 0);
}
