//! Property-based tests for the allocation engine
//!
//! Tests for:
//! - Power conservation: remaining power plus cast weight equals granted power
//! - Quorum exactness: queuing succeeds iff net votes reach the quorum
//! - Decimal round trips for common asset precisions
//! - Pool conservation: redemptions never pay out more than was deposited

use super::testing::*;
use crate::conversion::DecimalConverter;
use crate::error::AllocationError;
use crate::types::Support;
use proptest::prelude::*;

fn support_from(n: u8) -> Support {
    match n % 3 {
        0 => Support::Against,
        1 => Support::For,
        _ => Support::Abstain,
    }
}

proptest! {
    /// Every unit of power is either still held or sits in exactly one bucket.
    #[test]
    fn prop_power_conservation(
        deposits in (1u128..10_000, 1u128..10_000),
        votes in prop::collection::vec((any::<bool>(), 0u8..3, 1u128..5_000), 0..30),
    ) {
        let (mut mechanism, mut state) = setup();
        mechanism.signup(&mut state, ctx(alice(), START), deposits.0).unwrap();
        mechanism.signup(&mut state, ctx(bob(), START), deposits.1).unwrap();
        let id = mechanism
            .propose(&mut state, ctx(alice(), START), recipient(1), "fund")
            .unwrap();

        for (by_alice, support, weight) in votes {
            let voter = if by_alice { alice() } else { bob() };
            // Over-spending votes are rejected; both outcomes must conserve power.
            let _ = mechanism.cast_vote(
                &mut state,
                ctx(voter, VOTING_OPEN),
                id,
                support_from(support),
                weight,
                None,
            );
        }

        let tally = state.tally(id).unwrap();
        let cast = tally.shares_for + tally.shares_against + tally.shares_abstain;
        let remaining = state.voting_power(&alice()) + state.voting_power(&bob());
        prop_assert_eq!(cast + remaining, deposits.0 + deposits.1);

        for who in [alice(), bob()] {
            let record = state.voter(&who).unwrap();
            prop_assert!(record.voting_power <= record.power_granted);
        }
    }

    /// A proposal queues exactly when `for - against >= quorum`.
    #[test]
    fn prop_quorum_exactness(
        shares_for in 0u128..50,
        shares_against in 0u128..50,
    ) {
        let (mut mechanism, mut state, id) = registered_with_proposal(100);
        if shares_for > 0 {
            let voter = ctx(alice(), VOTING_OPEN);
            mechanism
                .cast_vote(&mut state, voter, id, Support::For, shares_for, None)
                .unwrap();
        }
        if shares_against > 0 {
            let voter = ctx(bob(), VOTING_OPEN);
            mechanism
                .cast_vote(&mut state, voter, id, Support::Against, shares_against, None)
                .unwrap();
        }
        mechanism
            .finalize_vote_tally(&mut state, ctx(CONTROLLER, VOTING_END))
            .unwrap();

        let result = mechanism.queue_proposal(&mut state, ctx(alice(), VOTING_END), id);
        let net = shares_for.saturating_sub(shares_against);
        if net >= QUORUM {
            prop_assert_eq!(result, Ok(net));
        } else {
            let is_no_quorum = matches!(result, Err(AllocationError::NoQuorum { .. }));
            prop_assert!(is_no_quorum);
            prop_assert_eq!(state.ledger().total_supply, 0);
        }
    }

    /// Bootstrap conversion is lossless for precisions at or below 18.
    #[test]
    fn prop_bootstrap_roundtrip(
        decimals in prop::sample::select(vec![6u8, 8, 18]),
        assets in 0u128..1_000_000_000_000_000_000_000,
    ) {
        let converter = DecimalConverter::new(decimals).unwrap();
        let shares = converter.convert_to_shares(assets, 0, 0).unwrap();
        prop_assert_eq!(converter.convert_to_assets(shares, 0, 0).unwrap(), assets);
    }

    /// 24-decimal assets round-trip only on multiples of 10^6 and never gain.
    #[test]
    fn prop_high_precision_roundtrip(units in 0u128..1_000_000_000_000, dust in 0u128..1_000_000) {
        let converter = DecimalConverter::new(24).unwrap();

        let exact = units * 1_000_000;
        let shares = converter.convert_to_shares(exact, 0, 0).unwrap();
        prop_assert_eq!(converter.convert_to_assets(shares, 0, 0).unwrap(), exact);

        let lossy = exact + dust;
        let shares = converter.convert_to_shares(lossy, 0, 0).unwrap();
        prop_assert!(converter.convert_to_assets(shares, 0, 0).unwrap() <= lossy);
    }

    /// Redeeming in arbitrary slices never pays more than the pool held.
    #[test]
    fn prop_redemptions_conserve_pool(
        deposit in 20u128..100_000,
        slices in prop::collection::vec(1u128..1_000, 1..20),
    ) {
        let (mut mechanism, mut state, id) = registered_with_proposal(deposit);
        vote_and_finalize(
            &mut mechanism,
            &mut state,
            &[(alice(), id, Support::For, deposit)],
        );
        mechanism
            .queue_proposal(&mut state, ctx(alice(), VOTING_END), id)
            .unwrap();

        let pool = state.ledger().total_assets_held;
        let open = VOTING_END + TIMELOCK;
        let mut paid = 0u128;
        for slice in slices {
            let held = state.ledger().balance_of(&recipient(1));
            if held == 0 {
                break;
            }
            let amount = slice.min(held);
            let holder = ctx(recipient(1), open);
            match mechanism.redeem(&mut state, holder, amount, carol(), recipient(1)) {
                Ok(assets) => paid += assets,
                Err(AllocationError::ZeroAssets) => {}
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
            prop_assert_eq!(paid + state.ledger().total_assets_held, pool);
        }
        prop_assert!(paid <= pool);
    }
}
