//! Burning shares for pooled assets.

use super::guards;
use super::state::MechanismState;
use super::AllocationMechanism;
use crate::asset::AssetLedger;
use crate::error::{AllocationError, AllocationResult};
use crate::events::LedgerEvent;
use crate::strategy::AllocationStrategy;
use crate::types::{Address, CallContext};
use tracing::info;

impl<S: AllocationStrategy, A: AssetLedger> AllocationMechanism<S, A> {
    /// Burn `shares` held by `owner` and pay the proportional assets to
    /// `receiver`. A caller other than `owner` spends its allowance.
    ///
    /// Open from the global redemption start until the grace period ends,
    /// when the residual pool passes to `sweep`. Returns the assets paid.
    pub fn redeem(
        &mut self,
        state: &mut MechanismState,
        ctx: CallContext,
        shares: u128,
        receiver: Address,
        owner: Address,
    ) -> AllocationResult<u128> {
        self.atomic(state, &ctx, |this, state| {
            this.redeem_inner(state, &ctx, shares, receiver, owner)
        })
    }

    fn redeem_inner(
        &mut self,
        state: &mut MechanismState,
        ctx: &CallContext,
        shares: u128,
        receiver: Address,
        owner: Address,
    ) -> AllocationResult<u128> {
        guards::redemption_open(state, ctx.now)?;
        guards::non_zero(&receiver)?;
        if shares == 0 {
            return Err(AllocationError::ZeroShares);
        }

        let available = state.ledger.balance_of(&owner);
        if available < shares {
            return Err(AllocationError::InsufficientShares {
                requested: shares,
                available,
            });
        }
        if ctx.caller != owner {
            state.ledger.spend_allowance(&owner, &ctx.caller, shares)?;
        }

        let assets = state.convert_to_assets(shares)?;
        if assets == 0 {
            return Err(AllocationError::ZeroAssets);
        }

        state.ledger.burn(&owner, shares)?;
        state.ledger.total_assets_held = state
            .ledger
            .total_assets_held
            .checked_sub(assets)
            .ok_or(AllocationError::ArithmeticOverflow)?;

        state.events.record(
            ctx.now,
            LedgerEvent::Transfer {
                from: owner,
                to: Address::ZERO,
                amount: shares,
            },
        );
        state.events.record(
            ctx.now,
            LedgerEvent::Redeemed {
                caller: ctx.caller,
                receiver,
                owner,
                assets,
                shares,
            },
        );

        let asset = state.config.asset;
        let mechanism = state.config.mechanism;
        self.assets
            .transfer_out(&asset, &mechanism, &receiver, assets)?;

        info!(owner = %owner, receiver = %receiver, shares, assets, "shares redeemed");
        Ok(assets)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::mechanism::ProposalState;
    use crate::types::Support;

    /// Pool of 200 assets, 100 shares minted to recipient(1).
    fn queued() -> (TestMechanism, MechanismState) {
        let (mut mechanism, mut state, id) = registered_with_proposal(100);
        vote_and_finalize(&mut mechanism, &mut state, &[(alice(), id, Support::For, 100)]);
        mechanism
            .queue_proposal(&mut state, ctx(alice(), VOTING_END), id)
            .unwrap();
        (mechanism, state)
    }

    const OPEN: u64 = VOTING_END + TIMELOCK;

    #[test]
    fn test_redeem_pays_proportional_assets() {
        let (mut mechanism, mut state) = queued();

        let paid = mechanism
            .redeem(&mut state, ctx(recipient(1), OPEN), 40, recipient(1), recipient(1))
            .unwrap();

        assert_eq!(paid, 80);
        assert_eq!(state.ledger().balance_of(&recipient(1)), 60);
        assert_eq!(state.ledger().total_supply, 60);
        assert_eq!(state.ledger().total_assets_held, 120);
        assert_eq!(mechanism.assets().balance_of(&ASSET, &recipient(1)), 80);
    }

    #[test]
    fn test_redeem_before_timelock() {
        let (mut mechanism, mut state) = queued();
        let owner = recipient(1);
        assert_eq!(
            mechanism.redeem(&mut state, ctx(owner, OPEN - 1), 1, owner, owner),
            Err(AllocationError::RedemptionNotStarted)
        );
    }

    #[test]
    fn test_redeem_input_checks() {
        let (mut mechanism, mut state) = queued();

        assert_eq!(
            mechanism.redeem(&mut state, ctx(recipient(1), OPEN), 0, recipient(1), recipient(1)),
            Err(AllocationError::ZeroShares)
        );
        assert_eq!(
            mechanism.redeem(&mut state, ctx(recipient(1), OPEN), 1, Address::ZERO, recipient(1)),
            Err(AllocationError::InvalidRecipient)
        );
        assert_eq!(
            mechanism.redeem(&mut state, ctx(recipient(1), OPEN), 101, recipient(1), recipient(1)),
            Err(AllocationError::InsufficientShares {
                requested: 101,
                available: 100
            })
        );
    }

    #[test]
    fn test_redeem_on_behalf_requires_allowance() {
        let (mut mechanism, mut state) = queued();

        assert_eq!(
            mechanism.redeem(&mut state, ctx(carol(), OPEN), 10, carol(), recipient(1)),
            Err(AllocationError::InsufficientAllowance {
                requested: 10,
                available: 0
            })
        );

        mechanism
            .approve(&mut state, ctx(recipient(1), OPEN), carol(), 10)
            .unwrap();
        let paid = mechanism
            .redeem(&mut state, ctx(carol(), OPEN), 10, carol(), recipient(1))
            .unwrap();

        assert_eq!(paid, 20);
        assert_eq!(state.ledger().allowance(&recipient(1), &carol()), 0);
        assert_eq!(
            mechanism.assets().balance_of(&ASSET, &carol()),
            FUNDING + 20
        );
    }

    #[test]
    fn test_failed_payout_rolls_back_burn() {
        let (mut mechanism, mut state) = queued();
        mechanism.assets_mut().block_receiver(recipient(1));
        let before = state.clone();

        let err = mechanism
            .redeem(&mut state, ctx(recipient(1), OPEN), 40, recipient(1), recipient(1))
            .unwrap_err();

        assert!(matches!(err, AllocationError::Asset(_)));
        assert_eq!(state.ledger(), before.ledger());
        assert_eq!(state.events().len(), before.events().len());
    }

    #[test]
    fn test_redeem_closes_when_sweep_opens() {
        let (mut mechanism, mut state) = queued();
        let (id, owner) = (1, recipient(1));

        mechanism
            .redeem(&mut state, ctx(owner, OPEN + GRACE - 1), 10, owner, owner)
            .unwrap();
        assert_eq!(
            mechanism.proposal_state(&state, id, OPEN + GRACE).unwrap(),
            ProposalState::Expired
        );
        assert_eq!(
            mechanism.redeem(&mut state, ctx(owner, OPEN + GRACE), 10, owner, owner),
            Err(AllocationError::RedemptionClosed {
                closed_at: OPEN + GRACE
            })
        );
        assert_eq!(state.max_redeem(&owner, OPEN + GRACE), 0);

        // Only the sweep reaches the residual pool from here on.
        let swept = mechanism
            .sweep(&mut state, ctx(CONTROLLER, OPEN + GRACE), ASSET, CONTROLLER)
            .unwrap();
        assert_eq!(swept, 180);
        assert_eq!(state.ledger().balance_of(&owner), 90);
    }
}
