//! Queuing passing proposals and pool conversion views.

use super::guards;
use super::state::MechanismState;
use super::AllocationMechanism;
use crate::asset::AssetLedger;
use crate::error::{AllocationError, AllocationResult};
use crate::events::LedgerEvent;
use crate::strategy::AllocationStrategy;
use crate::types::{Address, CallContext, ProposalId, Timestamp};
use tracing::info;

impl<S: AllocationStrategy, A: AssetLedger> AllocationMechanism<S, A> {
    /// Mint shares to a passing proposal's recipient and start its timelock.
    ///
    /// Callable by anyone once the tally is finalized. The first successful
    /// queue fixes the global redemption start. Returns the shares minted.
    pub fn queue_proposal(
        &mut self,
        state: &mut MechanismState,
        ctx: CallContext,
        proposal_id: ProposalId,
    ) -> AllocationResult<u128> {
        self.atomic(state, &ctx, |this, state| {
            this.queue_inner(state, &ctx, proposal_id)
        })
    }

    fn queue_inner(
        &mut self,
        state: &mut MechanismState,
        ctx: &CallContext,
        proposal_id: ProposalId,
    ) -> AllocationResult<u128> {
        if !state.tally_finalized {
            return Err(AllocationError::TallyNotFinalized);
        }
        let proposal = state.proposal_or_err(proposal_id)?;
        if proposal.canceled {
            return Err(AllocationError::ProposalCanceled(proposal_id));
        }
        if proposal.is_queued() {
            return Err(AllocationError::AlreadyQueued(proposal_id));
        }

        let tally = state.tally(proposal_id).copied().unwrap_or_default();
        let net = tally.net_votes();
        if !self.strategy.has_quorum_hook(state, net) {
            return Err(AllocationError::NoQuorum {
                proposal_id,
                shares_for: tally.shares_for,
                shares_against: tally.shares_against,
                quorum: state.config.quorum_shares,
            });
        }

        let shares = self.strategy.convert_votes_to_shares(state, net)?;
        let recipient = self.strategy.get_recipient_address_hook(state, proposal);
        guards::non_zero(&recipient)?;

        let earliest = ctx
            .now
            .checked_add(state.config.timelock_delay)
            .ok_or(AllocationError::ArithmeticOverflow)?;

        state.ledger.mint(&recipient, shares)?;
        state.ledger.proposal_shares.insert(proposal_id, shares);
        if state.ledger.global_redemption_start == 0 {
            state.ledger.global_redemption_start = earliest;
        }
        if let Some(p) = state.proposals.get_mut(&proposal_id) {
            p.earliest_redeemable_time = earliest;
            p.claimed = true;
        }

        state.events.record(
            ctx.now,
            LedgerEvent::Transfer {
                from: Address::ZERO,
                to: recipient,
                amount: shares,
            },
        );
        state.events.record(
            ctx.now,
            LedgerEvent::ProposalQueued {
                proposal_id,
                recipient,
                shares,
                earliest_redeemable_time: earliest,
            },
        );

        info!(proposal_id, recipient = %recipient, shares, earliest, "proposal queued");
        Ok(shares)
    }
}

impl MechanismState {
    /// Shares a deposit of `assets` is worth against the current pool.
    pub fn convert_to_shares(&self, assets: u128) -> AllocationResult<u128> {
        self.config.converter()?.convert_to_shares(
            assets,
            self.ledger.total_supply,
            self.ledger.total_assets_held,
        )
    }

    /// Assets `shares` are worth against the current pool.
    pub fn convert_to_assets(&self, shares: u128) -> AllocationResult<u128> {
        self.config.converter()?.convert_to_assets(
            shares,
            self.ledger.total_supply,
            self.ledger.total_assets_held,
        )
    }

    /// Assets a redemption of `shares` would pay out right now.
    pub fn preview_redeem(&self, shares: u128) -> AllocationResult<u128> {
        self.convert_to_assets(shares)
    }

    /// Shares `owner` could redeem at `now`; zero outside the redemption window.
    pub fn max_redeem(&self, owner: &Address, now: Timestamp) -> u128 {
        if guards::redemption_open(self, now).is_err() {
            return 0;
        }
        self.ledger.balance_of(owner)
    }
}
