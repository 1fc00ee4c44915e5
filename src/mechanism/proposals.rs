//! Proposal creation, cancellation and lifecycle queries.

use super::guards;
use super::state::{MechanismState, Proposal, ProposalState};
use super::AllocationMechanism;
use crate::asset::AssetLedger;
use crate::error::{AllocationError, AllocationResult};
use crate::events::LedgerEvent;
use crate::strategy::AllocationStrategy;
use crate::types::{Address, CallContext, ProposalId, Timestamp};
use tracing::info;

impl<S: AllocationStrategy, A: AssetLedger> AllocationMechanism<S, A> {
    /// Create a proposal to fund `recipient`. Ids are assigned from 1.
    pub fn propose(
        &mut self,
        state: &mut MechanismState,
        ctx: CallContext,
        recipient: Address,
        description: &str,
    ) -> AllocationResult<ProposalId> {
        self.atomic(state, &ctx, |this, state| {
            this.propose_inner(state, &ctx, recipient, description)
        })
    }

    fn propose_inner(
        &mut self,
        state: &mut MechanismState,
        ctx: &CallContext,
        recipient: Address,
        description: &str,
    ) -> AllocationResult<ProposalId> {
        guards::before_voting_end(state, ctx.now)?;

        if state.voting_power(&ctx.caller) == 0
            || !self.strategy.before_propose_hook(state, &ctx.caller)
        {
            return Err(AllocationError::ProposeNotAllowed(ctx.caller));
        }
        guards::non_zero(&recipient)?;
        if description.trim().is_empty() {
            return Err(AllocationError::EmptyDescription);
        }
        if let Some(existing) = state.proposal_for_recipient(&recipient) {
            return Err(AllocationError::RecipientUsed {
                recipient,
                proposal_id: existing,
            });
        }

        let id = state.next_proposal_id;
        state.next_proposal_id += 1;

        state.proposals.insert(
            id,
            Proposal {
                id,
                proposer: ctx.caller,
                recipient,
                description: description.to_string(),
                canceled: false,
                claimed: false,
                earliest_redeemable_time: 0,
                created_at: ctx.now,
            },
        );
        state.tallies.insert(id, Default::default());
        state.recipients.insert(recipient, id);

        state.events.record(
            ctx.now,
            LedgerEvent::ProposalCreated {
                proposal_id: id,
                proposer: ctx.caller,
                recipient,
                description: description.to_string(),
            },
        );

        info!(proposal_id = id, proposer = %ctx.caller, recipient = %recipient, "proposal created");
        Ok(id)
    }

    /// Withdraw a proposal. Only the proposer, only before it is queued.
    /// The recipient becomes available to new proposals.
    pub fn cancel_proposal(
        &mut self,
        state: &mut MechanismState,
        ctx: CallContext,
        proposal_id: ProposalId,
    ) -> AllocationResult<()> {
        self.atomic(state, &ctx, |_, state| {
            let proposal = state.proposal_or_err(proposal_id)?;
            if proposal.proposer != ctx.caller {
                return Err(AllocationError::NotProposer {
                    proposal_id,
                    caller: ctx.caller,
                });
            }
            if proposal.is_queued() {
                return Err(AllocationError::AlreadyQueued(proposal_id));
            }
            if proposal.canceled {
                return Err(AllocationError::AlreadyCanceled(proposal_id));
            }
            let recipient = proposal.recipient;

            if let Some(p) = state.proposals.get_mut(&proposal_id) {
                p.canceled = true;
            }
            state.recipients.remove(&recipient);

            state.events.record(
                ctx.now,
                LedgerEvent::ProposalCanceled {
                    proposal_id,
                    proposer: ctx.caller,
                },
            );
            info!(proposal_id, "proposal canceled");
            Ok(())
        })
    }

    /// Lifecycle state of a proposal at `now`.
    pub fn proposal_state(
        &self,
        state: &MechanismState,
        proposal_id: ProposalId,
        now: Timestamp,
    ) -> AllocationResult<ProposalState> {
        let proposal = state.proposal_or_err(proposal_id)?;
        let config = state.config();

        if proposal.canceled {
            return Ok(ProposalState::Canceled);
        }

        if proposal.is_queued() {
            // Redemption closes for every holder at the global window end.
            let mut expires_at = proposal
                .earliest_redeemable_time
                .saturating_add(config.grace_period);
            if let Some((_, closes)) = state.redemption_window() {
                expires_at = expires_at.min(closes);
            }
            return Ok(if now >= expires_at {
                ProposalState::Expired
            } else if now >= proposal.earliest_redeemable_time {
                ProposalState::Redeemable
            } else {
                ProposalState::Queued
            });
        }

        if now <= config.voting_start() {
            return Ok(ProposalState::Pending);
        }
        if now < config.voting_end() {
            return Ok(ProposalState::Active);
        }
        if !state.tally_finalized {
            return Ok(ProposalState::Tallying);
        }

        let net = state
            .tally(proposal_id)
            .map(|t| t.net_votes())
            .unwrap_or(0);
        if self.strategy.has_quorum_hook(state, net) {
            Ok(ProposalState::Succeeded)
        } else {
            Ok(ProposalState::Defeated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::strategy::MockStrategy;
    use crate::types::Support;

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let (mut mechanism, mut state, first) = registered_with_proposal(100);
        let second = mechanism
            .propose(&mut state, ctx(bob(), VOTING_OPEN), recipient(2), "second")
            .unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(state.proposal_count(), 2);
        assert_eq!(state.proposal_for_recipient(&recipient(2)), Some(2));
    }

    #[test]
    fn test_propose_requires_voting_power() {
        let (mut mechanism, mut state) = setup();
        let err = mechanism
            .propose(&mut state, ctx(carol(), START), recipient(1), "fund")
            .unwrap_err();
        assert_eq!(err, AllocationError::ProposeNotAllowed(carol()));
    }

    #[test]
    fn test_propose_hook_can_block() {
        let strategy = MockStrategy::new().block_proposer(alice());
        let (mut mechanism, mut state) = setup_with(strategy);
        mechanism
            .signup(&mut state, ctx(alice(), START), 10)
            .unwrap();

        let err = mechanism
            .propose(&mut state, ctx(alice(), START), recipient(1), "fund")
            .unwrap_err();
        assert_eq!(err, AllocationError::ProposeNotAllowed(alice()));
    }

    #[test]
    fn test_propose_validation() {
        let (mut mechanism, mut state, id) = registered_with_proposal(100);

        assert_eq!(
            mechanism.propose(&mut state, ctx(bob(), VOTING_OPEN), Address::ZERO, "x"),
            Err(AllocationError::InvalidRecipient)
        );
        assert_eq!(
            mechanism.propose(&mut state, ctx(bob(), VOTING_OPEN), recipient(2), "   "),
            Err(AllocationError::EmptyDescription)
        );
        assert_eq!(
            mechanism.propose(&mut state, ctx(bob(), VOTING_OPEN), recipient(1), "dup"),
            Err(AllocationError::RecipientUsed {
                recipient: recipient(1),
                proposal_id: id
            })
        );
        assert_eq!(
            mechanism.propose(&mut state, ctx(bob(), VOTING_END), recipient(3), "late"),
            Err(AllocationError::VotingEnded)
        );
        assert_eq!(state.proposal_count(), 1);
    }

    #[test]
    fn test_cancel_frees_recipient() {
        let (mut mechanism, mut state, id) = registered_with_proposal(100);

        assert_eq!(
            mechanism.cancel_proposal(&mut state, ctx(bob(), VOTING_OPEN), id),
            Err(AllocationError::NotProposer {
                proposal_id: id,
                caller: bob()
            })
        );

        mechanism
            .cancel_proposal(&mut state, ctx(alice(), VOTING_OPEN), id)
            .unwrap();
        assert_eq!(
            mechanism.proposal_state(&state, id, VOTING_OPEN).unwrap(),
            ProposalState::Canceled
        );
        assert_eq!(
            mechanism.cancel_proposal(&mut state, ctx(alice(), VOTING_OPEN), id),
            Err(AllocationError::AlreadyCanceled(id))
        );

        let reused = mechanism
            .propose(&mut state, ctx(bob(), VOTING_OPEN), recipient(1), "again")
            .unwrap();
        assert_eq!(reused, 2);
    }

    #[test]
    fn test_cancel_after_queue_rejected() {
        let (mut mechanism, mut state, id) = registered_with_proposal(100);
        vote_and_finalize(&mut mechanism, &mut state, &[(alice(), id, Support::For, 50)]);
        mechanism
            .queue_proposal(&mut state, ctx(alice(), VOTING_END), id)
            .unwrap();

        assert_eq!(
            mechanism.cancel_proposal(&mut state, ctx(alice(), VOTING_END), id),
            Err(AllocationError::AlreadyQueued(id))
        );
    }

    #[test]
    fn test_state_progression() {
        let (mut mechanism, mut state) = setup();
        mechanism
            .signup(&mut state, ctx(alice(), START), 100)
            .unwrap();
        let id = mechanism
            .propose(&mut state, ctx(alice(), START), recipient(1), "fund")
            .unwrap();

        let at = |m: &TestMechanism, s: &MechanismState, now: Timestamp| {
            m.proposal_state(s, id, now).unwrap()
        };

        assert_eq!(at(&mechanism, &state, VOTING_START), ProposalState::Pending);
        assert_eq!(at(&mechanism, &state, VOTING_OPEN), ProposalState::Active);
        assert_eq!(at(&mechanism, &state, VOTING_END), ProposalState::Tallying);

        vote_and_finalize(&mut mechanism, &mut state, &[(alice(), id, Support::For, 60)]);
        assert_eq!(at(&mechanism, &state, VOTING_END), ProposalState::Succeeded);

        mechanism
            .queue_proposal(&mut state, ctx(bob(), VOTING_END), id)
            .unwrap();
        let earliest = VOTING_END + TIMELOCK;
        assert_eq!(at(&mechanism, &state, earliest - 1), ProposalState::Queued);
        assert_eq!(at(&mechanism, &state, earliest), ProposalState::Redeemable);
        assert_eq!(
            at(&mechanism, &state, earliest + GRACE - 1),
            ProposalState::Redeemable
        );
        assert_eq!(at(&mechanism, &state, earliest + GRACE), ProposalState::Expired);
    }

    #[test]
    fn test_defeated_below_quorum() {
        let (mut mechanism, mut state, id) = registered_with_proposal(100);
        vote_and_finalize(
            &mut mechanism,
            &mut state,
            &[
                (alice(), id, Support::For, 20),
                (bob(), id, Support::Against, 15),
            ],
        );
        assert_eq!(
            mechanism.proposal_state(&state, id, VOTING_END).unwrap(),
            ProposalState::Defeated
        );
    }

    #[test]
    fn test_unknown_proposal_state() {
        let (mechanism, state) = setup();
        assert_eq!(
            mechanism.proposal_state(&state, 9, START),
            Err(AllocationError::InvalidProposal(9))
        );
    }
}
