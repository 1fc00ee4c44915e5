//! Vote casting.
//!
//! A vote spends the voter's power, lands in one tally bucket and is then
//! offered to the forwarder, if one is attached. Single votes are always
//! all-or-nothing; batches follow the instance's `ForwardingPolicy`.

use super::guards;
use super::state::MechanismState;
use super::AllocationMechanism;
use crate::asset::AssetLedger;
use crate::error::{AllocationError, AllocationResult};
use crate::events::LedgerEvent;
use crate::forwarding::{Ballot, BatchOutcome, ForwardError, ForwardedVote, ForwardingPolicy};
use crate::strategy::AllocationStrategy;
use crate::types::{Address, CallContext, ProposalId, Support};
use tracing::warn;

impl<S: AllocationStrategy, A: AssetLedger> AllocationMechanism<S, A> {
    /// Cast `weight` on `proposal_id`. Returns the weight actually applied
    /// after the strategy's vote transform.
    ///
    /// When `expected_recipient` is given, the vote only lands if the
    /// proposal still resolves to that recipient.
    pub fn cast_vote(
        &mut self,
        state: &mut MechanismState,
        ctx: CallContext,
        proposal_id: ProposalId,
        support: Support,
        weight: u128,
        expected_recipient: Option<Address>,
    ) -> AllocationResult<u128> {
        let ballot = Ballot {
            proposal_id,
            support,
            weight,
            expected_recipient,
        };
        self.atomic(state, &ctx, |this, state| {
            let vote = this.apply_vote(state, &ctx, &ballot)?;
            this.forward(&vote)?;
            Ok(vote.weight)
        })
    }

    /// Cast several ballots in one call.
    ///
    /// Every ballot is applied before any is forwarded, so validation failures
    /// abort the whole batch with nothing sent downstream. Forwarding failures
    /// abort it under `AllOrNothing`, revoking the ballots already forwarded;
    /// under `BestEffort` the failed ballot is reverted and reported while the
    /// rest stand.
    pub fn cast_votes(
        &mut self,
        state: &mut MechanismState,
        ctx: CallContext,
        ballots: &[Ballot],
    ) -> AllocationResult<BatchOutcome> {
        let policy = state.config.forwarding_policy;
        self.atomic(state, &ctx, |this, state| {
            let votes = ballots
                .iter()
                .map(|ballot| this.apply_vote(state, &ctx, ballot))
                .collect::<AllocationResult<Vec<_>>>()?;

            let mut forwarded = Vec::with_capacity(votes.len());
            let result = this.forward_batch(state, &ctx, policy, &votes, &mut forwarded);
            if result.is_err() {
                this.revoke_all(&forwarded);
            }
            result
        })
    }

    fn forward_batch<'v>(
        &mut self,
        state: &mut MechanismState,
        ctx: &CallContext,
        policy: ForwardingPolicy,
        votes: &'v [ForwardedVote],
        forwarded: &mut Vec<&'v ForwardedVote>,
    ) -> AllocationResult<BatchOutcome> {
        let mut outcome = BatchOutcome::default();
        for vote in votes {
            match self.forward(vote) {
                Ok(()) => {
                    forwarded.push(vote);
                    outcome.applied.push((vote.proposal_id, vote.weight));
                }
                Err(err) if policy == ForwardingPolicy::BestEffort => {
                    warn!(
                        voter = %vote.voter,
                        proposal_id = vote.proposal_id,
                        "vote forwarding failed, reverting ballot: {}",
                        err
                    );
                    revert_vote(state, vote)?;
                    state.events.record(
                        ctx.now,
                        LedgerEvent::VoteForwardFailed {
                            voter: vote.voter,
                            proposal_id: vote.proposal_id,
                            weight: vote.weight,
                            reason: err.to_string(),
                        },
                    );
                    outcome.failed.push((vote.proposal_id, err));
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(outcome)
    }

    /// Withdraw already forwarded votes, newest first.
    fn revoke_all(&mut self, forwarded: &[&ForwardedVote]) {
        let Some(forwarder) = self.forwarder.as_mut() else {
            return;
        };
        for vote in forwarded.iter().rev() {
            if let Err(err) = forwarder.revoke_vote(vote) {
                warn!(
                    voter = %vote.voter,
                    proposal_id = vote.proposal_id,
                    "could not revoke forwarded vote: {}",
                    err
                );
            }
        }
    }

    fn apply_vote(
        &mut self,
        state: &mut MechanismState,
        ctx: &CallContext,
        ballot: &Ballot,
    ) -> AllocationResult<ForwardedVote> {
        let proposal_id = ballot.proposal_id;

        if state.tally_finalized {
            return Err(AllocationError::VotingClosed);
        }
        let proposal = state.proposal_or_err(proposal_id)?;
        if proposal.canceled {
            return Err(AllocationError::ProposalCanceled(proposal_id));
        }
        guards::within_voting_window(state, ctx.now)?;

        let recipient = self.strategy.get_recipient_address_hook(state, proposal);
        if let Some(expected) = ballot.expected_recipient {
            if expected != recipient {
                return Err(AllocationError::RecipientMismatch {
                    expected,
                    actual: recipient,
                });
            }
        }

        let remaining = state.voting_power(&ctx.caller);
        if ballot.weight == 0 || ballot.weight > remaining {
            return Err(AllocationError::InvalidWeight {
                weight: ballot.weight,
                remaining,
            });
        }

        let applied = self.strategy.process_vote_hook(
            state,
            proposal_id,
            &ctx.caller,
            ballot.support,
            ballot.weight,
        )?;
        if applied > ballot.weight {
            return Err(AllocationError::HookViolation {
                requested: ballot.weight,
                applied,
            });
        }

        let voter = state
            .voters
            .get_mut(&ctx.caller)
            .ok_or(AllocationError::InvalidWeight {
                weight: ballot.weight,
                remaining: 0,
            })?;
        voter.voting_power -= applied;

        let bucket = state.tallies.entry(proposal_id).or_default().bucket_mut(ballot.support);
        *bucket = bucket
            .checked_add(applied)
            .ok_or(AllocationError::ArithmeticOverflow)?;

        state.events.record(
            ctx.now,
            LedgerEvent::VotesCast {
                voter: ctx.caller,
                proposal_id,
                support: ballot.support,
                weight: applied,
            },
        );

        Ok(ForwardedVote {
            voter: ctx.caller,
            proposal_id,
            recipient,
            support: ballot.support,
            weight: applied,
        })
    }

    fn forward(&mut self, vote: &ForwardedVote) -> Result<(), ForwardError> {
        match self.forwarder.as_mut() {
            Some(forwarder) => forwarder.forward_vote(vote),
            None => Ok(()),
        }
    }
}

/// Undo an applied vote: refund the power, drain the bucket.
fn revert_vote(state: &mut MechanismState, vote: &ForwardedVote) -> AllocationResult<()> {
    if let Some(voter) = state.voters.get_mut(&vote.voter) {
        voter.voting_power = voter
            .voting_power
            .checked_add(vote.weight)
            .ok_or(AllocationError::ArithmeticOverflow)?;
    }
    if let Some(tally) = state.tallies.get_mut(&vote.proposal_id) {
        let bucket = tally.bucket_mut(vote.support);
        *bucket = bucket.saturating_sub(vote.weight);
    }
    Ok(())
}
