//! Strategy hooks.
//!
//! Concrete allocation strategies (linear, quadratic, whitelisted) plug into
//! the engine through [`AllocationStrategy`]. The engine owns every ledger
//! invariant; hooks only score, gate and transform.
//!
//! Hooks see the instance state read-only. A hook that needs its own
//! bookkeeping keeps it outside the instance.

pub mod mock;

pub use mock::{MockStrategy, PowerFormula, RegistrationMode};

use crate::error::AllocationResult;
use crate::mechanism::state::{MechanismState, Proposal};
use crate::types::{Address, ProposalId, Support};

/// Hook contract consumed by the allocation engine.
pub trait AllocationStrategy {
    /// Voting power granted for a deposit.
    fn get_voting_power_hook(
        &self,
        state: &MechanismState,
        depositor: &Address,
        deposit: u128,
    ) -> AllocationResult<u128>;

    /// Gate a signup. Default: one registration per address.
    fn before_signup_hook(
        &self,
        state: &MechanismState,
        depositor: &Address,
        _deposit: u128,
    ) -> bool {
        !state.is_registered(depositor)
    }

    /// Gate a proposal. The engine separately requires positive voting power.
    fn before_propose_hook(&self, _state: &MechanismState, _proposer: &Address) -> bool {
        true
    }

    fn before_finalize_vote_tally_hook(&self, _state: &MechanismState) -> bool {
        true
    }

    /// Transform a vote. The returned weight must not exceed `requested`;
    /// the engine rejects the vote with `HookViolation` otherwise.
    fn process_vote_hook(
        &self,
        _state: &MechanismState,
        _proposal_id: ProposalId,
        _voter: &Address,
        _support: Support,
        requested: u128,
    ) -> AllocationResult<u128> {
        Ok(requested)
    }

    fn has_quorum_hook(&self, state: &MechanismState, net_votes: u128) -> bool {
        net_votes >= state.config().quorum_shares
    }

    /// Shares minted for a passing proposal's net votes. Default: 1:1.
    fn convert_votes_to_shares(
        &self,
        _state: &MechanismState,
        net_votes: u128,
    ) -> AllocationResult<u128> {
        Ok(net_votes)
    }

    fn get_recipient_address_hook(&self, _state: &MechanismState, proposal: &Proposal) -> Address {
        proposal.recipient
    }
}

/// One unit of asset, one unit of power; every other hook at its default.
///
/// Deposits are rescaled to 18 decimals so power and shares share a unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinearStrategy;

impl AllocationStrategy for LinearStrategy {
    fn get_voting_power_hook(
        &self,
        state: &MechanismState,
        _depositor: &Address,
        deposit: u128,
    ) -> AllocationResult<u128> {
        state.config().converter()?.scale_to_shares(deposit)
    }
}
