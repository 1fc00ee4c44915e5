//! Downstream vote forwarding.
//!
//! Some contribution flows hand each applied vote to a downstream
//! collaborator. What happens when that call fails is a policy choice:
//!
//! - [`ForwardingPolicy::AllOrNothing`]: the whole batch aborts, the instance
//!   state is restored and ballots already forwarded are revoked downstream.
//! - [`ForwardingPolicy::BestEffort`]: the failed ballot is reverted (power
//!   refunded, tally reduced), a `VoteForwardFailed` event is recorded and the
//!   batch continues.
//!
//! A batch applies and validates every ballot locally before the first one is
//! forwarded.

pub mod mock;

pub use mock::MockVoteForwarder;

use crate::types::{Address, ProposalId, Support};
use serde::{Deserialize, Serialize};

/// How a batch reacts to a downstream forwarding failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ForwardingPolicy {
    #[default]
    AllOrNothing,
    BestEffort,
}

/// A vote request inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ballot {
    pub proposal_id: ProposalId,
    pub support: Support,
    pub weight: u128,
    /// When set, the proposal must still resolve to this recipient.
    pub expected_recipient: Option<Address>,
}

impl Ballot {
    pub fn new(proposal_id: ProposalId, support: Support, weight: u128) -> Self {
        Self {
            proposal_id,
            support,
            weight,
            expected_recipient: None,
        }
    }
}

/// A vote that has been applied locally and is handed downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedVote {
    pub voter: Address,
    pub proposal_id: ProposalId,
    pub recipient: Address,
    pub support: Support,
    /// Weight after the strategy's vote hook.
    pub weight: u128,
}

/// Downstream forwarding errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForwardError {
    #[error("Downstream rejected vote: {0}")]
    Rejected(String),

    #[error("Downstream unavailable")]
    Unavailable,
}

/// Downstream collaborator receiving applied votes.
pub trait VoteForwarder {
    fn forward_vote(&mut self, vote: &ForwardedVote) -> Result<(), ForwardError>;

    /// Withdraw a vote previously accepted by `forward_vote`.
    fn revoke_vote(&mut self, vote: &ForwardedVote) -> Result<(), ForwardError>;
}

/// Result of a batch cast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// `(proposal_id, applied weight)` for ballots that stuck.
    pub applied: Vec<(ProposalId, u128)>,
    /// Ballots reverted under best-effort forwarding.
    pub failed: Vec<(ProposalId, ForwardError)>,
}

impl BatchOutcome {
    pub fn total_applied(&self) -> u128 {
        self.applied.iter().map(|(_, w)| *w).sum()
    }
}
