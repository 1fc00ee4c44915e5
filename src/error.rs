//! Error taxonomy for the allocation engine.
//!
//! Every variant aborts the whole call: the instance state is restored to
//! what it was before the call started.

use crate::asset::AssetError;
use crate::forwarding::ForwardError;
use crate::types::{Address, ProposalId, Timestamp};

/// Result type for allocation operations.
pub type AllocationResult<T> = Result<T, AllocationError>;

/// Allocation engine errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    #[error("Invalid recipient: zero address")]
    InvalidRecipient,

    #[error("Registration blocked for {0}")]
    RegistrationBlocked(Address),

    #[error("Voting has ended")]
    VotingEnded,

    #[error("Voting is closed")]
    VotingClosed,

    #[error("Voting period has not ended")]
    VotingNotEnded,

    #[error("Invalid weight {weight}: remaining voting power is {remaining}")]
    InvalidWeight { weight: u128, remaining: u128 },

    #[error("Invalid proposal: {0}")]
    InvalidProposal(ProposalId),

    #[error("Propose not allowed for {0}")]
    ProposeNotAllowed(Address),

    #[error("Recipient {recipient} already used by proposal {proposal_id}")]
    RecipientUsed {
        recipient: Address,
        proposal_id: ProposalId,
    },

    #[error("Proposal description is empty")]
    EmptyDescription,

    #[error("Vote tally has not been finalized")]
    TallyNotFinalized,

    #[error("Vote tally already finalized")]
    AlreadyFinalized,

    #[error("Finalization rejected by strategy")]
    FinalizationBlocked,

    #[error("Proposal {0} already queued")]
    AlreadyQueued(ProposalId),

    #[error("Proposal {0} is canceled")]
    ProposalCanceled(ProposalId),

    #[error(
        "No quorum for proposal {proposal_id}: for={shares_for} against={shares_against} \
         quorum={quorum}"
    )]
    NoQuorum {
        proposal_id: ProposalId,
        shares_for: u128,
        shares_against: u128,
        quorum: u128,
    },

    #[error("{caller} is not the proposer of proposal {proposal_id}")]
    NotProposer {
        proposal_id: ProposalId,
        caller: Address,
    },

    #[error("Proposal {0} already canceled")]
    AlreadyCanceled(ProposalId),

    #[error("Redemption period not started")]
    RedemptionNotStarted,

    #[error("Redemption period closed at {closed_at}")]
    RedemptionClosed { closed_at: Timestamp },

    #[error("Grace period not expired (sweep available at {available_at})")]
    GracePeriodNotExpired { available_at: Timestamp },

    #[error("No tokens/ETH to sweep for {0}")]
    NothingToSweep(Address),

    #[error("Unauthorized: {0}")]
    Unauthorized(Address),

    #[error("Vote hook applied {applied}, more than the requested {requested}")]
    HookViolation { requested: u128, applied: u128 },

    #[error("Recipient mismatch: expected {expected}, proposal resolves to {actual}")]
    RecipientMismatch { expected: Address, actual: Address },

    #[error("Insufficient shares: requested {requested}, available {available}")]
    InsufficientShares { requested: u128, available: u128 },

    #[error("Insufficient allowance: requested {requested}, available {available}")]
    InsufficientAllowance { requested: u128, available: u128 },

    #[error("Zero shares")]
    ZeroShares,

    #[error("Redemption yields zero assets")]
    ZeroAssets,

    #[error("Pool holds no assets")]
    EmptyPool,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    #[error("Clock moved backwards: last seen {last_seen}, got {now}")]
    ClockRegression { last_seen: Timestamp, now: Timestamp },

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Vote forwarding error: {0}")]
    Forward(#[from] ForwardError),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Inconsistent instance state: {0}")]
    InconsistentState(String),
}
