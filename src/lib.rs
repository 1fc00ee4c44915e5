//! Allocator - treasury allocation engine
//!
//! Participants deposit an asset for voting power, propose recipients and
//! vote inside a single window. After the controller finalizes the tally,
//! passing proposals mint vault-style shares that redeem pro rata against
//! the pooled asset once a timelock expires.
//!
//! Key principles:
//! - Every call is atomic; a failure leaves the instance untouched
//! - Strategy hooks score and gate, the engine owns the invariants
//! - Shares always carry 18 decimals, whatever the asset's precision
//! - Many independent instances, one stateless service

pub mod asset;
pub mod config;
pub mod conversion;
pub mod error;
pub mod events;
pub mod forwarding;
pub mod mechanism;
pub mod registry;
pub mod serialization;
pub mod strategy;
pub mod types;

pub use error::{AllocationError, AllocationResult};
pub use mechanism::{AllocationMechanism, MechanismConfig, MechanismState, ProposalState};
pub use types::{Address, CallContext, ProposalId, Support, Timestamp};
