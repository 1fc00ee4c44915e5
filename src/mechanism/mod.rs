//! Allocation engine.
//!
//! [`AllocationMechanism`] is a service: it owns the strategy hooks, the asset
//! boundary and the observers, and acts on whichever [`MechanismState`] it is
//! handed. Many instances can share one service.
//!
//! Lifecycle:
//! 1. `signup` grants voting power against a deposit
//! 2. `propose` registers a recipient
//! 3. `cast_vote` / `cast_votes` spend power inside the voting window
//! 4. `finalize_vote_tally` freezes every tally (controller, once)
//! 5. `queue_proposal` mints shares for passing proposals
//! 6. `redeem` burns shares for pooled assets after the timelock
//! 7. `sweep` reclaims residual balances after the grace period
//!
//! Every mutating call is atomic: the state is checkpointed on entry and
//! restored if the call fails at any point, including at the asset boundary.
//! Events are published to observers and to `tracing` only once the call
//! commits.

pub mod allocation;
pub mod finalization;
pub(crate) mod guards;
pub mod proposals;
pub mod redemption;
pub mod registration;
pub mod shares;
pub mod state;
pub mod sweep;
pub mod voting;

#[cfg(test)]
pub(crate) mod testing;

#[cfg(test)]
mod proptests;

pub use state::{
    MechanismConfig, MechanismState, Proposal, ProposalState, ShareLedger, VoteTally, VoterRecord,
};

use crate::asset::AssetLedger;
use crate::error::AllocationResult;
use crate::events::EventObserver;
use crate::forwarding::VoteForwarder;
use crate::strategy::AllocationStrategy;
use crate::types::CallContext;

pub struct AllocationMechanism<S, A> {
    strategy: S,
    assets: A,
    forwarder: Option<Box<dyn VoteForwarder>>,
    observers: Vec<Box<dyn EventObserver>>,
}

impl<S: AllocationStrategy, A: AssetLedger> AllocationMechanism<S, A> {
    pub fn new(strategy: S, assets: A) -> Self {
        Self {
            strategy,
            assets,
            forwarder: None,
            observers: Vec::new(),
        }
    }

    /// Attach a downstream collaborator that receives every applied vote.
    pub fn with_forwarder(mut self, forwarder: impl VoteForwarder + 'static) -> Self {
        self.forwarder = Some(Box::new(forwarder));
        self
    }

    /// Register an observer for committed events.
    pub fn subscribe(&mut self, observer: impl EventObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn assets(&self) -> &A {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut A {
        &mut self.assets
    }

    /// Run `op` as one serialized, all-or-nothing call.
    ///
    /// The event log is append-only, so it stays out of the checkpoint and is
    /// cut back to its entry length on failure.
    fn atomic<T>(
        &mut self,
        state: &mut MechanismState,
        ctx: &CallContext,
        op: impl FnOnce(&mut Self, &mut MechanismState) -> AllocationResult<T>,
    ) -> AllocationResult<T> {
        let events = std::mem::take(&mut state.events);
        let checkpoint = state.clone();
        state.events = events;
        let first_new_event = state.events.len();

        let result = guards::observe_clock(state, ctx).and_then(|()| op(self, state));

        match result {
            Ok(value) => {
                for record in &state.events.records()[first_new_event..] {
                    tracing::debug!(sequence = record.sequence, "{}", record.event.describe());
                    for observer in &self.observers {
                        observer.on_event(record);
                    }
                }
                Ok(value)
            }
            Err(err) => {
                tracing::debug!(caller = %ctx.caller, now = ctx.now, "call rolled back: {}", err);
                let mut events = std::mem::take(&mut state.events);
                events.truncate(first_new_event);
                *state = checkpoint;
                state.events = events;
                Err(err)
            }
        }
    }
}
