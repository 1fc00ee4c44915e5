//! Tally finalization.

use super::guards;
use super::state::MechanismState;
use super::AllocationMechanism;
use crate::asset::AssetLedger;
use crate::error::{AllocationError, AllocationResult};
use crate::events::LedgerEvent;
use crate::strategy::AllocationStrategy;
use crate::types::CallContext;
use tracing::info;

impl<S: AllocationStrategy, A: AssetLedger> AllocationMechanism<S, A> {
    /// Freeze every tally. Controller only, once, after the window closes.
    pub fn finalize_vote_tally(
        &mut self,
        state: &mut MechanismState,
        ctx: CallContext,
    ) -> AllocationResult<()> {
        self.atomic(state, &ctx, |this, state| {
            guards::only_controller(state, &ctx)?;
            if state.tally_finalized {
                return Err(AllocationError::AlreadyFinalized);
            }
            guards::voting_ended(state, ctx.now)?;
            if !this.strategy.before_finalize_vote_tally_hook(state) {
                return Err(AllocationError::FinalizationBlocked);
            }

            state.tally_finalized = true;
            state.events.record(ctx.now, LedgerEvent::TallyFinalized);

            info!(proposals = state.proposal_count(), "vote tally finalized");
            Ok(())
        })
    }
}
