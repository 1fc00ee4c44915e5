//! Signup: deposit the asset, receive voting power.

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
    /// Register the caller with `deposit` of the primary asset.
    ///
    /// Returns the voting power granted by this call. The deposit is pulled
    /// from the caller last; a failed pull undoes the registration.
    ///
    /// An already-registered voter (strategies that allow top-ups) may only
    /// add power before the voting window opens.
    pub fn signup(
        &mut self,
        state: &mut MechanismState,
        ctx: CallContext,
        deposit: u128,
    ) -> AllocationResult<u128> {
        self.atomic(state, &ctx, |this, state| this.signup_inner(state, &ctx, deposit))
    }

    fn signup_inner(
        &mut self,
        state: &mut MechanismState,
        ctx: &CallContext,
        deposit: u128,
    ) -> AllocationResult<u128> {
        guards::before_voting_end(state, ctx.now)?;

        if !self.strategy.before_signup_hook(state, &ctx.caller, deposit) {
            return Err(AllocationError::RegistrationBlocked(ctx.caller));
        }
        if state.is_registered(&ctx.caller) && ctx.now > state.config.voting_start() {
            return Err(AllocationError::RegistrationBlocked(ctx.caller));
        }

        let power = self
            .strategy
            .get_voting_power_hook(state, &ctx.caller, deposit)?;

        let record = state.voters.entry(ctx.caller).or_default();
        record.registered = true;
        record.voting_power = record
            .voting_power
            .checked_add(power)
            .ok_or(AllocationError::ArithmeticOverflow)?;
        record.power_granted = record
            .power_granted
            .checked_add(power)
            .ok_or(AllocationError::ArithmeticOverflow)?;

        state.ledger.total_assets_held = state
            .ledger
            .total_assets_held
            .checked_add(deposit)
            .ok_or(AllocationError::ArithmeticOverflow)?;

        state.events.record(
            ctx.now,
            LedgerEvent::UserRegistered {
                user: ctx.caller,
                deposit,
                voting_power: power,
            },
        );

        if deposit > 0 {
            let asset = state.config.asset;
            let mechanism = state.config.mechanism;
            self.assets
                .transfer_in(&asset, &ctx.caller, &mechanism, deposit)?;
        }

        info!(user = %ctx.caller, deposit, power, "user registered");
        Ok(power)
    }
}
