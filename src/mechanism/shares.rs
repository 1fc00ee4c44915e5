//! Share token surface: transfer, approve, transfer_from.

use super::guards;
use super::state::MechanismState;
use super::AllocationMechanism;
use crate::asset::AssetLedger;
use crate::error::AllocationResult;
use crate::events::LedgerEvent;
use crate::strategy::AllocationStrategy;
use crate::types::{Address, CallContext};

impl<S: AllocationStrategy, A: AssetLedger> AllocationMechanism<S, A> {
    pub fn transfer(
        &mut self,
        state: &mut MechanismState,
        ctx: CallContext,
        to: Address,
        amount: u128,
    ) -> AllocationResult<()> {
        self.atomic(state, &ctx, |_, state| {
            move_shares(state, &ctx, ctx.caller, to, amount)
        })
    }

    /// Set `spender`'s allowance over the caller's shares. `u128::MAX` never
    /// decreases.
    pub fn approve(
        &mut self,
        state: &mut MechanismState,
        ctx: CallContext,
        spender: Address,
        amount: u128,
    ) -> AllocationResult<()> {
        self.atomic(state, &ctx, |_, state| {
            guards::non_zero(&spender)?;
            state.ledger.allowances.insert((ctx.caller, spender), amount);
            state.events.record(
                ctx.now,
                LedgerEvent::Approval {
                    owner: ctx.caller,
                    spender,
                    amount,
                },
            );
            Ok(())
        })
    }

    pub fn transfer_from(
        &mut self,
        state: &mut MechanismState,
        ctx: CallContext,
        from: Address,
        to: Address,
        amount: u128,
    ) -> AllocationResult<()> {
        self.atomic(state, &ctx, |_, state| {
            state.ledger.spend_allowance(&from, &ctx.caller, amount)?;
            move_shares(state, &ctx, from, to, amount)
        })
    }
}

fn move_shares(
    state: &mut MechanismState,
    ctx: &CallContext,
    from: Address,
    to: Address,
    amount: u128,
) -> AllocationResult<()> {
    guards::non_zero(&to)?;
    state.ledger.move_shares(&from, &to, amount)?;
    state
        .events
        .record(ctx.now, LedgerEvent::Transfer { from, to, amount });
    Ok(())
}
