//! Precondition guards.
//!
//! Each guard returns a typed error and is called at the top of the
//! operation it protects.

use super::state::MechanismState;
use crate::error::{AllocationError, AllocationResult};
use crate::types::{Address, CallContext, Timestamp};

/// Record the caller's clock reading; the clock may never move backwards.
pub(crate) fn observe_clock(state: &mut MechanismState, ctx: &CallContext) -> AllocationResult<()> {
    if ctx.now < state.last_seen_time {
        return Err(AllocationError::ClockRegression {
            last_seen: state.last_seen_time,
            now: ctx.now,
        });
    }
    state.last_seen_time = ctx.now;
    Ok(())
}

pub(crate) fn only_controller(state: &MechanismState, ctx: &CallContext) -> AllocationResult<()> {
    if ctx.caller != state.config.controller {
        return Err(AllocationError::Unauthorized(ctx.caller));
    }
    Ok(())
}

pub(crate) fn non_zero(address: &Address) -> AllocationResult<()> {
    if address.is_zero() {
        return Err(AllocationError::InvalidRecipient);
    }
    Ok(())
}

/// Signup and propose close together with the voting window.
pub(crate) fn before_voting_end(state: &MechanismState, now: Timestamp) -> AllocationResult<()> {
    if now >= state.config.voting_end() {
        return Err(AllocationError::VotingEnded);
    }
    Ok(())
}

/// Strictly after the start, strictly before the end.
pub(crate) fn within_voting_window(
    state: &MechanismState,
    now: Timestamp,
) -> AllocationResult<()> {
    if now <= state.config.voting_start() || now >= state.config.voting_end() {
        return Err(AllocationError::VotingClosed);
    }
    Ok(())
}

pub(crate) fn voting_ended(state: &MechanismState, now: Timestamp) -> AllocationResult<()> {
    if now < state.config.voting_end() {
        return Err(AllocationError::VotingNotEnded);
    }
    Ok(())
}

pub(crate) fn redemption_open(state: &MechanismState, now: Timestamp) -> AllocationResult<()> {
    match state.redemption_window() {
        Some((opens, _)) if now < opens => Err(AllocationError::RedemptionNotStarted),
        Some((_, closes)) if now >= closes => {
            Err(AllocationError::RedemptionClosed { closed_at: closes })
        }
        Some(_) => Ok(()),
        None => Err(AllocationError::RedemptionNotStarted),
    }
}
