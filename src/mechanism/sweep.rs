//! Residual sweep after the grace period.

use super::guards;
use super::state::MechanismState;
use super::AllocationMechanism;
use crate::asset::AssetLedger;
use crate::error::{AllocationError, AllocationResult};
use crate::events::LedgerEvent;
use crate::strategy::AllocationStrategy;
use crate::types::{Address, CallContext};
use tracing::{info, warn};

impl<S: AllocationStrategy, A: AssetLedger> AllocationMechanism<S, A> {
    /// Move the mechanism's whole balance of `token` to `receiver`.
    ///
    /// Controller only, and only once the grace period after the global
    /// redemption start has passed. `Address::ZERO` sweeps native value.
    /// Sweeping the primary asset shrinks the pool; shares are untouched.
    pub fn sweep(
        &mut self,
        state: &mut MechanismState,
        ctx: CallContext,
        token: Address,
        receiver: Address,
    ) -> AllocationResult<u128> {
        self.atomic(state, &ctx, |this, state| {
            let (_, available_at) = state
                .redemption_window()
                .ok_or(AllocationError::RedemptionNotStarted)?;
            if ctx.now < available_at {
                return Err(AllocationError::GracePeriodNotExpired { available_at });
            }
            guards::only_controller(state, &ctx)?;
            guards::non_zero(&receiver)?;

            let mechanism = state.config.mechanism;
            let balance = this.assets.balance_of(&token, &mechanism);
            if balance == 0 {
                return Err(AllocationError::NothingToSweep(token));
            }

            if token == state.config.asset {
                state.ledger.total_assets_held =
                    state.ledger.total_assets_held.saturating_sub(balance);
                if state.ledger.total_supply > 0 {
                    warn!(
                        outstanding_shares = state.ledger.total_supply,
                        "sweeping primary asset with shares outstanding"
                    );
                }
            }

            state.events.record(
                ctx.now,
                LedgerEvent::Swept {
                    token,
                    receiver,
                    amount: balance,
                },
            );
            this.assets
                .transfer_out(&token, &mechanism, &receiver, balance)?;

            info!(token = %token, receiver = %receiver, amount = balance, "balance swept");
            Ok(balance)
        })
    }
}
