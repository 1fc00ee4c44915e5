//! Configurable strategy for tests and local simulation.

use super::AllocationStrategy;
use crate::conversion::mul_div_floor;
use crate::error::AllocationResult;
use crate::mechanism::state::MechanismState;
use crate::types::{Address, ProposalId, Support};
use std::collections::BTreeSet;

/// How deposits become voting power.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerFormula {
    /// Power equals the raw deposit.
    Identity,
    /// Deposit rescaled from asset decimals to 18-decimal units.
    AssetScaled,
    /// Every signup grants the same power, regardless of deposit.
    Fixed(u128),
}

/// Re-registration policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RegistrationMode {
    /// A second signup from the same address is blocked.
    #[default]
    OneShot,
    /// Repeat signups add power.
    TopUp,
}

#[derive(Debug, Clone)]
pub struct MockStrategy {
    power: PowerFormula,
    registration: RegistrationMode,
    /// Applied weight = requested * num / den.
    vote_ratio: (u128, u128),
    /// Returns more weight than requested (exercises `HookViolation`).
    inflate_votes: bool,
    blocked_proposers: BTreeSet<Address>,
    finalize_allowed: bool,
}

impl Default for MockStrategy {
    fn default() -> Self {
        Self {
            power: PowerFormula::Identity,
            registration: RegistrationMode::OneShot,
            vote_ratio: (1, 1),
            inflate_votes: false,
            blocked_proposers: BTreeSet::new(),
            finalize_allowed: true,
        }
    }
}

impl MockStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_power(mut self, power: PowerFormula) -> Self {
        self.power = power;
        self
    }

    pub fn with_registration(mut self, registration: RegistrationMode) -> Self {
        self.registration = registration;
        self
    }

    /// Scale every applied vote by `num / den` (must be <= 1 to stay valid).
    pub fn with_vote_ratio(mut self, num: u128, den: u128) -> Self {
        self.vote_ratio = (num, den);
        self
    }

    pub fn inflating_votes(mut self) -> Self {
        self.inflate_votes = true;
        self
    }

    pub fn block_proposer(mut self, proposer: Address) -> Self {
        self.blocked_proposers.insert(proposer);
        self
    }

    pub fn block_finalize(mut self) -> Self {
        self.finalize_allowed = false;
        self
    }
}

impl AllocationStrategy for MockStrategy {
    fn get_voting_power_hook(
        &self,
        state: &MechanismState,
        _depositor: &Address,
        deposit: u128,
    ) -> AllocationResult<u128> {
        match self.power {
            PowerFormula::Identity => Ok(deposit),
            PowerFormula::AssetScaled => state.config().converter()?.scale_to_shares(deposit),
            PowerFormula::Fixed(power) => Ok(power),
        }
    }

    fn before_signup_hook(
        &self,
        state: &MechanismState,
        depositor: &Address,
        _deposit: u128,
    ) -> bool {
        match self.registration {
            RegistrationMode::OneShot => !state.is_registered(depositor),
            RegistrationMode::TopUp => true,
        }
    }

    fn before_propose_hook(&self, _state: &MechanismState, proposer: &Address) -> bool {
        !self.blocked_proposers.contains(proposer)
    }

    fn before_finalize_vote_tally_hook(&self, _state: &MechanismState) -> bool {
        self.finalize_allowed
    }

    fn process_vote_hook(
        &self,
        _state: &MechanismState,
        _proposal_id: ProposalId,
        _voter: &Address,
        _support: Support,
        requested: u128,
    ) -> AllocationResult<u128> {
        if self.inflate_votes {
            return Ok(requested.saturating_add(1));
        }
        let (num, den) = self.vote_ratio;
        mul_div_floor(requested, num, den)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mechanism::testing::{alice, config};

    fn state_with_decimals(decimals: u8) -> MechanismState {
        let mut config = config();
        config.asset_decimals = decimals;
        MechanismState::new(config).unwrap()
    }

    #[test]
    fn test_power_formulas() {
        let state = state_with_decimals(6);

        let identity = MockStrategy::new();
        assert_eq!(identity.get_voting_power_hook(&state, &alice(), 5).unwrap(), 5);

        let scaled = MockStrategy::new().with_power(PowerFormula::AssetScaled);
        assert_eq!(
            scaled.get_voting_power_hook(&state, &alice(), 5).unwrap(),
            5_000_000_000_000
        );

        let fixed = MockStrategy::new().with_power(PowerFormula::Fixed(42));
        assert_eq!(fixed.get_voting_power_hook(&state, &alice(), 0).unwrap(), 42);
    }

    #[test]
    fn test_vote_ratio_floors() {
        let state = state_with_decimals(18);
        let strategy = MockStrategy::new().with_vote_ratio(2, 3);
        assert_eq!(
            strategy
                .process_vote_hook(&state, 1, &alice(), Support::For, 10)
                .unwrap(),
            6
        );
    }

    #[test]
    fn test_default_hooks() {
        let state = state_with_decimals(18);
        let strategy = MockStrategy::new();

        assert!(strategy.before_signup_hook(&state, &alice(), 1));
        assert!(strategy.before_propose_hook(&state, &alice()));
        assert!(strategy.before_finalize_vote_tally_hook(&state));
        assert!(!strategy.has_quorum_hook(&state, state.config().quorum_shares - 1));
        assert!(strategy.has_quorum_hook(&state, state.config().quorum_shares));
        assert_eq!(strategy.convert_votes_to_shares(&state, 77).unwrap(), 77);
    }

    #[test]
    fn test_blocking_switches() {
        let state = state_with_decimals(18);
        let strategy = MockStrategy::new().block_proposer(alice()).block_finalize();

        assert!(!strategy.before_propose_hook(&state, &alice()));
        assert!(!strategy.before_finalize_vote_tally_hook(&state));
    }
}
