//! Shared fixtures for engine unit tests.

use super::state::{MechanismConfig, MechanismState};
use super::AllocationMechanism;
use crate::asset::MockAssetLedger;
use crate::forwarding::ForwardingPolicy;
use crate::strategy::MockStrategy;
use crate::types::{Address, CallContext, ProposalId, Support, Timestamp};

pub(crate) const ASSET: Address = Address::new([0xa5; 20]);
pub(crate) const CONTROLLER: Address = Address::new([0xc0; 20]);
pub(crate) const MECHANISM: Address = Address::new([0x11; 20]);

pub(crate) const START: Timestamp = 1_000;
pub(crate) const VOTING_START: Timestamp = 1_100;
pub(crate) const VOTING_OPEN: Timestamp = VOTING_START + 1;
pub(crate) const VOTING_END: Timestamp = 2_100;
pub(crate) const TIMELOCK: u64 = 50;
pub(crate) const GRACE: u64 = 500;
pub(crate) const QUORUM: u128 = 10;

/// Asset balance each participant starts with.
pub(crate) const FUNDING: u128 = 1_000_000;

pub(crate) type TestMechanism = AllocationMechanism<MockStrategy, MockAssetLedger>;

pub(crate) fn alice() -> Address {
    Address::from_low_u64(0xa1)
}

pub(crate) fn bob() -> Address {
    Address::from_low_u64(0xb0)
}

pub(crate) fn carol() -> Address {
    Address::from_low_u64(0xca)
}

pub(crate) fn recipient(n: u64) -> Address {
    Address::from_low_u64(0x1000 + n)
}

pub(crate) fn config() -> MechanismConfig {
    MechanismConfig {
        asset: ASSET,
        asset_decimals: 18,
        share_name: "Allocation Shares".to_string(),
        share_symbol: "ALLOC".to_string(),
        voting_delay: VOTING_START - START,
        voting_period: VOTING_END - VOTING_START,
        quorum_shares: QUORUM,
        timelock_delay: TIMELOCK,
        grace_period: GRACE,
        controller: CONTROLLER,
        mechanism: MECHANISM,
        start_time: START,
        forwarding_policy: ForwardingPolicy::AllOrNothing,
    }
}

pub(crate) fn ctx(caller: Address, now: Timestamp) -> CallContext {
    CallContext::new(caller, now)
}

pub(crate) fn funded_assets() -> MockAssetLedger {
    let mut assets = MockAssetLedger::new();
    for who in [alice(), bob(), carol()] {
        assets.mint(ASSET, who, FUNDING);
    }
    assets
}

pub(crate) fn setup_with(strategy: MockStrategy) -> (TestMechanism, MechanismState) {
    let state = MechanismState::new(config()).expect("fixture config is valid");
    (AllocationMechanism::new(strategy, funded_assets()), state)
}

pub(crate) fn setup() -> (TestMechanism, MechanismState) {
    setup_with(MockStrategy::new())
}

/// Alice and bob register with `deposit` each; alice proposes recipient(1).
pub(crate) fn registered_with_proposal(
    deposit: u128,
) -> (TestMechanism, MechanismState, ProposalId) {
    let (mut mechanism, mut state) = setup();
    mechanism
        .signup(&mut state, ctx(alice(), VOTING_OPEN), deposit)
        .unwrap();
    mechanism
        .signup(&mut state, ctx(bob(), VOTING_OPEN), deposit)
        .unwrap();
    let id = mechanism
        .propose(&mut state, ctx(alice(), VOTING_OPEN), recipient(1), "fund")
        .unwrap();
    (mechanism, state, id)
}

/// Vote, close the window and finalize.
pub(crate) fn vote_and_finalize(
    mechanism: &mut TestMechanism,
    state: &mut MechanismState,
    votes: &[(Address, ProposalId, Support, u128)],
) {
    for &(voter, id, support, weight) in votes {
        mechanism
            .cast_vote(state, ctx(voter, VOTING_OPEN), id, support, weight, None)
            .unwrap();
    }
    mechanism
        .finalize_vote_tally(state, ctx(CONTROLLER, VOTING_END))
        .unwrap();
}
