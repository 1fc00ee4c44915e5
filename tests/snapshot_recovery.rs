//! Integration tests for persisting and resuming an allocation instance.
//!
//! - Snapshot mid-vote → restore → continue the lifecycle
//! - Registry adopts restored instances alongside fresh ones
//! - Tampered snapshots are refused

use allocator::asset::MockAssetLedger;
use allocator::forwarding::ForwardingPolicy;
use allocator::mechanism::{AllocationMechanism, MechanismConfig, MechanismState};
use allocator::registry::InstanceRegistry;
use allocator::serialization::{
    decode_snapshot, encode_snapshot, load_snapshot, save_snapshot, SerializationError,
};
use allocator::strategy::LinearStrategy;
use allocator::{Address, CallContext, Support};
use tempfile::TempDir;

fn config() -> MechanismConfig {
    MechanismConfig {
        asset: Address::from_low_u64(0xa55e7),
        asset_decimals: 6,
        share_name: "Allocation Shares".to_string(),
        share_symbol: "ALLOC".to_string(),
        voting_delay: 10,
        voting_period: 100,
        quorum_shares: 1_000_000_000_000_000_000,
        timelock_delay: 5,
        grace_period: 30,
        controller: Address::from_low_u64(0xc0),
        mechanism: Address::from_low_u64(0x11),
        start_time: 0,
        forwarding_policy: ForwardingPolicy::BestEffort,
    }
}

fn alice() -> Address {
    Address::from_low_u64(0xa1)
}

fn grantee() -> Address {
    Address::from_low_u64(0xbeef)
}

fn service() -> AllocationMechanism<LinearStrategy, MockAssetLedger> {
    let mut assets = MockAssetLedger::new();
    assets.mint(config().asset, alice(), 10_000_000);
    AllocationMechanism::new(LinearStrategy, assets)
}

#[test]
fn test_resume_lifecycle_from_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("round.snapshot");
    let mut mechanism = service();

    let mut state = MechanismState::new(config()).unwrap();
    // 5 units of a 6-decimal asset.
    mechanism
        .signup(&mut state, CallContext::new(alice(), 0), 5_000_000)
        .unwrap();
    let id = mechanism
        .propose(&mut state, CallContext::new(alice(), 0), grantee(), "grant")
        .unwrap();
    mechanism
        .cast_vote(
            &mut state,
            CallContext::new(alice(), 11),
            id,
            Support::For,
            2_000_000_000_000_000_000,
            None,
        )
        .unwrap();
    save_snapshot(&path, &state).unwrap();
    drop(state);

    let mut restored = load_snapshot(&path).unwrap();
    assert_eq!(restored.last_seen_time(), 11);
    assert_eq!(restored.voting_power(&alice()), 3_000_000_000_000_000_000);
    assert_eq!(restored.config().forwarding_policy, ForwardingPolicy::BestEffort);

    // The restored clock still refuses to run backwards.
    assert!(mechanism
        .cast_vote(&mut restored, CallContext::new(alice(), 10), id, Support::For, 1, None)
        .is_err());

    mechanism
        .finalize_vote_tally(&mut restored, CallContext::new(config().controller, 110))
        .unwrap();
    let shares = mechanism
        .queue_proposal(&mut restored, CallContext::new(alice(), 110), id)
        .unwrap();
    assert_eq!(shares, 2_000_000_000_000_000_000);

    // Sole holder: every share redeems against the whole 5-unit pool.
    let paid = mechanism
        .redeem(&mut restored, CallContext::new(grantee(), 115), shares, grantee(), grantee())
        .unwrap();
    assert_eq!(paid, 5_000_000);
}

#[test]
fn test_registry_adopts_restored_instance() {
    let mut mechanism = service();
    let mut state = MechanismState::new(config()).unwrap();
    mechanism
        .signup(&mut state, CallContext::new(alice(), 0), 1_000_000)
        .unwrap();
    let bytes = encode_snapshot(&state).unwrap();

    let mut registry = InstanceRegistry::new();
    let fresh = registry.create(config()).unwrap();
    let restored = registry.insert(decode_snapshot(&bytes).unwrap());

    assert_eq!(registry.ids().len(), 2);
    assert!(registry.get(&restored).unwrap().is_registered(&alice()));
    assert!(!registry.get(&fresh).unwrap().is_registered(&alice()));
}

#[test]
fn test_truncated_snapshot_refused() {
    let state = MechanismState::new(config()).unwrap();
    let bytes = encode_snapshot(&state).unwrap();

    let result = decode_snapshot(&bytes[..bytes.len() / 2]);
    assert!(matches!(result, Err(SerializationError::Decode(_))));
}
