//! In-memory asset ledger for tests and local simulation.

use super::{AssetError, AssetLedger, AssetResult};
use crate::types::Address;
use std::collections::{BTreeMap, BTreeSet};

/// Mock asset ledger keyed by `(token, holder)`.
#[derive(Debug, Clone, Default)]
pub struct MockAssetLedger {
    balances: BTreeMap<(Address, Address), u128>,
    /// Receivers whose incoming transfers are refused (exercises rollback).
    blocked_receivers: BTreeSet<Address>,
    transfers: u64,
}

impl MockAssetLedger {
    /// Create new mock ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `holder` out of thin air (for test setup).
    pub fn mint(&mut self, token: Address, holder: Address, amount: u128) {
        *self.balances.entry((token, holder)).or_insert(0) += amount;
    }

    /// Refuse every transfer to `receiver` until unblocked.
    pub fn block_receiver(&mut self, receiver: Address) {
        self.blocked_receivers.insert(receiver);
    }

    pub fn unblock_receiver(&mut self, receiver: &Address) {
        self.blocked_receivers.remove(receiver);
    }

    /// Number of successful transfers performed.
    pub fn transfer_count(&self) -> u64 {
        self.transfers
    }

    fn move_balance(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> AssetResult<()> {
        if self.blocked_receivers.contains(to) {
            return Err(AssetError::Rejected(format!("receiver {} is blocked", to)));
        }

        let available = self.balance_of(token, from);
        if available < amount {
            return Err(AssetError::InsufficientBalance {
                token: *token,
                holder: *from,
                requested: amount,
                available,
            });
        }

        self.balances.insert((*token, *from), available - amount);
        *self.balances.entry((*token, *to)).or_insert(0) += amount;
        self.transfers += 1;
        Ok(())
    }
}

impl AssetLedger for MockAssetLedger {
    fn transfer_in(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> AssetResult<()> {
        self.move_balance(token, from, to, amount)
    }

    fn transfer_out(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> AssetResult<()> {
        self.move_balance(token, from, to, amount)
    }

    fn balance_of(&self, token: &Address, holder: &Address) -> u128 {
        self.balances.get(&(*token, *holder)).copied().unwrap_or(0)
    }
}
