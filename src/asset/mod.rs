//! Asset boundary.
//!
//! The engine pulls deposits in at signup and pushes value out at redemption
//! and sweep. Whatever backs this trait must move exactly the requested amount
//! per call; fee-on-transfer or rebasing assets break pool accounting.

pub mod mock;

pub use mock::MockAssetLedger;

use crate::types::Address;

/// Result type for asset operations.
pub type AssetResult<T> = Result<T, AssetError>;

/// Asset transfer errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    #[error("Insufficient balance of {token} for {holder}: requested {requested}, available {available}")]
    InsufficientBalance {
        token: Address,
        holder: Address,
        requested: u128,
        available: u128,
    },

    #[error("Transfer rejected: {0}")]
    Rejected(String),
}

/// Token ledger the engine settles against.
///
/// `token == Address::ZERO` denotes the native value of the host.
pub trait AssetLedger {
    /// Pull `amount` of `token` from `from` into `to` (the mechanism account).
    fn transfer_in(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> AssetResult<()>;

    /// Push `amount` of `token` from `from` (the mechanism account) to `to`.
    fn transfer_out(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> AssetResult<()>;

    /// Raw balance of `holder` in `token`.
    fn balance_of(&self, token: &Address, holder: &Address) -> u128;
}
