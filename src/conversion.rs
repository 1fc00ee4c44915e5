//! Decimal conversion between the pooled asset and 18-decimal shares.
//!
//! Two regimes:
//! - Bootstrap (`total_supply == 0`): pure decimal scaling, exact.
//! - Proportional (`total_supply > 0`): `shares = assets * supply / assets_held`
//!   and the inverse, both rounding down so a round trip never returns more
//!   value than went in.
//!
//! Intermediate products are computed at 256 bits.

use crate::error::{AllocationError, AllocationResult};
use primitive_types::U256;

/// Fixed share precision.
pub const SHARE_DECIMALS: u8 = 18;

/// Largest asset precision accepted (keeps every scaling factor inside u128).
pub const MAX_ASSET_DECIMALS: u8 = 36;

/// Converter bound to one asset's native precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalConverter {
    asset_decimals: u8,
}

impl DecimalConverter {
    pub fn new(asset_decimals: u8) -> AllocationResult<Self> {
        if asset_decimals > MAX_ASSET_DECIMALS {
            return Err(AllocationError::InvalidConfig(format!(
                "asset decimals {} exceed maximum {}",
                asset_decimals, MAX_ASSET_DECIMALS
            )));
        }
        Ok(Self { asset_decimals })
    }

    pub fn asset_decimals(&self) -> u8 {
        self.asset_decimals
    }

    /// Scale native asset units to share units by the decimal difference.
    pub fn scale_to_shares(&self, assets: u128) -> AllocationResult<u128> {
        if self.asset_decimals <= SHARE_DECIMALS {
            assets
                .checked_mul(pow10(SHARE_DECIMALS - self.asset_decimals))
                .ok_or(AllocationError::ArithmeticOverflow)
        } else {
            Ok(assets / pow10(self.asset_decimals - SHARE_DECIMALS))
        }
    }

    /// Scale share units back to native asset units.
    pub fn scale_to_assets(&self, shares: u128) -> AllocationResult<u128> {
        if self.asset_decimals <= SHARE_DECIMALS {
            Ok(shares / pow10(SHARE_DECIMALS - self.asset_decimals))
        } else {
            shares
                .checked_mul(pow10(self.asset_decimals - SHARE_DECIMALS))
                .ok_or(AllocationError::ArithmeticOverflow)
        }
    }

    /// Assets → shares against the current pool.
    pub fn convert_to_shares(
        &self,
        assets: u128,
        total_supply: u128,
        total_assets: u128,
    ) -> AllocationResult<u128> {
        if total_supply == 0 {
            return self.scale_to_shares(assets);
        }
        if total_assets == 0 {
            return Err(AllocationError::EmptyPool);
        }
        mul_div_floor(assets, total_supply, total_assets)
    }

    /// Shares → assets against the current pool.
    pub fn convert_to_assets(
        &self,
        shares: u128,
        total_supply: u128,
        total_assets: u128,
    ) -> AllocationResult<u128> {
        if total_supply == 0 {
            return self.scale_to_assets(shares);
        }
        mul_div_floor(shares, total_assets, total_supply)
    }
}

/// `floor(a * b / denominator)` without intermediate overflow.
pub fn mul_div_floor(a: u128, b: u128, denominator: u128) -> AllocationResult<u128> {
    if denominator == 0 {
        return Err(AllocationError::EmptyPool);
    }
    // (2^128 - 1)^2 < 2^256, so the product cannot overflow.
    let quotient = U256::from(a) * U256::from(b) / U256::from(denominator);
    if quotient > U256::from(u128::MAX) {
        return Err(AllocationError::ArithmeticOverflow);
    }
    Ok(quotient.low_u128())
}

fn pow10(exp: u8) -> u128 {
    10u128.pow(u32::from(exp))
}
