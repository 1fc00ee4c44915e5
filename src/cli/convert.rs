use allocator::conversion::{DecimalConverter, SHARE_DECIMALS};
use allocator::AllocationResult;

/// Convert between asset units and shares
///
/// With an empty supply the conversion is a pure decimal rescale; otherwise
/// it is proportional to the supplied pool, rounded down.
pub fn execute(
    decimals: u8,
    to_shares: Option<u128>,
    to_assets: Option<u128>,
    total_supply: u128,
    total_assets: u128,
) -> Result<(), Box<dyn std::error::Error>> {
    let line = render(decimals, to_shares, to_assets, total_supply, total_assets)?;
    println!("{}", line);
    Ok(())
}

pub fn render(
    decimals: u8,
    to_shares: Option<u128>,
    to_assets: Option<u128>,
    total_supply: u128,
    total_assets: u128,
) -> AllocationResult<String> {
    let converter = DecimalConverter::new(decimals)?;
    let line = match (to_shares, to_assets) {
        (Some(assets), _) => {
            let shares = converter.convert_to_shares(assets, total_supply, total_assets)?;
            tracing::debug!(assets, shares, decimals, "converted to shares");
            format!(
                "{} assets ({} decimals) = {} shares ({} decimals)",
                assets, decimals, shares, SHARE_DECIMALS
            )
        }
        (None, Some(shares)) => {
            let assets = converter.convert_to_assets(shares, total_supply, total_assets)?;
            tracing::debug!(assets, shares, decimals, "converted to assets");
            format!(
                "{} shares ({} decimals) = {} assets ({} decimals)",
                shares, SHARE_DECIMALS, assets, decimals
            )
        }
        (None, None) => {
            return Err(allocator::AllocationError::InvalidConfig(
                "one of --to-shares or --to-assets is required".to_string(),
            ))
        }
    };
    Ok(line)
}
