//! Fee Manager Module
//!
//! Transfer fees are configured per (chain, asset) and combined for
//! cross-chain transfers:
//!
//! | Parameter | Cross-chain value          |
//! |-----------|----------------------------|
//! | rate      | src.rate + dst.rate (≤ 1)  |
//! | min       | src.min + dst.min          |
//! | max       | src.max + dst.max          |
//!
//! `fee = clamp(truncate(rate * amount), min, max)`. A pair without fee info
//! is free. Collected fees accumulate per denom until withdrawn.

use cosmwasm_std::{Coin, Decimal, Order, StdResult, Storage, Uint128};
use tracing::debug;

use nexus_common::{Chain, ChainName, FeeInfo};

use crate::chain::{is_asset_registered, must_get_chain};
use crate::error::ContractError;
use crate::state::{FEE_INFOS, TRANSFER_FEES};

// ============================================================================
// Fee Info
// ============================================================================

/// Register (or replace) the fee info of an asset on a chain
pub fn register_fee(storage: &mut dyn Storage, fee_info: &FeeInfo) -> Result<(), ContractError> {
    fee_info.validate()?;

    let chain = must_get_chain(storage, &fee_info.chain)?;
    if !is_asset_registered(storage, &chain, &fee_info.asset)? {
        return Err(ContractError::AssetNotRegistered {
            asset: fee_info.asset.clone(),
            chain: chain.name.to_string(),
        });
    }

    FEE_INFOS.save(
        storage,
        (&fee_info.chain.normalized(), &fee_info.asset),
        fee_info,
    )?;

    debug!(chain = %fee_info.chain, asset = %fee_info.asset, "registered fee info");
    Ok(())
}

/// Fee info of the pair, and whether it was explicitly registered
pub fn get_fee_info(storage: &dyn Storage, chain: &ChainName, asset: &str) -> StdResult<(FeeInfo, bool)> {
    Ok(
        match FEE_INFOS.may_load(storage, (&chain.normalized(), asset))? {
            Some(fee_info) => (fee_info, true),
            None => (FeeInfo::zero(chain.clone(), asset), false),
        },
    )
}

pub fn get_fee_infos(storage: &dyn Storage) -> StdResult<Vec<FeeInfo>> {
    FEE_INFOS
        .range(storage, None, None, Order::Ascending)
        .map(|item| item.map(|(_, fee_info)| fee_info))
        .collect()
}

// ============================================================================
// Fee Calculation
// ============================================================================

/// `clamp(truncate(rate * amount), min, max)`
pub fn calculate_fee(amount: Uint128, rate: Decimal, min_fee: Uint128, max_fee: Uint128) -> Uint128 {
    amount.mul_floor(rate).max(min_fee).min(max_fee)
}

/// Fee for moving `asset` from `source` to `destination`
pub fn compute_transfer_fee(
    storage: &dyn Storage,
    source: &Chain,
    destination: &Chain,
    asset: &Coin,
) -> Result<Uint128, ContractError> {
    let (src, _) = get_fee_info(storage, &source.name, &asset.denom)?;
    let (dst, _) = get_fee_info(storage, &destination.name, &asset.denom)?;

    let rate = src.fee_rate + dst.fee_rate;
    if rate > Decimal::one() {
        return Err(ContractError::FeeRateTooHigh);
    }

    let min_fee = src.min_fee.checked_add(dst.min_fee).map_err(cosmwasm_std::StdError::from)?;
    let max_fee = src.max_fee.checked_add(dst.max_fee).map_err(cosmwasm_std::StdError::from)?;

    Ok(calculate_fee(asset.amount, rate, min_fee, max_fee))
}

// ============================================================================
// Fee Accumulator
// ============================================================================

pub fn add_transfer_fee(storage: &mut dyn Storage, fee: &Coin) -> Result<(), ContractError> {
    if fee.amount.is_zero() {
        return Ok(());
    }

    TRANSFER_FEES.update(storage, &fee.denom, |total| -> StdResult<_> {
        Ok(total.unwrap_or_default().checked_add(fee.amount)?)
    })?;
    Ok(())
}

/// Take collected fees out of the accumulator
pub fn sub_transfer_fee(storage: &mut dyn Storage, fee: &Coin) -> Result<(), ContractError> {
    let available = TRANSFER_FEES
        .may_load(storage, &fee.denom)?
        .unwrap_or_default();
    if available < fee.amount {
        return Err(ContractError::InsufficientFeeBalance {
            denom: fee.denom.clone(),
            available,
            requested: fee.amount,
        });
    }

    let remaining = available - fee.amount;
    if remaining.is_zero() {
        TRANSFER_FEES.remove(storage, &fee.denom);
    } else {
        TRANSFER_FEES.save(storage, &fee.denom, &remaining)?;
    }
    Ok(())
}

/// All collected fees, sorted by denom
pub fn get_transfer_fees(storage: &dyn Storage) -> StdResult<Vec<Coin>> {
    TRANSFER_FEES
        .range(storage, None, None, Order::Ascending)
        .map(|item| item.map(|(denom, amount)| Coin { denom, amount }))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
