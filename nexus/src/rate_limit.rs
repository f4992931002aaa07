//! Rate Limiter
//!
//! Caps the volume of an asset moving into or out of a chain per time
//! window. Windows are fixed buckets, `epoch = block_time_ns / window_ns`;
//! each direction keeps one counter that resets when the epoch changes.

use cosmwasm_std::{Coin, Env, Order, StdResult, Storage, Uint128};
use tracing::warn;

use nexus_common::{Chain, ChainName, TransferDirection};

use crate::chain::{is_asset_registered, must_get_chain};
use crate::error::ContractError;
use crate::state::{RateLimit, TransferEpoch, RATE_LIMITS, TRANSFER_EPOCHS};

const DIRECTIONS: [TransferDirection; 2] = [TransferDirection::Incoming, TransferDirection::Outgoing];

/// Set the rate limit of an asset on a chain. A limit of `Uint128::MAX`
/// removes it. Either way the epochs of both directions restart.
pub fn set_rate_limit(
    storage: &mut dyn Storage,
    chain_name: &ChainName,
    limit: &Coin,
    window_nanos: u64,
) -> Result<(), ContractError> {
    let chain = must_get_chain(storage, chain_name)?;
    if !is_asset_registered(storage, &chain, &limit.denom)? {
        return Err(ContractError::AssetNotRegistered {
            asset: limit.denom.clone(),
            chain: chain.name.to_string(),
        });
    }

    let removing = limit.amount == Uint128::MAX;
    if !removing && window_nanos == 0 {
        return Err(ContractError::InvalidRateLimitWindow);
    }

    let chain_key = chain.name.normalized();
    for direction in DIRECTIONS {
        TRANSFER_EPOCHS.remove(storage, (&chain_key, &limit.denom, direction.as_str()));
    }

    if removing {
        RATE_LIMITS.remove(storage, (&chain_key, &limit.denom));
        return Ok(());
    }

    RATE_LIMITS.save(
        storage,
        (&chain_key, &limit.denom),
        &RateLimit {
            chain: chain.name,
            limit: limit.clone(),
            window: window_nanos,
        },
    )?;
    Ok(())
}

pub fn get_rate_limit(storage: &dyn Storage, chain: &ChainName, denom: &str) -> StdResult<Option<RateLimit>> {
    RATE_LIMITS.may_load(storage, (&chain.normalized(), denom))
}

pub fn get_rate_limits(storage: &dyn Storage) -> StdResult<Vec<RateLimit>> {
    RATE_LIMITS
        .range(storage, None, None, Order::Ascending)
        .map(|item| item.map(|(_, limit)| limit))
        .collect()
}

/// Epoch index of the block time for the given window
pub fn current_epoch(env: &Env, window_nanos: u64) -> u64 {
    env.block.time.nanos() / window_nanos
}

/// Usage in the current epoch, zero if the stored one is stale or missing
pub fn get_transfer_epoch(
    storage: &dyn Storage,
    env: &Env,
    chain: &ChainName,
    denom: &str,
    direction: TransferDirection,
) -> StdResult<Option<TransferEpoch>> {
    let Some(rate_limit) = get_rate_limit(storage, chain, denom)? else {
        return Ok(None);
    };
    let epoch = current_epoch(env, rate_limit.window);

    let stored = TRANSFER_EPOCHS.may_load(storage, (&chain.normalized(), denom, direction.as_str()))?;
    Ok(Some(match stored {
        Some(transfer_epoch) if transfer_epoch.epoch == epoch => transfer_epoch,
        _ => TransferEpoch {
            chain: chain.clone(),
            amount: Coin {
                denom: denom.to_string(),
                amount: Uint128::zero(),
            },
            epoch,
            direction,
        },
    }))
}

pub fn get_transfer_epochs(storage: &dyn Storage) -> StdResult<Vec<TransferEpoch>> {
    TRANSFER_EPOCHS
        .range(storage, None, None, Order::Ascending)
        .map(|item| item.map(|(_, epoch)| epoch))
        .collect()
}

pub(crate) fn set_transfer_epoch(storage: &mut dyn Storage, transfer_epoch: &TransferEpoch) -> StdResult<()> {
    TRANSFER_EPOCHS.save(
        storage,
        (
            &transfer_epoch.chain.normalized(),
            &transfer_epoch.amount.denom,
            transfer_epoch.direction.as_str(),
        ),
        transfer_epoch,
    )
}

/// Count `asset` against the chain's limit. Transfers that would go over the
/// limit fail and are not counted.
pub fn rate_limit_transfer(
    storage: &mut dyn Storage,
    env: &Env,
    chain: &Chain,
    asset: &Coin,
    direction: TransferDirection,
) -> Result<(), ContractError> {
    let Some(rate_limit) = get_rate_limit(storage, &chain.name, &asset.denom)? else {
        return Ok(());
    };
    let Some(mut transfer_epoch) = get_transfer_epoch(storage, env, &chain.name, &asset.denom, direction)? else {
        return Ok(());
    };

    let total = transfer_epoch
        .amount
        .amount
        .checked_add(asset.amount)
        .map_err(cosmwasm_std::StdError::from)?;

    if total > rate_limit.limit.amount {
        warn!(
            chain = %chain.name,
            denom = %asset.denom,
            amount = %asset.amount,
            limit = %rate_limit.limit.amount,
            direction = direction.as_str(),
            "transfer rate limit exceeded"
        );
        return Err(ContractError::RateLimitExceeded {
            chain: chain.name.to_string(),
            denom: asset.denom.clone(),
            amount: asset.amount,
            limit: rate_limit.limit.amount,
            direction: direction.as_str().to_string(),
        });
    }

    transfer_epoch.amount.amount = total;
    set_transfer_epoch(storage, &transfer_epoch)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{register_asset, register_chain};
    use crate::testing::evm_chain;
    use cosmwasm_std::coin;
    use cosmwasm_std::testing::{mock_dependencies, mock_env};
    use nexus_common::Asset;

    const HOUR: u64 = 3_600_000_000_000;

    fn setup(storage: &mut dyn Storage) -> Chain {
        let ethereum = evm_chain("Ethereum");
        register_chain(storage, &ethereum).unwrap();
        register_asset(storage, &ethereum, &Asset::new("uusdc", false)).unwrap();
        ethereum
    }

    fn env_at(nanos: u64) -> Env {
        let mut env = mock_env();
        env.block.time = cosmwasm_std::Timestamp::from_nanos(nanos);
        env
    }

    #[test]
    fn test_no_limit_is_unrestricted() {
        let mut deps = mock_dependencies();
        let ethereum = setup(deps.as_mut().storage);

        rate_limit_transfer(
            deps.as_mut().storage,
            &mock_env(),
            &ethereum,
            &coin(u128::MAX, "uusdc"),
            TransferDirection::Incoming,
        )
        .unwrap();
        assert!(get_transfer_epochs(deps.as_ref().storage).unwrap().is_empty());
    }

    #[test]
    fn test_exact_limit_then_one_over() {
        let mut deps = mock_dependencies();
        let ethereum = setup(deps.as_mut().storage);
        set_rate_limit(deps.as_mut().storage, &ethereum.name, &coin(1000, "uusdc"), HOUR).unwrap();

        let env = env_at(10 * HOUR + 1);
        rate_limit_transfer(deps.as_mut().storage, &env, &ethereum, &coin(1000, "uusdc"), TransferDirection::Outgoing)
            .unwrap();

        let err = rate_limit_transfer(deps.as_mut().storage, &env, &ethereum, &coin(1, "uusdc"), TransferDirection::Outgoing)
            .unwrap_err();
        assert!(matches!(err, ContractError::RateLimitExceeded { .. }));

        // failed attempt did not count
        let usage = get_transfer_epoch(deps.as_ref().storage, &env, &ethereum.name, "uusdc", TransferDirection::Outgoing)
            .unwrap()
            .unwrap();
        assert_eq!(usage.amount.amount, Uint128::new(1000));

        // the other direction is tracked separately
        rate_limit_transfer(deps.as_mut().storage, &env, &ethereum, &coin(1000, "uusdc"), TransferDirection::Incoming)
            .unwrap();

        // next epoch starts from zero
        let next = env_at(11 * HOUR);
        rate_limit_transfer(deps.as_mut().storage, &next, &ethereum, &coin(1, "uusdc"), TransferDirection::Outgoing)
            .unwrap();
    }

    #[test]
    fn test_set_rate_limit_resets_epochs() {
        let mut deps = mock_dependencies();
        let ethereum = setup(deps.as_mut().storage);
        let env = env_at(HOUR / 2);

        set_rate_limit(deps.as_mut().storage, &ethereum.name, &coin(100, "uusdc"), HOUR).unwrap();
        rate_limit_transfer(deps.as_mut().storage, &env, &ethereum, &coin(100, "uusdc"), TransferDirection::Incoming)
            .unwrap();

        set_rate_limit(deps.as_mut().storage, &ethereum.name, &coin(100, "uusdc"), HOUR).unwrap();
        rate_limit_transfer(deps.as_mut().storage, &env, &ethereum, &coin(100, "uusdc"), TransferDirection::Incoming)
            .unwrap();
    }

    #[test]
    fn test_max_limit_removes_rate_limit() {
        let mut deps = mock_dependencies();
        let ethereum = setup(deps.as_mut().storage);

        set_rate_limit(deps.as_mut().storage, &ethereum.name, &coin(100, "uusdc"), HOUR).unwrap();
        assert!(get_rate_limit(deps.as_ref().storage, &ethereum.name, "uusdc").unwrap().is_some());

        set_rate_limit(deps.as_mut().storage, &ethereum.name, &coin(u128::MAX, "uusdc"), HOUR).unwrap();
        assert!(get_rate_limit(deps.as_ref().storage, &ethereum.name, "uusdc").unwrap().is_none());
    }

    #[test]
    fn test_set_rate_limit_validation() {
        let mut deps = mock_dependencies();
        let ethereum = setup(deps.as_mut().storage);

        let err = set_rate_limit(deps.as_mut().storage, &ethereum.name, &coin(100, "weth"), HOUR).unwrap_err();
        assert!(matches!(err, ContractError::AssetNotRegistered { .. }));

        let err = set_rate_limit(deps.as_mut().storage, &ChainName::unchecked("Unknown"), &coin(100, "uusdc"), HOUR)
            .unwrap_err();
        assert!(matches!(err, ContractError::ChainNotFound { .. }));

        let err = set_rate_limit(deps.as_mut().storage, &ethereum.name, &coin(100, "uusdc"), 0).unwrap_err();
        assert_eq!(err, ContractError::InvalidRateLimitWindow);
    }
}
