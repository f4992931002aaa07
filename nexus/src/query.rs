//! Query handlers for the nexus ledger core.

use cosmwasm_std::{Coin, Deps, Env, StdError, StdResult};

use nexus_common::{
    Chain, ChainName, CrossChainAddress, FeeInfo, GeneralMessage, TransferDirection, TransferState,
};

use crate::address::{get_latest_deposit_address, get_recipient};
use crate::chain::{
    get_chain_assets, get_chain_by_native_asset, get_chain_maintainers, get_chain_state,
    get_chains, is_chain_activated, must_get_chain,
};
use crate::error::ContractError;
use crate::fee_manager::{compute_transfer_fee, get_fee_info, get_transfer_fees};
use crate::general_message::must_get_message;
use crate::msg::{
    AssetsResponse, ChainMaintainersResponse, ChainsResponse, LatestDepositAddressResponse,
    RecipientAddressResponse, TransferFeeResponse, TransferFeesResponse, TransferRateLimit,
    TransferRateLimitResponse, TransfersForChainResponse,
};
use crate::rate_limit::{current_epoch, get_rate_limit, get_transfer_epoch};
use crate::state::{ChainState, Config, Params, CONFIG, PARAMS};
use crate::transfer::get_transfers_for_chain_paginated;

/// Lift core errors into query errors
fn std_err(err: ContractError) -> StdError {
    match err {
        ContractError::Std(err) => err,
        err => StdError::generic_err(err.to_string()),
    }
}

fn chain(deps: Deps, name: &ChainName) -> StdResult<Chain> {
    must_get_chain(deps.storage, name).map_err(std_err)
}

// ============================================================================
// Core Queries
// ============================================================================

pub fn query_config(deps: Deps) -> StdResult<Config> {
    CONFIG.load(deps.storage)
}

pub fn query_params(deps: Deps) -> StdResult<Params> {
    PARAMS.load(deps.storage)
}

// ============================================================================
// Chain Queries
// ============================================================================

/// Chain names, optionally filtered by activation status
pub fn query_chains(deps: Deps, activated: Option<bool>) -> StdResult<ChainsResponse> {
    let mut chains = vec![];
    for chain in get_chains(deps.storage)? {
        if let Some(activated) = activated {
            if is_chain_activated(deps.storage, &chain)? != activated {
                continue;
            }
        }
        chains.push(chain.name);
    }

    Ok(ChainsResponse { chains })
}

pub fn query_chain_state(deps: Deps, name: ChainName) -> StdResult<ChainState> {
    let chain = chain(deps, &name)?;
    get_chain_state(deps.storage, &chain)
}

pub fn query_chain_maintainers(deps: Deps, name: ChainName) -> StdResult<ChainMaintainersResponse> {
    let chain = chain(deps, &name)?;
    Ok(ChainMaintainersResponse {
        maintainers: get_chain_maintainers(deps.storage, &chain)?,
    })
}

pub fn query_assets(deps: Deps, name: ChainName) -> StdResult<AssetsResponse> {
    let chain = chain(deps, &name)?;
    Ok(AssetsResponse {
        assets: get_chain_assets(deps.storage, &chain)?
            .into_iter()
            .map(|asset| asset.denom)
            .collect(),
    })
}

pub fn query_chain_by_native_asset(deps: Deps, asset: String) -> StdResult<Chain> {
    get_chain_by_native_asset(deps.storage, &asset)?
        .ok_or_else(|| StdError::not_found(format!("chain for native asset {}", asset)))
}

// ============================================================================
// Fee Queries
// ============================================================================

pub fn query_fee_info(deps: Deps, name: ChainName, asset: String) -> StdResult<FeeInfo> {
    let chain = chain(deps, &name)?;
    let (fee_info, _) = get_fee_info(deps.storage, &chain.name, &asset)?;
    Ok(fee_info)
}

pub fn query_transfer_fee(
    deps: Deps,
    source_chain: ChainName,
    destination_chain: ChainName,
    amount: Coin,
) -> StdResult<TransferFeeResponse> {
    let source = chain(deps, &source_chain)?;
    let destination = chain(deps, &destination_chain)?;

    let fee = compute_transfer_fee(deps.storage, &source, &destination, &amount).map_err(std_err)?;
    Ok(TransferFeeResponse {
        fee: Coin {
            denom: amount.denom,
            amount: fee,
        },
    })
}

pub fn query_transfer_fees(deps: Deps) -> StdResult<TransferFeesResponse> {
    Ok(TransferFeesResponse {
        fees: get_transfer_fees(deps.storage)?,
    })
}

// ============================================================================
// Transfer Queries
// ============================================================================

pub fn query_transfers_for_chain(
    deps: Deps,
    name: ChainName,
    state: TransferState,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<TransfersForChainResponse> {
    let chain = chain(deps, &name)?;
    Ok(TransfersForChainResponse {
        transfers: get_transfers_for_chain_paginated(deps.storage, &chain, state, start_after, limit)?,
    })
}

/// Rate limit of an asset on a chain with its usage in the current window
pub fn query_transfer_rate_limit(
    deps: Deps,
    env: Env,
    name: ChainName,
    asset: String,
) -> StdResult<TransferRateLimitResponse> {
    let chain = chain(deps, &name)?;
    let Some(rate_limit) = get_rate_limit(deps.storage, &chain.name, &asset)? else {
        return Ok(TransferRateLimitResponse {
            transfer_rate_limit: None,
        });
    };

    let usage = |direction: TransferDirection| -> StdResult<_> {
        Ok(
            get_transfer_epoch(deps.storage, &env, &chain.name, &asset, direction)?
                .map(|epoch| epoch.amount.amount)
                .unwrap_or_default(),
        )
    };

    let epoch = current_epoch(&env, rate_limit.window);
    let from = epoch.saturating_mul(rate_limit.window);
    let to = from.saturating_add(rate_limit.window);

    Ok(TransferRateLimitResponse {
        transfer_rate_limit: Some(TransferRateLimit {
            limit: rate_limit.limit.amount,
            window: rate_limit.window,
            incoming: usage(TransferDirection::Incoming)?,
            outgoing: usage(TransferDirection::Outgoing)?,
            time_left: to.saturating_sub(env.block.time.nanos()),
            from,
            to,
        }),
    })
}

// ============================================================================
// Address & Message Queries
// ============================================================================

pub fn query_recipient_address(
    deps: Deps,
    deposit_address: CrossChainAddress,
) -> StdResult<RecipientAddressResponse> {
    Ok(RecipientAddressResponse {
        recipient_address: get_recipient(deps.storage, &deposit_address)?,
    })
}

pub fn query_latest_deposit_address(
    deps: Deps,
    deposit_chain: ChainName,
    recipient_address: CrossChainAddress,
) -> StdResult<LatestDepositAddressResponse> {
    let deposit_chain = chain(deps, &deposit_chain)?;
    Ok(LatestDepositAddressResponse {
        deposit_address: get_latest_deposit_address(deps.storage, &deposit_chain, &recipient_address)?,
    })
}

pub fn query_message(deps: Deps, id: String) -> StdResult<GeneralMessage> {
    must_get_message(deps.storage, &id).map_err(std_err)
}
