//! Governance handlers for fees, rate limits and params.

use cosmwasm_std::{Coin, DepsMut, MessageInfo, Response};

use nexus_common::{ChainName, FeeInfo};

use crate::error::ContractError;
use crate::fee_manager::register_fee;
use crate::rate_limit::set_rate_limit;
use crate::state::{Params, CONFIG, PARAMS};

/// Register (or replace) the transfer fee of an asset on a chain.
pub fn execute_register_asset_fee(
    deps: DepsMut,
    info: MessageInfo,
    fee_info: FeeInfo,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized);
    }

    register_fee(deps.storage, &fee_info)?;

    Ok(Response::new()
        .add_attribute("method", "register_asset_fee")
        .add_attribute("chain", fee_info.chain.to_string())
        .add_attribute("asset", fee_info.asset)
        .add_attribute("fee_rate", fee_info.fee_rate.to_string())
        .add_attribute("min_fee", fee_info.min_fee)
        .add_attribute("max_fee", fee_info.max_fee))
}

/// Set the transfer rate limit of an asset on a chain.
pub fn execute_set_transfer_rate_limit(
    deps: DepsMut,
    info: MessageInfo,
    chain: ChainName,
    limit: Coin,
    window: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized);
    }

    set_rate_limit(deps.storage, &chain, &limit, window)?;

    Ok(Response::new()
        .add_attribute("method", "set_transfer_rate_limit")
        .add_attribute("chain", chain.to_string())
        .add_attribute("limit", limit.to_string())
        .add_attribute("window", window.to_string()))
}

pub fn execute_update_params(
    deps: DepsMut,
    info: MessageInfo,
    params: Params,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized);
    }

    params.validate()?;
    PARAMS.save(deps.storage, &params)?;

    Ok(Response::new()
        .add_attribute("method", "update_params")
        .add_attribute("end_blocker_limit", params.end_blocker_limit.to_string())
        .add_attribute(
            "chain_maintainer_check_window",
            params.chain_maintainer_check_window.to_string(),
        ))
}
