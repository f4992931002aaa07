//! Chain registry handlers.
//!
//! This module handles:
//! - Chain maintainer (de)registration by validator proxies
//! - Chain and asset registration
//! - Chain activation and emergency deactivation

use cosmwasm_std::{Addr, DepsMut, Event, MessageInfo, Response, Storage, Uint128};
use tracing::{info, warn};

use nexus_common::{Asset, Chain, ChainName, AXELARNET_MODULE};

use crate::chain::{
    activate_chain, add_chain_maintainer, deactivate_chain, get_chain, get_chain_maintainers,
    get_chains, is_chain_activated, is_chain_maintainer, must_get_chain, register_asset,
    register_chain, remove_chain_maintainer,
};
use crate::error::ContractError;
use crate::keepers::{ProxyKeeper, StakingKeeper};
use crate::msg::ALL_CHAINS;
use crate::state::{CONFIG, PARAMS};

// ============================================================================
// Chain Maintainers
// ============================================================================

/// Register the sender's validator as maintainer of the given chains.
pub fn execute_register_chain_maintainer(
    deps: DepsMut,
    info: MessageInfo,
    proxy: &dyn ProxyKeeper,
    chains: Vec<ChainName>,
) -> Result<Response, ContractError> {
    let validator = operator_of(deps.storage, proxy, &info.sender)?;
    let mut response = Response::new()
        .add_attribute("method", "register_chain_maintainer")
        .add_attribute("validator", validator.as_str());

    for name in chains {
        let Some(chain) = get_chain(deps.storage, &name)? else {
            warn!(chain = %name, "{} is not a registered chain", name);
            continue;
        };

        // home chains have no maintainers
        if chain.is_from(AXELARNET_MODULE) {
            warn!(chain = %chain.name, "skipping maintainer registration for home module chain");
            continue;
        }

        if is_chain_maintainer(deps.storage, &chain, &validator)? {
            info!(chain = %chain.name, validator = %validator, "already a chain maintainer");
            continue;
        }

        add_chain_maintainer(deps.storage, &chain, &validator)?;
        response = response.add_event(maintainer_event("register", &chain, &validator));
    }

    Ok(response)
}

/// Deregister the sender's validator from the given chains.
pub fn execute_deregister_chain_maintainer(
    deps: DepsMut,
    info: MessageInfo,
    proxy: &dyn ProxyKeeper,
    chains: Vec<ChainName>,
) -> Result<Response, ContractError> {
    let validator = operator_of(deps.storage, proxy, &info.sender)?;
    let mut response = Response::new()
        .add_attribute("method", "deregister_chain_maintainer")
        .add_attribute("validator", validator.as_str());

    for name in chains {
        let chain = must_get_chain(deps.storage, &name)?;
        if !is_chain_maintainer(deps.storage, &chain, &validator)? {
            continue;
        }

        remove_chain_maintainer(deps.storage, &chain, &validator)?;
        response = response.add_event(maintainer_event("deregister", &chain, &validator));
    }

    Ok(response)
}

fn operator_of(storage: &dyn Storage, proxy: &dyn ProxyKeeper, sender: &Addr) -> Result<Addr, ContractError> {
    proxy
        .get_operator(storage, sender)
        .ok_or_else(|| ContractError::NotValidatorProxy {
            address: sender.to_string(),
        })
}

fn maintainer_event(action: &str, chain: &Chain, validator: &Addr) -> Event {
    Event::new("chain_maintainer")
        .add_attribute("action", action)
        .add_attribute("chain", chain.name.to_string())
        .add_attribute("address", validator.as_str())
}

// ============================================================================
// Registration (admin)
// ============================================================================

pub fn execute_register_chain(
    deps: DepsMut,
    info: MessageInfo,
    chain: Chain,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized);
    }

    register_chain(deps.storage, &chain)?;

    Ok(Response::new()
        .add_attribute("method", "register_chain")
        .add_attribute("chain", chain.name.to_string())
        .add_attribute("module", chain.module))
}

pub fn execute_register_asset(
    deps: DepsMut,
    info: MessageInfo,
    chain: ChainName,
    asset: Asset,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized);
    }

    let chain = must_get_chain(deps.storage, &chain)?;
    register_asset(deps.storage, &chain, &asset)?;

    Ok(Response::new()
        .add_attribute("method", "register_asset")
        .add_attribute("chain", chain.name.to_string())
        .add_attribute("asset", asset.denom)
        .add_attribute("is_native_asset", asset.is_native_asset.to_string()))
}

// ============================================================================
// Activation (admin)
// ============================================================================

/// Activate chains. Chains whose maintainers hold too little bonded power
/// are left inactive.
pub fn execute_activate_chain(
    deps: DepsMut,
    info: MessageInfo,
    staking: &dyn StakingKeeper,
    chains: Vec<ChainName>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized);
    }

    let mut response = Response::new().add_attribute("method", "activate_chain");
    for chain in resolve_chains(deps.storage, chains)? {
        if is_chain_activated(deps.storage, &chain)? {
            continue;
        }

        if !chain.is_from(AXELARNET_MODULE) && !meets_activation_threshold(deps.storage, staking, &chain)? {
            info!(chain = %chain.name, "activation threshold is not met");
            continue;
        }

        activate_chain(deps.storage, &chain)?;
        response = response.add_event(chain_event("activated", &chain));
    }

    Ok(response)
}

/// Deactivate chains in case of emergencies.
pub fn execute_deactivate_chain(
    deps: DepsMut,
    info: MessageInfo,
    chains: Vec<ChainName>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized);
    }

    let mut response = Response::new().add_attribute("method", "deactivate_chain");
    for chain in resolve_chains(deps.storage, chains)? {
        if !is_chain_activated(deps.storage, &chain)? {
            continue;
        }

        deactivate_chain(deps.storage, &chain)?;
        response = response.add_event(chain_event("deactivated", &chain));
    }

    Ok(response)
}

/// Whether the bonded, unjailed maintainers of the chain hold enough of the
/// total consensus power
pub fn meets_activation_threshold(
    storage: &dyn Storage,
    staking: &dyn StakingKeeper,
    chain: &Chain,
) -> Result<bool, ContractError> {
    let threshold = PARAMS.load(storage)?.chain_activation_threshold;

    let mut power = Uint128::zero();
    for maintainer in get_chain_maintainers(storage, chain)? {
        match staking.validator(storage, &maintainer) {
            Some(validator) if validator.bonded && !validator.jailed => {
                power = power.checked_add(validator.consensus_power).map_err(cosmwasm_std::StdError::from)?;
            }
            _ => continue,
        }
    }

    Ok(threshold.is_met_by(power, staking.last_total_power(storage)))
}

fn resolve_chains(storage: &dyn Storage, chains: Vec<ChainName>) -> Result<Vec<Chain>, ContractError> {
    if chains.first().map_or(false, |c| c.normalized() == ALL_CHAINS) {
        return Ok(get_chains(storage)?);
    }

    chains.iter().map(|name| must_get_chain(storage, name)).collect()
}

fn chain_event(action: &str, chain: &Chain) -> Event {
    Event::new("chain")
        .add_attribute("action", action)
        .add_attribute("chain", chain.name.to_string())
}
