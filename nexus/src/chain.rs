//! Chain Registry
//!
//! Durable catalogue of known chains, their activation status, maintainer
//! sets and registered assets. Lookups are case-insensitive on chain name.

use cosmwasm_std::{Addr, Order, StdResult, Storage};
use tracing::{debug, info};

use nexus_common::{Asset, Chain, ChainName};

use crate::error::ContractError;
use crate::state::{ChainState, MaintainerState, CHAINS, CHAIN_BY_NATIVE_ASSET, CHAIN_STATES};

// ============================================================================
// Chains
// ============================================================================

/// Register (or re-register) a chain. A configured native asset is
/// registered along with it.
pub fn register_chain(storage: &mut dyn Storage, chain: &Chain) -> Result<(), ContractError> {
    chain.validate()?;

    let key = chain.name.normalized();
    CHAINS.save(storage, &key, chain)?;

    let mut state = get_chain_state(storage, chain)?;
    state.chain = chain.clone();
    CHAIN_STATES.save(storage, &key, &state)?;

    if let Some(denom) = &chain.native_asset {
        register_asset(storage, chain, &Asset::new(denom.clone(), true))?;
    }

    info!(chain = %chain.name, module = %chain.module, "registered chain");
    Ok(())
}

pub fn get_chain(storage: &dyn Storage, name: &ChainName) -> StdResult<Option<Chain>> {
    CHAINS.may_load(storage, &name.normalized())
}

/// Like [`get_chain`], but unknown chains are an error
pub fn must_get_chain(storage: &dyn Storage, name: &ChainName) -> Result<Chain, ContractError> {
    get_chain(storage, name)?.ok_or_else(|| ContractError::ChainNotFound {
        chain: name.to_string(),
    })
}

pub fn get_chains(storage: &dyn Storage) -> StdResult<Vec<Chain>> {
    CHAINS
        .range(storage, None, None, Order::Ascending)
        .map(|item| item.map(|(_, chain)| chain))
        .collect()
}

// ============================================================================
// Chain State
// ============================================================================

/// Load the chain's state, or a fresh one if nothing was written yet
pub fn get_chain_state(storage: &dyn Storage, chain: &Chain) -> StdResult<ChainState> {
    Ok(CHAIN_STATES
        .may_load(storage, &chain.name.normalized())?
        .unwrap_or_else(|| ChainState::new(chain.clone())))
}

pub(crate) fn set_chain_state(storage: &mut dyn Storage, state: &ChainState) -> StdResult<()> {
    CHAIN_STATES.save(storage, &state.chain.name.normalized(), state)
}

pub fn get_chain_states(storage: &dyn Storage) -> StdResult<Vec<ChainState>> {
    CHAIN_STATES
        .range(storage, None, None, Order::Ascending)
        .map(|item| item.map(|(_, state)| state))
        .collect()
}

pub fn activate_chain(storage: &mut dyn Storage, chain: &Chain) -> StdResult<()> {
    let mut state = get_chain_state(storage, chain)?;
    state.activated = true;
    set_chain_state(storage, &state)?;

    info!(chain = %chain.name, "chain activated");
    Ok(())
}

pub fn deactivate_chain(storage: &mut dyn Storage, chain: &Chain) -> StdResult<()> {
    let mut state = get_chain_state(storage, chain)?;
    state.activated = false;
    set_chain_state(storage, &state)?;

    info!(chain = %chain.name, "chain deactivated");
    Ok(())
}

pub fn is_chain_activated(storage: &dyn Storage, chain: &Chain) -> StdResult<bool> {
    Ok(get_chain_state(storage, chain)?.activated)
}

// ============================================================================
// Assets
// ============================================================================

/// Register an asset on a chain. Adding an asset twice is a no-op; claiming
/// a denom as native that another chain already owns is an error.
pub fn register_asset(
    storage: &mut dyn Storage,
    chain: &Chain,
    asset: &Asset,
) -> Result<(), ContractError> {
    asset.validate()?;
    must_get_chain(storage, &chain.name)?;

    if asset.is_native_asset {
        if let Some(owner) = CHAIN_BY_NATIVE_ASSET.may_load(storage, &asset.denom)? {
            if owner != chain.name {
                return Err(ContractError::AssetAlreadyNative {
                    asset: asset.denom.clone(),
                    chain: owner.to_string(),
                });
            }
        }
        CHAIN_BY_NATIVE_ASSET.save(storage, &asset.denom, &chain.name)?;
    }

    let mut state = get_chain_state(storage, chain)?;
    match state.assets.iter_mut().find(|a| a.denom == asset.denom) {
        // a later native claim upgrades the existing entry
        Some(existing) => existing.is_native_asset |= asset.is_native_asset,
        None => state.assets.push(asset.clone()),
    }
    set_chain_state(storage, &state)?;

    debug!(chain = %chain.name, denom = %asset.denom, native = asset.is_native_asset, "registered asset");
    Ok(())
}

pub fn is_asset_registered(storage: &dyn Storage, chain: &Chain, denom: &str) -> StdResult<bool> {
    Ok(get_chain_state(storage, chain)?.has_asset(denom))
}

pub fn get_chain_assets(storage: &dyn Storage, chain: &Chain) -> StdResult<Vec<Asset>> {
    Ok(get_chain_state(storage, chain)?.assets)
}

/// The chain a denom is native to, if any
pub fn get_chain_by_native_asset(storage: &dyn Storage, denom: &str) -> StdResult<Option<Chain>> {
    match CHAIN_BY_NATIVE_ASSET.may_load(storage, denom)? {
        Some(name) => get_chain(storage, &name),
        None => Ok(None),
    }
}

// ============================================================================
// Maintainers
// ============================================================================

pub fn add_chain_maintainer(
    storage: &mut dyn Storage,
    chain: &Chain,
    validator: &Addr,
) -> Result<(), ContractError> {
    let mut state = get_chain_state(storage, chain)?;
    if state.has_maintainer(validator) {
        return Err(ContractError::AlreadyMaintainer {
            validator: validator.to_string(),
            chain: chain.name.to_string(),
        });
    }

    state
        .maintainer_states
        .push(MaintainerState::new(validator.clone()));
    set_chain_state(storage, &state)?;

    info!(chain = %chain.name, validator = %validator, "chain maintainer added");
    Ok(())
}

pub fn remove_chain_maintainer(
    storage: &mut dyn Storage,
    chain: &Chain,
    validator: &Addr,
) -> Result<(), ContractError> {
    let mut state = get_chain_state(storage, chain)?;
    if !state.has_maintainer(validator) {
        return Err(ContractError::NotMaintainer {
            validator: validator.to_string(),
            chain: chain.name.to_string(),
        });
    }

    state.maintainer_states.retain(|m| &m.address != validator);
    set_chain_state(storage, &state)?;

    info!(chain = %chain.name, validator = %validator, "chain maintainer removed");
    Ok(())
}

pub fn get_chain_maintainers(storage: &dyn Storage, chain: &Chain) -> StdResult<Vec<Addr>> {
    Ok(get_chain_state(storage, chain)?.maintainers())
}

pub fn get_chain_maintainer_states(
    storage: &dyn Storage,
    chain: &Chain,
) -> StdResult<Vec<MaintainerState>> {
    Ok(get_chain_state(storage, chain)?.maintainer_states)
}

pub fn is_chain_maintainer(storage: &dyn Storage, chain: &Chain, validator: &Addr) -> StdResult<bool> {
    Ok(get_chain_state(storage, chain)?.has_maintainer(validator))
}

/// Record whether a maintainer missed the latest vote on the chain
pub fn mark_chain_maintainer_missing_vote(
    storage: &mut dyn Storage,
    chain: &Chain,
    validator: &Addr,
    missing: bool,
) -> Result<(), ContractError> {
    update_maintainer(storage, chain, validator, |m| m.missing_votes.add(missing))
}

/// Record whether a maintainer voted against the outcome of the latest poll
pub fn mark_chain_maintainer_incorrect_vote(
    storage: &mut dyn Storage,
    chain: &Chain,
    validator: &Addr,
    incorrect: bool,
) -> Result<(), ContractError> {
    update_maintainer(storage, chain, validator, |m| m.incorrect_votes.add(incorrect))
}

fn update_maintainer(
    storage: &mut dyn Storage,
    chain: &Chain,
    validator: &Addr,
    update: impl FnOnce(&mut MaintainerState),
) -> Result<(), ContractError> {
    let mut state = get_chain_state(storage, chain)?;
    let maintainer = state
        .maintainer_states
        .iter_mut()
        .find(|m| &m.address == validator)
        .ok_or_else(|| ContractError::NotMaintainer {
            validator: validator.to_string(),
            chain: chain.name.to_string(),
        })?;

    update(maintainer);
    set_chain_state(storage, &state)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{chain, evm_chain};
    use cosmwasm_std::testing::mock_dependencies;

    #[test]
    fn test_register_and_get_chain_case_insensitive() {
        let mut deps = mock_dependencies();
        let ethereum = evm_chain("Ethereum");

        register_chain(deps.as_mut().storage, &ethereum).unwrap();

        let found = get_chain(deps.as_ref().storage, &ChainName::unchecked("ETHEREUM"))
            .unwrap()
            .unwrap();
        assert_eq!(found.name.as_str(), "Ethereum");
        assert!(!is_chain_activated(deps.as_ref().storage, &ethereum).unwrap());
    }

    #[test]
    fn test_register_chain_registers_native_asset() {
        let mut deps = mock_dependencies();
        let axelarnet = chain("Axelarnet", Some("uaxl"), true, "axelarnet");

        register_chain(deps.as_mut().storage, &axelarnet).unwrap();

        assert!(is_asset_registered(deps.as_ref().storage, &axelarnet, "uaxl").unwrap());
        let owner = get_chain_by_native_asset(deps.as_ref().storage, "uaxl")
            .unwrap()
            .unwrap();
        assert_eq!(owner.name, axelarnet.name);

        // re-registration keeps the native claim
        register_chain(deps.as_mut().storage, &axelarnet).unwrap();
        assert_eq!(get_chain_assets(deps.as_ref().storage, &axelarnet).unwrap().len(), 1);
    }

    #[test]
    fn test_register_asset_native_uniqueness() {
        let mut deps = mock_dependencies();
        let ethereum = evm_chain("Ethereum");
        let avalanche = evm_chain("Avalanche");
        register_chain(deps.as_mut().storage, &ethereum).unwrap();
        register_chain(deps.as_mut().storage, &avalanche).unwrap();

        register_asset(deps.as_mut().storage, &ethereum, &Asset::new("weth", true)).unwrap();

        let err =
            register_asset(deps.as_mut().storage, &avalanche, &Asset::new("weth", true)).unwrap_err();
        assert_eq!(
            err,
            ContractError::AssetAlreadyNative {
                asset: "weth".to_string(),
                chain: "Ethereum".to_string(),
            }
        );

        // as a foreign asset it is fine, and idempotent
        register_asset(deps.as_mut().storage, &avalanche, &Asset::new("weth", false)).unwrap();
        register_asset(deps.as_mut().storage, &avalanche, &Asset::new("weth", false)).unwrap();
        assert_eq!(get_chain_assets(deps.as_ref().storage, &avalanche).unwrap().len(), 1);
    }

    #[test]
    fn test_register_asset_unknown_chain() {
        let mut deps = mock_dependencies();
        let err = register_asset(
            deps.as_mut().storage,
            &evm_chain("Ethereum"),
            &Asset::new("weth", false),
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::ChainNotFound { .. }));
    }

    #[test]
    fn test_activation() {
        let mut deps = mock_dependencies();
        let ethereum = evm_chain("Ethereum");
        register_chain(deps.as_mut().storage, &ethereum).unwrap();

        activate_chain(deps.as_mut().storage, &ethereum).unwrap();
        assert!(is_chain_activated(deps.as_ref().storage, &ethereum).unwrap());

        deactivate_chain(deps.as_mut().storage, &ethereum).unwrap();
        assert!(!is_chain_activated(deps.as_ref().storage, &ethereum).unwrap());
    }

    #[test]
    fn test_maintainers() {
        let mut deps = mock_dependencies();
        let ethereum = evm_chain("Ethereum");
        let validator = Addr::unchecked("axelarvaloper1");
        register_chain(deps.as_mut().storage, &ethereum).unwrap();

        add_chain_maintainer(deps.as_mut().storage, &ethereum, &validator).unwrap();
        assert!(is_chain_maintainer(deps.as_ref().storage, &ethereum, &validator).unwrap());

        let err = add_chain_maintainer(deps.as_mut().storage, &ethereum, &validator).unwrap_err();
        assert!(matches!(err, ContractError::AlreadyMaintainer { .. }));

        mark_chain_maintainer_missing_vote(deps.as_mut().storage, &ethereum, &validator, true)
            .unwrap();
        let states = get_chain_maintainer_states(deps.as_ref().storage, &ethereum).unwrap();
        assert_eq!(states[0].count_missing_votes(500), 1);

        remove_chain_maintainer(deps.as_mut().storage, &ethereum, &validator).unwrap();
        assert!(get_chain_maintainers(deps.as_ref().storage, &ethereum)
            .unwrap()
            .is_empty());

        let err = remove_chain_maintainer(deps.as_mut().storage, &ethereum, &validator).unwrap_err();
        assert!(matches!(err, ContractError::NotMaintainer { .. }));
    }
}
