//! Nexus - Entry Points
//!
//! The host drives the core through these functions:
//! - `instantiate` - Genesis import
//! - `execute` - Execute message handlers (see `execute/`)
//! - `end_block` - End-of-block processing (see `abci`)
//! - `query` - Query message handlers

use cosmwasm_std::{to_json_binary, Binary, Deps, DepsMut, Env, MessageInfo, Response, StdResult};
use cw2::set_contract_version;
use tracing::info;

use crate::abci;
use crate::address::AddressValidators;
use crate::error::ContractError;
use crate::execute::{
    execute_activate_chain, execute_deactivate_chain, execute_deregister_chain_maintainer,
    execute_dispatch_wasm_messages, execute_register_asset, execute_register_asset_fee,
    execute_register_chain, execute_register_chain_maintainer, execute_route_message,
    execute_set_transfer_rate_limit, execute_update_params,
};
use crate::genesis::init_genesis;
use crate::keepers::Keepers;
use crate::msg::{ExecuteMsg, InstantiateMsg, QueryMsg};
use crate::query::{
    query_assets, query_chain_by_native_asset, query_chain_maintainers, query_chain_state,
    query_chains, query_config, query_fee_info, query_latest_deposit_address, query_message,
    query_params, query_recipient_address, query_transfer_fee, query_transfer_fees,
    query_transfer_rate_limit, query_transfers_for_chain,
};
use crate::router::MessageRouter;
use crate::state::{CONTRACT_NAME, CONTRACT_VERSION};

/// Collaborators and wiring an execution runs against.
///
/// The core does not own bank, IBC, staking, proxy or wasm state. The host
/// hands in its [`Keepers`] together with the address validators and message
/// router it sealed at startup, plus the bytes of the transaction being
/// executed. Queries read only the core's own storage and take none of this.
pub struct ExecuteContext<'a> {
    pub keepers: Keepers<'a>,
    pub validators: &'a AddressValidators,
    pub router: &'a MessageRouter<'a>,
    /// Raw bytes of the enclosing transaction, hashed into message ids
    pub tx_bytes: &'a [u8],
}

// ============================================================================
// Instantiate
// ============================================================================

pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let genesis = msg.genesis;
    init_genesis(deps.storage, &genesis)?;

    info!(
        admin = %genesis.config.admin,
        home_chain = %genesis.config.home_chain,
        chains = genesis.chains.len(),
        "nexus instantiated"
    );

    Ok(Response::new()
        .add_attribute("method", "instantiate")
        .add_attribute("admin", genesis.config.admin)
        .add_attribute("home_chain", genesis.config.home_chain.to_string())
        .add_attribute("chain_count", genesis.chains.len().to_string()))
}

// ============================================================================
// Execute
// ============================================================================

/// Execute entry point. Takes the usual `deps`/`env`/`info` plus the host
/// wiring in `ctx`, which handlers borrow from as needed.
pub fn execute(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    ctx: &ExecuteContext,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        // Chain maintainers
        ExecuteMsg::RegisterChainMaintainer { chains } => {
            execute_register_chain_maintainer(deps, info, ctx.keepers.proxy, chains)
        }
        ExecuteMsg::DeregisterChainMaintainer { chains } => {
            execute_deregister_chain_maintainer(deps, info, ctx.keepers.proxy, chains)
        }

        // Governance
        ExecuteMsg::RegisterChain { chain } => execute_register_chain(deps, info, chain),
        ExecuteMsg::RegisterAsset { chain, asset } => {
            execute_register_asset(deps, info, chain, asset)
        }
        ExecuteMsg::ActivateChain { chains } => {
            execute_activate_chain(deps, info, ctx.keepers.staking, chains)
        }
        ExecuteMsg::DeactivateChain { chains } => execute_deactivate_chain(deps, info, chains),
        ExecuteMsg::RegisterAssetFee { fee_info } => {
            execute_register_asset_fee(deps, info, fee_info)
        }
        ExecuteMsg::SetTransferRateLimit {
            chain,
            limit,
            window,
        } => execute_set_transfer_rate_limit(deps, info, chain, limit, window),
        ExecuteMsg::UpdateParams { params } => execute_update_params(deps, info, params),

        // General messages
        ExecuteMsg::DispatchWasmMessages { messages } => {
            execute_dispatch_wasm_messages(deps, info, &ctx.keepers, ctx.tx_bytes, messages)
        }
        ExecuteMsg::RouteMessage { id } => execute_route_message(deps, id),
    }
}

// ============================================================================
// End Block
// ============================================================================

pub fn end_block(deps: DepsMut, env: Env, ctx: &ExecuteContext) -> Result<Response, ContractError> {
    abci::end_blocker(deps.storage, &env, ctx.keepers.proxy, ctx.validators, ctx.router)
}

// ============================================================================
// Query
// ============================================================================

pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => to_json_binary(&query_config(deps)?),
        QueryMsg::Params {} => to_json_binary(&query_params(deps)?),
        QueryMsg::Chains { activated } => to_json_binary(&query_chains(deps, activated)?),
        QueryMsg::ChainState { chain } => to_json_binary(&query_chain_state(deps, chain)?),
        QueryMsg::ChainMaintainers { chain } => {
            to_json_binary(&query_chain_maintainers(deps, chain)?)
        }
        QueryMsg::Assets { chain } => to_json_binary(&query_assets(deps, chain)?),
        QueryMsg::ChainByNativeAsset { asset } => {
            to_json_binary(&query_chain_by_native_asset(deps, asset)?)
        }
        QueryMsg::FeeInfo { chain, asset } => to_json_binary(&query_fee_info(deps, chain, asset)?),
        QueryMsg::TransferFee {
            source_chain,
            destination_chain,
            amount,
        } => to_json_binary(&query_transfer_fee(
            deps,
            source_chain,
            destination_chain,
            amount,
        )?),
        QueryMsg::TransfersForChain {
            chain,
            state,
            start_after,
            limit,
        } => to_json_binary(&query_transfers_for_chain(
            deps,
            chain,
            state,
            start_after,
            limit,
        )?),
        QueryMsg::TransferRateLimit { chain, asset } => {
            to_json_binary(&query_transfer_rate_limit(deps, env, chain, asset)?)
        }
        QueryMsg::Message { id } => to_json_binary(&query_message(deps, id)?),
        QueryMsg::RecipientAddress { deposit_address } => {
            to_json_binary(&query_recipient_address(deps, deposit_address)?)
        }
        QueryMsg::LatestDepositAddress {
            deposit_chain,
            recipient_address,
        } => to_json_binary(&query_latest_deposit_address(
            deps,
            deposit_chain,
            recipient_address,
        )?),
        QueryMsg::TransferFees {} => to_json_binary(&query_transfer_fees(deps)?),
    }
}
