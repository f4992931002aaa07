//! Contract-call paths between nexus and the VM
//!
//! # Ingress
//! The connection router contract submits batches of call descriptors. Each
//! becomes a [`GeneralMessage`] with a fresh id; messages for the home module
//! start `Approved`, all others `Processing`. Attached tokens are locked from
//! the connection router. The first failing descriptor fails the batch.
//!
//! # Egress
//! [`WasmMessageRoute`] delivers messages bound for VM-connected chains to the
//! gateway contract as `{"route_messages_to_router": [..]}`, executed as the
//! module account. Token transfers are not supported on this path.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{to_json_binary, Addr, Env, Event, HexBinary, Response, Storage};
use tracing::{debug, info};

use nexus_common::{
    Chain, CrossChainAddress, GeneralMessage, KeyType, MessageStatus, WasmMessage,
    AXELARNET_MODULE, WASM_MODULE,
};

use crate::chain::must_get_chain;
use crate::custody::LockableAsset;
use crate::error::ContractError;
use crate::general_message::{set_message_executed, set_new_message_from_wasm};
use crate::keepers::{Keepers, WasmKeeper};
use crate::message_id::generate_message_id;
use crate::msg::WasmCallMessage;
use crate::router::{MessageRoute, RoutingContext};
use crate::state::{CONFIG, PARAMS};

/// Message executed on the gateway contract
#[cw_serde]
pub enum GatewayExecuteMsg {
    RouteMessagesToRouter(Vec<WasmMessage>),
}

// ============================================================================
// Ingress
// ============================================================================

pub fn dispatch_wasm_messages(
    storage: &mut dyn Storage,
    keepers: &Keepers,
    tx_bytes: &[u8],
    caller: &Addr,
    messages: Vec<WasmCallMessage>,
) -> Result<Response, ContractError> {
    let params = PARAMS.load(storage)?;
    let connection_router = params
        .connection_router
        .ok_or(ContractError::ConnectionRouterNotSet)?;
    if *caller != connection_router {
        return Err(ContractError::NotConnectionRouter {
            address: caller.to_string(),
        });
    }

    let mut response = Response::new()
        .add_attribute("method", "dispatch_wasm_messages")
        .add_attribute("count", messages.len().to_string());

    for call in messages {
        let msg = to_general_message(storage, keepers, tx_bytes, caller, call)?;
        set_new_message_from_wasm(storage, &msg)?;

        response = response.add_event(
            Event::new("connection_router_message_received")
                .add_attribute("id", &msg.id)
                .add_attribute("source_chain", msg.source_chain().to_string())
                .add_attribute("destination_chain", msg.destination_chain().to_string())
                .add_attribute("status", msg.status.as_str()),
        );
    }

    Ok(response)
}

fn to_general_message(
    storage: &mut dyn Storage,
    keepers: &Keepers,
    tx_bytes: &[u8],
    caller: &Addr,
    call: WasmCallMessage,
) -> Result<GeneralMessage, ContractError> {
    let destination = must_get_chain(storage, &call.recipient_chain)?;

    let asset = match call.token {
        Some(token) => {
            let lockable = LockableAsset::new(storage, keepers.ibc, keepers.bank, token)?;
            lockable.lock_from(storage, caller)?;
            Some(lockable.get_asset())
        }
        None => None,
    };

    let id = generate_message_id(storage, tx_bytes)?;
    let status = if destination.is_from(AXELARNET_MODULE) {
        MessageStatus::Approved
    } else {
        MessageStatus::Processing
    };

    // VM-connected source chains live outside the registry
    let source = Chain {
        name: call.sender_chain,
        native_asset: None,
        supports_foreign_assets: false,
        key_type: KeyType::None,
        module: WASM_MODULE.to_string(),
    };

    Ok(GeneralMessage {
        id: id.to_string(),
        sender: CrossChainAddress::new(source, call.sender_address),
        recipient: CrossChainAddress::new(destination, call.recipient_address),
        payload_hash: HexBinary::from(call.payload_hash.to_vec()),
        status,
        asset,
        source_tx_id: HexBinary::from(call.source_tx_id.to_vec()),
        source_tx_index: call.source_tx_index,
    })
}

// ============================================================================
// Egress
// ============================================================================

/// Route for chains of the wasm module
pub struct WasmMessageRoute<'a> {
    wasm: &'a dyn WasmKeeper,
}

impl<'a> WasmMessageRoute<'a> {
    pub fn new(wasm: &'a dyn WasmKeeper) -> Self {
        Self { wasm }
    }
}

impl<'a> MessageRoute for WasmMessageRoute<'a> {
    fn route(
        &self,
        storage: &mut dyn Storage,
        _env: &Env,
        _ctx: &RoutingContext,
        msg: &GeneralMessage,
    ) -> Result<(), ContractError> {
        if msg.asset.is_some() {
            return Err(ContractError::AssetTransferNotSupported);
        }

        let gateway = PARAMS
            .load(storage)?
            .gateway
            .ok_or(ContractError::GatewayNotSet)?;
        let module_account = CONFIG.load(storage)?.module_account;

        let execute_msg =
            to_json_binary(&GatewayExecuteMsg::RouteMessagesToRouter(vec![WasmMessage::from(msg)]))?;
        debug!(id = %msg.id, gateway = %gateway, "executing gateway");
        self.wasm
            .execute(storage, &gateway, &module_account, &execute_msg, &[])?;

        set_message_executed(storage, &msg.id)?;

        info!(id = %msg.id, destination = %msg.destination_chain(), "routed message to gateway");
        Ok(())
    }
}
