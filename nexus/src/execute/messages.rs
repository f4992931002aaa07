//! General message handlers.

use cosmwasm_std::{DepsMut, MessageInfo, Response};

use crate::error::ContractError;
use crate::general_message::enqueue_route_message;
use crate::keepers::Keepers;
use crate::msg::WasmCallMessage;
use crate::wasm::dispatch_wasm_messages;

/// Accept a batch of messages from the connection router contract.
pub fn execute_dispatch_wasm_messages(
    deps: DepsMut,
    info: MessageInfo,
    keepers: &Keepers,
    tx_bytes: &[u8],
    messages: Vec<WasmCallMessage>,
) -> Result<Response, ContractError> {
    dispatch_wasm_messages(deps.storage, keepers, tx_bytes, &info.sender, messages)
}

/// Queue a message for routing at the end of the block. Anyone may retry a
/// failed message.
pub fn execute_route_message(deps: DepsMut, id: String) -> Result<Response, ContractError> {
    enqueue_route_message(deps.storage, &id)?;

    Ok(Response::new()
        .add_attribute("method", "route_message")
        .add_attribute("id", id))
}
