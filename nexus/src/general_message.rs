//! General Messages
//!
//! Store and lifecycle of arbitrary-payload cross-chain messages.
//!
//! ```text
//! Approved ──┐
//!            ├─> Processing ──> Sent ──┬─> Executed
//! Failed ────┘        │                └─> Failed
//!                     ├─────────────────────> Executed
//!                     └─────────────────────> Failed
//! ```
//!
//! Only `Approved` and `Failed` messages can be (re)queued for routing.

use cosmwasm_std::{Env, Order, StdResult, Storage};
use tracing::{debug, info};

use nexus_common::{ChainName, CrossChainAddress, GeneralMessage, MessageStatus, WASM_MODULE};

use crate::address::AddressValidators;
use crate::chain::{is_asset_registered, is_chain_activated, must_get_chain};
use crate::error::ContractError;
use crate::router::{MessageRouter, RoutingContext};
use crate::state::{MESSAGES, PROCESSING_MESSAGES, ROUTE_MESSAGE_QUEUE};

// ============================================================================
// Creation
// ============================================================================

/// Store a message approved on its source chain
pub fn set_new_message(storage: &mut dyn Storage, msg: &GeneralMessage) -> Result<(), ContractError> {
    ensure_status(msg, &[MessageStatus::Approved])?;
    insert_message(storage, msg)?;

    info!(
        id = %msg.id,
        sender = %msg.sender,
        recipient = %msg.recipient,
        payload_hash = %msg.payload_hash,
        "general message received"
    );
    Ok(())
}

/// Store a message originating from a contract. Messages that cannot be
/// executed in-protocol start out `Processing`.
pub fn set_new_message_from_wasm(
    storage: &mut dyn Storage,
    msg: &GeneralMessage,
) -> Result<(), ContractError> {
    ensure_status(msg, &[MessageStatus::Approved, MessageStatus::Processing])?;
    insert_message(storage, msg)?;

    if msg.is(MessageStatus::Processing) {
        set_processing_index(storage, msg)?;
    }

    info!(
        id = %msg.id,
        sender = %msg.sender,
        recipient = %msg.recipient,
        status = msg.status.as_str(),
        "general message received from wasm"
    );
    Ok(())
}

fn insert_message(storage: &mut dyn Storage, msg: &GeneralMessage) -> Result<(), ContractError> {
    msg.validate_basic()?;

    if MESSAGES.has(storage, &msg.id) {
        return Err(ContractError::MessageAlreadyExists { id: msg.id.clone() });
    }

    MESSAGES.save(storage, &msg.id, msg)?;
    Ok(())
}

// ============================================================================
// Lookup
// ============================================================================

pub fn get_message(storage: &dyn Storage, id: &str) -> StdResult<Option<GeneralMessage>> {
    MESSAGES.may_load(storage, id)
}

pub fn must_get_message(storage: &dyn Storage, id: &str) -> Result<GeneralMessage, ContractError> {
    get_message(storage, id)?.ok_or_else(|| ContractError::MessageNotFound { id: id.to_string() })
}

pub fn get_messages(storage: &dyn Storage) -> StdResult<Vec<GeneralMessage>> {
    MESSAGES
        .range(storage, None, None, Order::Ascending)
        .map(|item| item.map(|(_, msg)| msg))
        .collect()
}

/// Up to `limit` messages in `Processing` destined for `chain`
pub fn get_processing_messages(
    storage: &dyn Storage,
    chain: &ChainName,
    limit: usize,
) -> Result<Vec<GeneralMessage>, ContractError> {
    let ids = PROCESSING_MESSAGES
        .prefix(&chain.normalized())
        .keys(storage, None, None, Order::Ascending)
        .take(limit)
        .collect::<StdResult<Vec<String>>>()?;

    ids.iter().map(|id| must_get_message(storage, id)).collect()
}

// ============================================================================
// Status Transitions
// ============================================================================

/// Validate the message and move it to `Processing`
pub fn set_message_processing(
    storage: &mut dyn Storage,
    validators: &AddressValidators,
    id: &str,
) -> Result<GeneralMessage, ContractError> {
    let mut msg = must_get_message(storage, id)?;
    ensure_status(&msg, &[MessageStatus::Approved, MessageStatus::Failed])?;

    validate_message(storage, validators, &msg)?;

    msg.status = MessageStatus::Processing;
    MESSAGES.save(storage, &msg.id, &msg)?;
    set_processing_index(storage, &msg)?;

    debug!(id = %msg.id, "general message processing");
    Ok(msg)
}

/// The destination chain picked the message up
pub fn set_message_sent(storage: &mut dyn Storage, id: &str) -> Result<(), ContractError> {
    transition(storage, id, &[MessageStatus::Processing], MessageStatus::Sent)
}

pub fn set_message_executed(storage: &mut dyn Storage, id: &str) -> Result<(), ContractError> {
    transition(
        storage,
        id,
        &[MessageStatus::Processing, MessageStatus::Sent],
        MessageStatus::Executed,
    )
}

pub fn set_message_failed(storage: &mut dyn Storage, id: &str) -> Result<(), ContractError> {
    transition(
        storage,
        id,
        &[MessageStatus::Processing, MessageStatus::Sent],
        MessageStatus::Failed,
    )
}

fn transition(
    storage: &mut dyn Storage,
    id: &str,
    from: &[MessageStatus],
    to: MessageStatus,
) -> Result<(), ContractError> {
    let mut msg = must_get_message(storage, id)?;
    ensure_status(&msg, from)?;

    PROCESSING_MESSAGES.remove(storage, (&msg.destination_chain().normalized(), &msg.id));
    msg.status = to;
    MESSAGES.save(storage, &msg.id, &msg)?;

    info!(id = %msg.id, status = to.as_str(), "general message status changed");
    Ok(())
}

fn set_processing_index(storage: &mut dyn Storage, msg: &GeneralMessage) -> StdResult<()> {
    PROCESSING_MESSAGES.save(storage, (&msg.destination_chain().normalized(), &msg.id), &true)
}

fn ensure_status(msg: &GeneralMessage, allowed: &[MessageStatus]) -> Result<(), ContractError> {
    if allowed.contains(&msg.status) {
        return Ok(());
    }

    Err(ContractError::InvalidMessageStatus {
        id: msg.id.clone(),
        status: msg.status.as_str().to_string(),
        expected: allowed
            .iter()
            .map(MessageStatus::as_str)
            .collect::<Vec<_>>()
            .join(", "),
    })
}

// ============================================================================
// Validation
// ============================================================================

/// Wasm chains and addresses are opaque to nexus, so their side of a
/// message is not checked here. Messages to or from wasm carry no asset.
fn validate_message(
    storage: &dyn Storage,
    validators: &AddressValidators,
    msg: &GeneralMessage,
) -> Result<(), ContractError> {
    if !msg.sender.chain.is_from(WASM_MODULE) {
        validate_address_and_asset(storage, validators, &msg.sender, msg)?;
    }

    if !msg.recipient.chain.is_from(WASM_MODULE) {
        validate_address_and_asset(storage, validators, &msg.recipient, msg)?;
    }

    let touches_wasm =
        msg.sender.chain.is_from(WASM_MODULE) || msg.recipient.chain.is_from(WASM_MODULE);
    if touches_wasm && msg.asset.is_some() {
        return Err(ContractError::AssetTransferNotSupported);
    }

    Ok(())
}

fn validate_address_and_asset(
    storage: &dyn Storage,
    validators: &AddressValidators,
    address: &CrossChainAddress,
    msg: &GeneralMessage,
) -> Result<(), ContractError> {
    let chain = must_get_chain(storage, &address.chain.name)?;
    if !is_chain_activated(storage, &chain)? {
        return Err(ContractError::ChainNotActivated {
            chain: chain.name.to_string(),
        });
    }

    validators.validate_address(address)?;

    match &msg.asset {
        Some(asset) if !is_asset_registered(storage, &chain, &asset.denom)? => {
            Err(ContractError::AssetNotRegistered {
                asset: asset.denom.clone(),
                chain: chain.name.to_string(),
            })
        }
        _ => Ok(()),
    }
}

// ============================================================================
// Routing
// ============================================================================

/// Queue an `Approved` or `Failed` message for routing in the end blocker
pub fn enqueue_route_message(storage: &mut dyn Storage, id: &str) -> Result<(), ContractError> {
    let msg = must_get_message(storage, id)?;
    ensure_status(&msg, &[MessageStatus::Approved, MessageStatus::Failed])?;

    ROUTE_MESSAGE_QUEUE.push_back(storage, &msg.id)?;

    debug!(id = %msg.id, "general message queued for routing");
    Ok(())
}

/// Next queued message, oldest first
pub fn dequeue_route_message(storage: &mut dyn Storage) -> Result<Option<GeneralMessage>, ContractError> {
    match ROUTE_MESSAGE_QUEUE.pop_front(storage)? {
        Some(id) => must_get_message(storage, &id).map(Some),
        None => Ok(None),
    }
}

pub fn route_queue_len(storage: &dyn Storage) -> StdResult<u32> {
    ROUTE_MESSAGE_QUEUE.len(storage)
}

/// Mark the message `Processing`, then hand it to the route of its
/// destination module
pub fn route_message(
    storage: &mut dyn Storage,
    env: &Env,
    validators: &AddressValidators,
    router: &MessageRouter,
    id: &str,
    ctx: &RoutingContext,
) -> Result<(), ContractError> {
    let msg = set_message_processing(storage, validators, id)?;

    router
        .route(storage, env, ctx, &msg)
        .map_err(|err| ContractError::RouteFailed {
            id: msg.id.clone(),
            module: msg.recipient.chain.module.clone(),
            reason: err.to_string(),
        })
}
