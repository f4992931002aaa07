//! Transfer Queue
//!
//! Pending cross-chain transfers, keyed by state and recipient chain.
//!
//! # Enqueue
//! 1. Both chains must support the asset (foreign assets, or it is theirs)
//! 2. Both chains must be activated and the sender linked to a recipient
//! 3. An `InsufficientAmount` transfer to the same recipient and denom is
//!    merged in first
//! 4. If the fee eats the whole amount the transfer is parked as
//!    `InsufficientAmount`, otherwise the fee is collected and the rest is
//!    merged into the recipient's `Pending` transfer under a fresh id
//!
//! Archived transfers are terminal.

use cosmwasm_std::{Coin, Order, StdError, StdResult, Storage};
use cw_storage_plus::Bound;
use tracing::{debug, info};

use nexus_common::{
    Chain, ChainName, CrossChainAddress, CrossChainTransfer, TransferId, TransferState,
};

use crate::address::get_recipient;
use crate::chain::{get_chain_by_native_asset, is_chain_activated, must_get_chain};
use crate::error::ContractError;
use crate::fee_manager::{add_transfer_fee, compute_transfer_fee};
use crate::state::{TRANSFERS, TRANSFER_NONCE};

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 30;

// ============================================================================
// Enqueue
// ============================================================================

/// Queue `asset` deposited at `sender` for transfer to the linked recipient
pub fn enqueue_for_transfer(
    storage: &mut dyn Storage,
    sender: &CrossChainAddress,
    asset: &Coin,
) -> Result<TransferId, ContractError> {
    if asset.amount.is_zero() {
        return Err(ContractError::InvalidAmount {
            reason: "transfer amount must be positive".to_string(),
        });
    }

    let native_chain = get_chain_by_native_asset(storage, &asset.denom)?;

    let sender_chain = must_get_chain(storage, &sender.chain.name)?;
    ensure_supports_asset(&sender_chain, native_chain.as_ref(), &asset.denom)?;
    ensure_activated(storage, &sender_chain)?;

    let recipient = get_recipient(storage, sender)?.ok_or_else(|| ContractError::NoLinkedRecipient {
        sender: sender.to_string(),
    })?;
    let recipient_chain = must_get_chain(storage, &recipient.chain.name)?;
    ensure_supports_asset(&recipient_chain, native_chain.as_ref(), &asset.denom)?;
    ensure_activated(storage, &recipient_chain)?;

    let mut amount = asset.clone();
    if let Some(insufficient) =
        find_transfer(storage, &recipient, &asset.denom, TransferState::InsufficientAmount)?
    {
        amount.amount = amount
            .amount
            .checked_add(insufficient.asset.amount)
            .map_err(StdError::from)?;
        delete_transfer(storage, &insufficient);
    }

    let fee = compute_transfer_fee(storage, &sender_chain, &recipient_chain, &amount)?;
    if fee >= amount.amount {
        let id = set_new_transfer(storage, &recipient, amount, TransferState::InsufficientAmount)?;

        debug!(id = %id, recipient = %recipient, fee = %fee, "transfer amount does not cover fee");
        return Ok(id);
    }

    amount.amount -= fee;
    add_transfer_fee(
        storage,
        &Coin {
            denom: amount.denom.clone(),
            amount: fee,
        },
    )?;

    if let Some(pending) = find_transfer(storage, &recipient, &asset.denom, TransferState::Pending)? {
        amount.amount = amount
            .amount
            .checked_add(pending.asset.amount)
            .map_err(StdError::from)?;
        delete_transfer(storage, &pending);
    }

    let id = set_new_transfer(storage, &recipient, amount.clone(), TransferState::Pending)?;

    info!(
        id = %id,
        sender = %sender,
        recipient = %recipient,
        amount = %amount,
        fee = %fee,
        "transfer enqueued"
    );
    Ok(id)
}

/// Move a pending transfer to the archive
pub fn archive_pending_transfer(
    storage: &mut dyn Storage,
    transfer: &CrossChainTransfer,
) -> Result<(), ContractError> {
    let chain_key = transfer.recipient.chain.name.normalized();
    let key = (TransferState::Pending.as_str(), chain_key.as_str(), transfer.id.u64());

    let mut pending = TRANSFERS
        .may_load(storage, key)?
        .ok_or(ContractError::TransferNotPending {
            id: transfer.id.u64(),
        })?;
    TRANSFERS.remove(storage, key);

    pending.state = TransferState::Archived;
    set_transfer(storage, &pending)?;

    info!(id = %pending.id, recipient = %pending.recipient, "transfer archived");
    Ok(())
}

// ============================================================================
// Listing
// ============================================================================

/// All transfers in `state` destined for `chain`; empty for inactive chains
pub fn get_transfers_for_chain(
    storage: &dyn Storage,
    chain: &Chain,
    state: TransferState,
) -> StdResult<Vec<CrossChainTransfer>> {
    if !is_chain_activated(storage, chain)? {
        return Ok(vec![]);
    }

    TRANSFERS
        .prefix((state.as_str(), chain.name.normalized().as_str()))
        .range(storage, None, None, Order::Ascending)
        .map(|item| item.map(|(_, transfer)| transfer))
        .collect()
}

/// Page of transfers in `state` destined for `chain`, ordered by id
pub fn get_transfers_for_chain_paginated(
    storage: &dyn Storage,
    chain: &Chain,
    state: TransferState,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Vec<CrossChainTransfer>> {
    if !is_chain_activated(storage, chain)? {
        return Ok(vec![]);
    }

    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.map(Bound::exclusive);

    TRANSFERS
        .prefix((state.as_str(), chain.name.normalized().as_str()))
        .range(storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(_, transfer)| transfer))
        .collect()
}

pub fn get_transfer(
    storage: &dyn Storage,
    chain: &ChainName,
    state: TransferState,
    id: TransferId,
) -> StdResult<Option<CrossChainTransfer>> {
    TRANSFERS.may_load(storage, (state.as_str(), chain.normalized().as_str(), id.u64()))
}

/// Every stored transfer, any state and chain
pub fn get_all_transfers(storage: &dyn Storage) -> StdResult<Vec<CrossChainTransfer>> {
    TRANSFERS
        .range(storage, None, None, Order::Ascending)
        .map(|item| item.map(|(_, transfer)| transfer))
        .collect()
}

// ============================================================================
// Nonce & Storage Helpers
// ============================================================================

/// Id the next transfer will get
pub fn get_transfer_nonce(storage: &dyn Storage) -> StdResult<u64> {
    Ok(TRANSFER_NONCE.may_load(storage)?.unwrap_or_default())
}

pub fn set_transfer_nonce(storage: &mut dyn Storage, nonce: u64) -> StdResult<()> {
    TRANSFER_NONCE.save(storage, &nonce)
}

pub(crate) fn set_transfer(storage: &mut dyn Storage, transfer: &CrossChainTransfer) -> StdResult<()> {
    TRANSFERS.save(
        storage,
        (
            transfer.state.as_str(),
            transfer.recipient.chain.name.normalized().as_str(),
            transfer.id.u64(),
        ),
        transfer,
    )
}

fn set_new_transfer(
    storage: &mut dyn Storage,
    recipient: &CrossChainAddress,
    asset: Coin,
    state: TransferState,
) -> StdResult<TransferId> {
    let nonce = get_transfer_nonce(storage)?;
    set_transfer_nonce(storage, nonce + 1)?;

    let transfer = CrossChainTransfer {
        id: TransferId(nonce),
        recipient: recipient.clone(),
        asset,
        state,
    };
    set_transfer(storage, &transfer)?;

    Ok(transfer.id)
}

fn delete_transfer(storage: &mut dyn Storage, transfer: &CrossChainTransfer) {
    TRANSFERS.remove(
        storage,
        (
            transfer.state.as_str(),
            transfer.recipient.chain.name.normalized().as_str(),
            transfer.id.u64(),
        ),
    );
}

/// Transfer in `state` to the same recipient and denom, at most one exists
fn find_transfer(
    storage: &dyn Storage,
    recipient: &CrossChainAddress,
    denom: &str,
    state: TransferState,
) -> StdResult<Option<CrossChainTransfer>> {
    for item in TRANSFERS
        .prefix((state.as_str(), recipient.chain.name.normalized().as_str()))
        .range(storage, None, None, Order::Ascending)
    {
        let (_, transfer) = item?;
        if &transfer.recipient == recipient && transfer.asset.denom == denom {
            return Ok(Some(transfer));
        }
    }
    Ok(None)
}

fn ensure_supports_asset(chain: &Chain, native_chain: Option<&Chain>, denom: &str) -> Result<(), ContractError> {
    let is_native = native_chain.map_or(false, |native| native.name == chain.name);
    if !chain.supports_foreign_assets && !is_native {
        return Err(ContractError::ForeignAssetNotSupported {
            chain: chain.name.to_string(),
            denom: denom.to_string(),
        });
    }
    Ok(())
}

fn ensure_activated(storage: &dyn Storage, chain: &Chain) -> Result<(), ContractError> {
    if !is_chain_activated(storage, chain)? {
        return Err(ContractError::ChainNotActivated {
            chain: chain.name.to_string(),
        });
    }
    Ok(())
}
