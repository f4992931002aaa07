//! Message ID Generator
//!
//! Ids are the sha256 of the enclosing transaction's bytes plus a store
//! counter, so replaying the same transaction on any node yields the same ids.

use cosmwasm_std::{StdResult, Storage};

use nexus_common::MessageId;

use crate::hash::sha256;
use crate::state::MESSAGE_NONCE;

/// Derive the next message id and advance the counter
pub fn generate_message_id(storage: &mut dyn Storage, tx_bytes: &[u8]) -> StdResult<MessageId> {
    let counter = current_message_nonce(storage)?;
    MESSAGE_NONCE.save(storage, &(counter + 1))?;

    Ok(MessageId {
        tx_hash: sha256(tx_bytes),
        counter,
    })
}

/// Counter value the next id will use
pub fn current_message_nonce(storage: &dyn Storage) -> StdResult<u64> {
    Ok(MESSAGE_NONCE.may_load(storage)?.unwrap_or_default())
}

pub fn set_message_nonce(storage: &mut dyn Storage, nonce: u64) -> StdResult<()> {
    MESSAGE_NONCE.save(storage, &nonce)
}
