//! General (arbitrary payload) cross-chain messages.

use std::fmt;
use std::str::FromStr;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Coin, HexBinary, StdError, StdResult};

use crate::chain::{validate_denom, ChainName, CrossChainAddress};

/// Length of payload hashes and source transaction ids
pub const HASH_LENGTH: usize = 32;

#[cw_serde]
#[derive(Copy, Eq)]
pub enum MessageStatus {
    /// Ready to be routed
    Approved,
    /// Routing started, waiting on the destination module
    Processing,
    /// Handed to the destination chain, waiting for confirmation
    Sent,
    Executed,
    /// Routing failed, may be retried
    Failed,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Approved => "approved",
            MessageStatus::Processing => "processing",
            MessageStatus::Sent => "sent",
            MessageStatus::Executed => "executed",
            MessageStatus::Failed => "failed",
        }
    }
}

// ============================================================================
// Message ID
// ============================================================================

/// Unique message id: hash of the enclosing transaction plus a store counter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId {
    pub tx_hash: [u8; HASH_LENGTH],
    pub counter: u64,
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", hex::encode(self.tx_hash), self.counter)
    }
}

impl FromStr for MessageId {
    type Err = StdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hash, counter) = s
            .rsplit_once('-')
            .ok_or_else(|| StdError::parse_err("MessageId", "missing counter separator"))?;

        let bytes = hex::decode(hash).map_err(|e| StdError::parse_err("MessageId", e))?;
        let tx_hash: [u8; HASH_LENGTH] = bytes
            .try_into()
            .map_err(|_| StdError::parse_err("MessageId", "tx hash must be 32 bytes"))?;
        let counter = counter
            .parse::<u64>()
            .map_err(|e| StdError::parse_err("MessageId", e))?;

        Ok(Self { tx_hash, counter })
    }
}

// ============================================================================
// General Message
// ============================================================================

#[cw_serde]
pub struct GeneralMessage {
    pub id: String,
    pub sender: CrossChainAddress,
    pub recipient: CrossChainAddress,
    pub payload_hash: HexBinary,
    pub status: MessageStatus,
    /// Token carried along with the call, in nexus denom
    pub asset: Option<Coin>,
    pub source_tx_id: HexBinary,
    pub source_tx_index: u64,
}

impl GeneralMessage {
    pub fn source_chain(&self) -> &ChainName {
        &self.sender.chain.name
    }

    pub fn destination_chain(&self) -> &ChainName {
        &self.recipient.chain.name
    }

    pub fn is(&self, status: MessageStatus) -> bool {
        self.status == status
    }

    pub fn validate_basic(&self) -> StdResult<()> {
        if self.id.trim().is_empty() {
            return Err(StdError::generic_err("message id cannot be empty"));
        }

        self.sender.validate()?;
        self.recipient.validate()?;

        if self.payload_hash.len() != HASH_LENGTH {
            return Err(StdError::generic_err(format!(
                "payload hash must be {} bytes, got {}",
                HASH_LENGTH,
                self.payload_hash.len()
            )));
        }

        if let Some(asset) = &self.asset {
            validate_denom(&asset.denom)?;
        }

        Ok(())
    }
}

/// Message shape delivered to contracts on the VM
#[cw_serde]
pub struct WasmMessage {
    pub source_chain: ChainName,
    pub source_address: String,
    pub destination_chain: ChainName,
    pub destination_address: String,
    pub payload_hash: Vec<u8>,
    pub source_tx_id: Vec<u8>,
    pub source_tx_index: u64,
    pub id: String,
}

impl From<&GeneralMessage> for WasmMessage {
    fn from(msg: &GeneralMessage) -> Self {
        Self {
            source_chain: msg.source_chain().clone(),
            source_address: msg.sender.address.clone(),
            destination_chain: msg.destination_chain().clone(),
            destination_address: msg.recipient.address.clone(),
            payload_hash: msg.payload_hash.to_vec(),
            source_tx_id: msg.source_tx_id.to_vec(),
            source_tx_index: msg.source_tx_index,
            id: msg.id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_display_and_parse() {
        let id = MessageId {
            tx_hash: [0xab; HASH_LENGTH],
            counter: 7,
        };

        let rendered = id.to_string();
        assert_eq!(rendered, format!("{}-7", "ab".repeat(32)));
        assert_eq!(rendered.parse::<MessageId>().unwrap(), id);
    }

    #[test]
    fn test_message_id_parse_rejects_malformed() {
        assert!("abcd".parse::<MessageId>().is_err());
        assert!("abcd-1".parse::<MessageId>().is_err());
        assert!(format!("{}-x", "ab".repeat(32)).parse::<MessageId>().is_err());
    }
}
