//! Nexus Common - Shared Cross-Chain Types
//!
//! Type definitions shared by the nexus ledger core and the modules that
//! plug into it (chain modules, address validators, message routes).

pub mod chain;
pub mod message;
pub mod threshold;
pub mod transfer;

pub use chain::{
    validate_denom, Asset, Chain, ChainName, CrossChainAddress, KeyType, AXELARNET_MODULE,
    CHAIN_NAME_LENGTH_MAX, EVM_MODULE, WASM_MODULE,
};
pub use message::{GeneralMessage, MessageId, MessageStatus, WasmMessage};
pub use threshold::Threshold;
pub use transfer::{CrossChainTransfer, FeeInfo, TransferDirection, TransferId, TransferState};
