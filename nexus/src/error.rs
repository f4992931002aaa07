//! Error types for the nexus ledger core

use cosmwasm_std::{StdError, Uint128};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    // ========================================================================
    // Authorization Errors
    // ========================================================================

    #[error("Unauthorized: only admin can perform this action")]
    Unauthorized,

    #[error("Unauthorized: {address} is not a registered validator proxy")]
    NotValidatorProxy { address: String },

    #[error("connection router is not set")]
    ConnectionRouterNotSet,

    #[error("{address} is not the connection router")]
    NotConnectionRouter { address: String },

    // ========================================================================
    // Chain Registry Errors
    // ========================================================================

    #[error("{chain} is not a registered chain")]
    ChainNotFound { chain: String },

    #[error("chain {chain} is not activated")]
    ChainNotActivated { chain: String },

    #[error("native asset {asset} already set for chain {chain}")]
    AssetAlreadyNative { asset: String, chain: String },

    #[error("{asset} is not a registered asset of chain {chain}")]
    AssetNotRegistered { asset: String, chain: String },

    #[error("{validator} is already a chain maintainer of chain {chain}")]
    AlreadyMaintainer { validator: String, chain: String },

    #[error("{validator} is not a chain maintainer of chain {chain}")]
    NotMaintainer { validator: String, chain: String },

    // ========================================================================
    // Address Errors
    // ========================================================================

    #[error("unknown module for chain {chain}'s address: {module}")]
    UnknownAddressModule { chain: String, module: String },

    #[error("invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("no recipient linked to sender {sender}")]
    NoLinkedRecipient { sender: String },

    // ========================================================================
    // Custody Errors
    // ========================================================================

    #[error("unrecognized coin {denom}")]
    UnrecognizedCoin { denom: String },

    #[error("denom mismatch, expected {expected}, got {got}")]
    DenomMismatch { expected: String, got: String },

    #[error("asset {denom} is not linked to a cosmos chain")]
    AssetNotLinkedToChain { denom: String },

    #[error("path not found for chain {chain}")]
    IbcPathNotFound { chain: String },

    // ========================================================================
    // Fee & Rate Limit Errors
    // ========================================================================

    #[error("total fee rate should not be greater than one")]
    FeeRateTooHigh,

    #[error("insufficient transfer fee balance of {denom}: have {available}, need {requested}")]
    InsufficientFeeBalance {
        denom: String,
        available: Uint128,
        requested: Uint128,
    },

    #[error("transfer {amount}{denom} across chain {chain} exceeded rate limit {limit} ({direction})")]
    RateLimitExceeded {
        chain: String,
        denom: String,
        amount: Uint128,
        limit: Uint128,
        direction: String,
    },

    #[error("rate limit window must be positive")]
    InvalidRateLimitWindow,

    // ========================================================================
    // Transfer Errors
    // ========================================================================

    #[error("{chain} does not support foreign asset {denom}")]
    ForeignAssetNotSupported { chain: String, denom: String },

    #[error("transfer {id} is not pending")]
    TransferNotPending { id: u64 },

    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    // ========================================================================
    // General Message Errors
    // ========================================================================

    #[error("general message {id} not found")]
    MessageNotFound { id: String },

    #[error("general message {id} already exists")]
    MessageAlreadyExists { id: String },

    #[error("general message {id} is {status}, expected one of [{expected}]")]
    InvalidMessageStatus {
        id: String,
        status: String,
        expected: String,
    },

    #[error("payload hash does not match")]
    PayloadHashMismatch,

    #[error("no route found for module {module}")]
    NoRouteFound { module: String },

    #[error("failed to route message {id} to the {module} module: {reason}")]
    RouteFailed {
        id: String,
        module: String,
        reason: String,
    },

    #[error("asset transfer is not supported")]
    AssetTransferNotSupported,

    #[error("gateway is not set")]
    GatewayNotSet,

    // ========================================================================
    // Configuration Errors
    // ========================================================================

    #[error("invalid params: {reason}")]
    InvalidParams { reason: String },

    #[error("invalid genesis state: {reason}")]
    InvalidGenesis { reason: String },
}
