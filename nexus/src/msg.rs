//! Message types for the nexus ledger core
//!
//! Instantiation carries the whole genesis state. Execute messages cover the
//! validator, governance and contract-call surfaces; queries expose every
//! component's state.

use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Binary, Coin, Uint128};

use nexus_common::{
    Asset, Chain, ChainName, CrossChainAddress, CrossChainTransfer, FeeInfo, GeneralMessage,
    TransferState,
};

use crate::genesis::GenesisState;
use crate::state::{ChainState, Config, Params};

/// Chain list selector matching every registered chain
pub const ALL_CHAINS: &str = ":all:";

// ============================================================================
// Instantiate
// ============================================================================

#[cw_serde]
pub struct InstantiateMsg {
    pub genesis: GenesisState,
}

// ============================================================================
// Execute Messages
// ============================================================================

#[cw_serde]
pub enum ExecuteMsg {
    // ========================================================================
    // Chain Maintainers (validator proxies)
    // ========================================================================
    /// Register the sender's validator as maintainer of the given chains.
    /// Unknown chains and chains of the home module are skipped.
    RegisterChainMaintainer { chains: Vec<ChainName> },

    DeregisterChainMaintainer { chains: Vec<ChainName> },

    // ========================================================================
    // Governance (admin only)
    // ========================================================================
    RegisterChain { chain: Chain },

    RegisterAsset { chain: ChainName, asset: Asset },

    /// Activate chains whose maintainers meet the activation threshold.
    /// `":all:"` selects every registered chain.
    ActivateChain { chains: Vec<ChainName> },

    /// Emergency stop for the given chains (or `":all:"`)
    DeactivateChain { chains: Vec<ChainName> },

    RegisterAssetFee { fee_info: FeeInfo },

    /// Limit the volume of `limit.denom` per window; a limit of
    /// `Uint128::MAX` removes it
    SetTransferRateLimit {
        chain: ChainName,
        limit: Coin,
        /// Window length in nanoseconds
        window: u64,
    },

    UpdateParams { params: Params },

    // ========================================================================
    // General Messages
    // ========================================================================
    /// Messages submitted by the connection router contract
    DispatchWasmMessages { messages: Vec<WasmCallMessage> },

    /// Queue an approved or failed message for routing at end of block
    RouteMessage { id: String },
}

/// Call descriptor submitted by the connection router
#[cw_serde]
pub struct WasmCallMessage {
    pub sender_chain: ChainName,
    pub sender_address: String,
    pub recipient_chain: ChainName,
    pub recipient_address: String,
    pub payload_hash: Binary,
    pub source_tx_id: Binary,
    pub source_tx_index: u64,
    /// Token sent along; locked from the connection router
    pub token: Option<Coin>,
}

// ============================================================================
// Query Messages
// ============================================================================

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(Config)]
    Config {},

    #[returns(Params)]
    Params {},

    /// Registered chains, optionally only (de)activated ones
    #[returns(ChainsResponse)]
    Chains { activated: Option<bool> },

    #[returns(ChainState)]
    ChainState { chain: ChainName },

    #[returns(ChainMaintainersResponse)]
    ChainMaintainers { chain: ChainName },

    #[returns(AssetsResponse)]
    Assets { chain: ChainName },

    #[returns(Chain)]
    ChainByNativeAsset { asset: String },

    /// Fee info of an asset on a chain; zero fees when none is registered
    #[returns(FeeInfo)]
    FeeInfo { chain: ChainName, asset: String },

    #[returns(TransferFeeResponse)]
    TransferFee {
        source_chain: ChainName,
        destination_chain: ChainName,
        amount: Coin,
    },

    #[returns(TransfersForChainResponse)]
    TransfersForChain {
        chain: ChainName,
        state: TransferState,
        start_after: Option<u64>,
        limit: Option<u32>,
    },

    #[returns(TransferRateLimitResponse)]
    TransferRateLimit { chain: ChainName, asset: String },

    #[returns(GeneralMessage)]
    Message { id: String },

    #[returns(RecipientAddressResponse)]
    RecipientAddress { deposit_address: CrossChainAddress },

    #[returns(LatestDepositAddressResponse)]
    LatestDepositAddress {
        deposit_chain: ChainName,
        recipient_address: CrossChainAddress,
    },

    /// Fees collected so far, per denom
    #[returns(TransferFeesResponse)]
    TransferFees {},
}

// ============================================================================
// Query Responses
// ============================================================================

#[cw_serde]
pub struct ChainsResponse {
    pub chains: Vec<ChainName>,
}

#[cw_serde]
pub struct ChainMaintainersResponse {
    pub maintainers: Vec<Addr>,
}

#[cw_serde]
pub struct AssetsResponse {
    pub assets: Vec<String>,
}

#[cw_serde]
pub struct TransferFeeResponse {
    pub fee: Coin,
}

#[cw_serde]
pub struct TransfersForChainResponse {
    pub transfers: Vec<CrossChainTransfer>,
}

/// Rate limit of an asset and its usage in the current window
#[cw_serde]
pub struct TransferRateLimit {
    pub limit: Uint128,
    /// Window length in nanoseconds
    pub window: u64,
    pub incoming: Uint128,
    pub outgoing: Uint128,
    /// Nanoseconds until the current window ends
    pub time_left: u64,
    pub from: u64,
    pub to: u64,
}

#[cw_serde]
pub struct TransferRateLimitResponse {
    pub transfer_rate_limit: Option<TransferRateLimit>,
}

#[cw_serde]
pub struct RecipientAddressResponse {
    pub recipient_address: Option<CrossChainAddress>,
}

#[cw_serde]
pub struct LatestDepositAddressResponse {
    pub deposit_address: Option<CrossChainAddress>,
}

#[cw_serde]
pub struct TransferFeesResponse {
    pub fees: Vec<Coin>,
}
