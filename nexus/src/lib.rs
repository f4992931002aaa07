//! Nexus - Multi-Chain Bridge Ledger Core
//!
//! The nexus keeps the authoritative state of a hub that connects many
//! chains: which chains exist and are active, who maintains them, which
//! assets they carry, where deposit addresses forward to, and which
//! transfers and general messages are in flight.
//!
//! # Transfers
//! 1. A deposit address on a source chain is linked to a recipient
//! 2. Funds arriving at the deposit address are enqueued for transfer
//!    after fees and rate limits are applied
//! 3. Pending transfers are merged per recipient and asset until the
//!    destination chain's signers archive them
//!
//! # General Messages
//! 1. Messages enter from chain modules or from the wasm connection router
//! 2. Messages in `Approved` or `Failed` are queued for routing
//! 3. The end blocker routes queued messages through the module-specific
//!    routes; failures mark the message `Failed` without halting the block
//!
//! # Collaborators
//! Bank, IBC, staking, proxy and wasm are reached through the traits in
//! [`keepers`]. Address validators and message routes are registered once
//! through sealed builders. In-memory keepers live in `testing`, behind the
//! `testing` feature.

pub mod abci;
pub mod address;
pub mod address_codec;
pub mod cache;
pub mod chain;
pub mod contract;
pub mod custody;
pub mod error;
pub mod execute;
pub mod fee_manager;
pub mod general_message;
pub mod genesis;
pub mod hash;
pub mod keepers;
pub mod message_id;
pub mod msg;
pub mod query;
pub mod rate_limit;
pub mod router;
pub mod state;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod transfer;
pub mod wasm;

pub use crate::address::{AddressValidator, AddressValidators, AddressValidatorsBuilder};
pub use crate::contract::ExecuteContext;
pub use crate::custody::{CoinType, LockableAsset};
pub use crate::error::ContractError;
pub use crate::genesis::GenesisState;
pub use crate::keepers::{BankKeeper, IbcKeeper, Keepers, ProxyKeeper, StakingKeeper, WasmKeeper};
pub use crate::router::{MessageRoute, MessageRouter, MessageRouterBuilder, RoutingContext};
pub use crate::wasm::WasmMessageRoute;
