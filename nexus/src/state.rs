//! State definitions for the nexus ledger core
//!
//! Every component owns its own storage namespaces. Chain names and other
//! case-insensitive identifiers are always keyed by their normalized form.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Coin, Uint128};
use cw_storage_plus::{Deque, Item, Map};

use nexus_common::{
    Asset, Chain, ChainName, CrossChainAddress, CrossChainTransfer, FeeInfo, GeneralMessage,
    Threshold, TransferDirection,
};

use crate::error::ContractError;

// ============================================================================
// Core Configuration
// ============================================================================

pub const CONTRACT_NAME: &str = "crates.io:nexus";
pub const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Wiring fixed at instantiation
#[cw_serde]
pub struct Config {
    /// Address allowed to govern chains, fees, rate limits and params
    pub admin: Addr,
    /// Account the core acts as when moving, minting and burning coins
    pub module_account: Addr,
    /// The in-protocol chain whose assets are held natively
    pub home_chain: ChainName,
    /// Bech32 prefix of local accounts, used to derive escrow accounts
    pub address_prefix: String,
}

/// Governance-tunable parameters
#[cw_serde]
pub struct Params {
    /// Share of total bonded power chain maintainers need to activate a chain
    pub chain_activation_threshold: Threshold,
    /// Missing votes ratio above which a maintainer gets removed
    pub chain_maintainer_missing_vote_threshold: Threshold,
    /// Incorrect votes ratio above which a maintainer gets removed
    pub chain_maintainer_incorrect_vote_threshold: Threshold,
    /// Number of recent votes the maintainer checks look at
    pub chain_maintainer_check_window: u32,
    /// Contract receiving messages routed to VM-connected chains
    pub gateway: Option<Addr>,
    /// Contract allowed to submit messages from VM-connected chains
    pub connection_router: Option<Addr>,
    /// Max queued messages routed per block
    pub end_blocker_limit: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            chain_activation_threshold: Threshold::new(55, 100),
            chain_maintainer_missing_vote_threshold: Threshold::new(20, 100),
            chain_maintainer_incorrect_vote_threshold: Threshold::new(15, 100),
            chain_maintainer_check_window: 500,
            gateway: None,
            connection_router: None,
            end_blocker_limit: 50,
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<(), ContractError> {
        for (name, threshold) in [
            ("chain_activation_threshold", &self.chain_activation_threshold),
            (
                "chain_maintainer_missing_vote_threshold",
                &self.chain_maintainer_missing_vote_threshold,
            ),
            (
                "chain_maintainer_incorrect_vote_threshold",
                &self.chain_maintainer_incorrect_vote_threshold,
            ),
        ] {
            threshold
                .validate()
                .map_err(|e| ContractError::InvalidParams {
                    reason: format!("{}: {}", name, e),
                })?;
        }

        if self.chain_maintainer_check_window == 0
            || self.chain_maintainer_check_window > MAX_VOTE_WINDOW
        {
            return Err(ContractError::InvalidParams {
                reason: format!(
                    "chain_maintainer_check_window must be in [1, {}]",
                    MAX_VOTE_WINDOW
                ),
            });
        }
        if self.end_blocker_limit == 0 {
            return Err(ContractError::InvalidParams {
                reason: "end_blocker_limit must be positive".to_string(),
            });
        }
        Ok(())
    }
}

pub const CONFIG: Item<Config> = Item::new("config");
pub const PARAMS: Item<Params> = Item::new("params");

// ============================================================================
// Chain Registry
// ============================================================================

/// Capacity of a [`VoteBitmap`], and so the largest usable check window
pub const MAX_VOTE_WINDOW: u32 = 1 << 15;

const WORD_BITS: u32 = u64::BITS;

/// Ring of the most recent `MAX_VOTE_WINDOW` vote outcomes, packed into
/// 64-bit words that are allocated as the ring fills up
#[cw_serde]
#[derive(Default)]
pub struct VoteBitmap {
    pub words: Vec<u64>,
    /// Outcomes recorded so far, capped at `MAX_VOTE_WINDOW`
    pub len: u32,
    /// Slot of the next outcome
    pub next: u32,
}

impl VoteBitmap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: bool) {
        let word = (self.next / WORD_BITS) as usize;
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }

        let mask = 1u64 << (self.next % WORD_BITS);
        if value {
            self.words[word] |= mask;
        } else {
            self.words[word] &= !mask;
        }

        self.next = (self.next + 1) % MAX_VOTE_WINDOW;
        self.len = (self.len + 1).min(MAX_VOTE_WINDOW);
    }

    /// Number of `true` outcomes among the latest `window` ones
    pub fn count_true(&self, window: u32) -> u32 {
        let window = window.min(self.len);
        (1..=window)
            .map(|back| (self.next + MAX_VOTE_WINDOW - back) % MAX_VOTE_WINDOW)
            .filter(|&slot| self.get(slot))
            .count() as u32
    }

    fn get(&self, slot: u32) -> bool {
        self.words
            .get((slot / WORD_BITS) as usize)
            .map_or(false, |word| word & (1u64 << (slot % WORD_BITS)) != 0)
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Rejects rings whose cursor, length and words disagree
    pub fn validate(&self) -> Result<(), String> {
        if self.len > MAX_VOTE_WINDOW || self.next >= MAX_VOTE_WINDOW {
            return Err(format!(
                "length {} and next slot {} must fit a ring of {}",
                self.len, self.next, MAX_VOTE_WINDOW
            ));
        }
        if self.len < MAX_VOTE_WINDOW && self.next != self.len {
            return Err(format!(
                "next slot {} of a ring that has not wrapped must equal its length {}",
                self.next, self.len
            ));
        }
        if self.words.len() > ((self.len + WORD_BITS - 1) / WORD_BITS) as usize {
            return Err(format!(
                "{} words cannot hold only {} outcomes",
                self.words.len(),
                self.len
            ));
        }
        Ok(())
    }
}

/// Vote history of one chain maintainer
#[cw_serde]
pub struct MaintainerState {
    pub address: Addr,
    pub missing_votes: VoteBitmap,
    pub incorrect_votes: VoteBitmap,
}

impl MaintainerState {
    pub fn new(address: Addr) -> Self {
        Self {
            address,
            missing_votes: VoteBitmap::new(),
            incorrect_votes: VoteBitmap::new(),
        }
    }

    pub fn count_missing_votes(&self, window: u32) -> u32 {
        self.missing_votes.count_true(window)
    }

    pub fn count_incorrect_votes(&self, window: u32) -> u32 {
        self.incorrect_votes.count_true(window)
    }
}

/// Mutable per-chain record
#[cw_serde]
pub struct ChainState {
    pub chain: Chain,
    pub activated: bool,
    pub maintainer_states: Vec<MaintainerState>,
    pub assets: Vec<Asset>,
}

impl ChainState {
    pub fn new(chain: Chain) -> Self {
        Self {
            chain,
            activated: false,
            maintainer_states: vec![],
            assets: vec![],
        }
    }

    pub fn has_asset(&self, denom: &str) -> bool {
        self.assets.iter().any(|a| a.denom == denom)
    }

    pub fn has_maintainer(&self, address: &Addr) -> bool {
        self.maintainer_states.iter().any(|m| &m.address == address)
    }

    pub fn maintainers(&self) -> Vec<Addr> {
        self.maintainer_states
            .iter()
            .map(|m| m.address.clone())
            .collect()
    }
}

/// Chains (normalized name -> chain)
pub const CHAINS: Map<&str, Chain> = Map::new("chains");

/// Chain states (normalized name -> state)
pub const CHAIN_STATES: Map<&str, ChainState> = Map::new("chain_states");

/// Native asset denom -> chain it is native to
pub const CHAIN_BY_NATIVE_ASSET: Map<&str, ChainName> = Map::new("chain_by_native_asset");

// ============================================================================
// Address Linking
// ============================================================================

#[cw_serde]
pub struct LinkedAddresses {
    pub deposit_address: CrossChainAddress,
    pub recipient_address: CrossChainAddress,
}

/// (deposit chain, deposit address) -> link
pub const LINKED_ADDRESSES: Map<(&str, &str), LinkedAddresses> = Map::new("linked_addresses");

/// (deposit chain, recipient chain, recipient address) -> latest deposit address
pub const LATEST_DEPOSIT_ADDRESSES: Map<(&str, &str, &str), CrossChainAddress> =
    Map::new("latest_deposit_addresses");

// ============================================================================
// Transfers & Fees
// ============================================================================

/// Last allocated transfer id + 1
pub const TRANSFER_NONCE: Item<u64> = Item::new("transfer_nonce");

/// (state, recipient chain, id) -> transfer
pub const TRANSFERS: Map<(&str, &str, u64), CrossChainTransfer> = Map::new("transfers");

/// Collected transfer fees (denom -> amount)
pub const TRANSFER_FEES: Map<&str, Uint128> = Map::new("transfer_fees");

/// (chain, asset) -> fee info
pub const FEE_INFOS: Map<(&str, &str), FeeInfo> = Map::new("fee_infos");

// ============================================================================
// Rate Limits
// ============================================================================

#[cw_serde]
pub struct RateLimit {
    pub chain: ChainName,
    pub limit: Coin,
    /// Window length in nanoseconds
    pub window: u64,
}

/// Volume transferred in one direction during one window
#[cw_serde]
pub struct TransferEpoch {
    pub chain: ChainName,
    pub amount: Coin,
    pub epoch: u64,
    pub direction: TransferDirection,
}

/// (chain, denom) -> rate limit
pub const RATE_LIMITS: Map<(&str, &str), RateLimit> = Map::new("rate_limits");

/// (chain, denom, direction) -> current epoch usage
pub const TRANSFER_EPOCHS: Map<(&str, &str, &str), TransferEpoch> = Map::new("transfer_epochs");

// ============================================================================
// General Messages
// ============================================================================

/// Next message counter value
pub const MESSAGE_NONCE: Item<u64> = Item::new("message_nonce");

/// Message id -> message
pub const MESSAGES: Map<&str, GeneralMessage> = Map::new("general_messages");

/// (destination chain, message id) of messages currently processing
pub const PROCESSING_MESSAGES: Map<(&str, &str), bool> = Map::new("processing_messages");

/// Ids of messages waiting to be routed by the end blocker
pub const ROUTE_MESSAGE_QUEUE: Deque<String> = Deque::new("route_message_queue");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_bitmap_counts_latest_window() {
        let mut bitmap = VoteBitmap::new();

        bitmap.add(true);
        bitmap.add(false);
        bitmap.add(true);
        assert_eq!(bitmap.len(), 3);
        assert_eq!(bitmap.count_true(3), 2);
        assert_eq!(bitmap.count_true(500), 2);
        assert_eq!(bitmap.count_true(2), 1);
        assert_eq!(bitmap.count_true(1), 1);
        assert_eq!(bitmap.count_true(0), 0);

        for _ in 0..10 {
            bitmap.add(false);
        }
        assert_eq!(bitmap.count_true(10), 0);
        assert_eq!(bitmap.count_true(13), 2);
        assert!(bitmap.validate().is_ok());
    }

    #[test]
    fn test_vote_bitmap_overwrites_oldest_when_full() {
        let mut bitmap = VoteBitmap::new();

        bitmap.add(true);
        for _ in 1..MAX_VOTE_WINDOW {
            bitmap.add(false);
        }
        assert_eq!(bitmap.len(), MAX_VOTE_WINDOW);
        assert_eq!(bitmap.next, 0);
        assert_eq!(bitmap.count_true(MAX_VOTE_WINDOW), 1);

        // overwrites the oldest (true)
        bitmap.add(false);
        assert_eq!(bitmap.len(), MAX_VOTE_WINDOW);
        assert_eq!(bitmap.count_true(MAX_VOTE_WINDOW), 0);
        assert!(bitmap.validate().is_ok());
    }

    #[test]
    fn test_vote_bitmap_validate() {
        assert!(VoteBitmap::new().validate().is_ok());

        let cursor_ahead = VoteBitmap {
            words: vec![0],
            len: 2,
            next: 5,
        };
        assert!(cursor_ahead.validate().is_err());

        let too_many_words = VoteBitmap {
            words: vec![0, 0],
            len: 3,
            next: 3,
        };
        assert!(too_many_words.validate().is_err());

        let out_of_ring = VoteBitmap {
            words: vec![],
            len: 0,
            next: MAX_VOTE_WINDOW,
        };
        assert!(out_of_ring.validate().is_err());
    }

    #[test]
    fn test_default_params_are_valid() {
        assert!(Params::default().validate().is_ok());

        let params = Params {
            chain_maintainer_check_window: 0,
            ..Params::default()
        };
        assert!(params.validate().is_err());

        let params = Params {
            chain_maintainer_check_window: MAX_VOTE_WINDOW + 1,
            ..Params::default()
        };
        assert!(params.validate().is_err());
    }
}
