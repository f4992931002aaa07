//! Interfaces of the subsystems the ledger core relies on.
//!
//! Each collaborator owns its own state but lives in the same store, so
//! every call is handed the storage of the current state transition.

use cosmwasm_std::{Addr, Binary, Coin, StdResult, Storage, Uint128};

use nexus_common::ChainName;

use crate::custody::DenomTrace;

/// Coin balances, escrow transfers and supply changes
pub trait BankKeeper {
    fn send_coins(
        &self,
        storage: &mut dyn Storage,
        from: &Addr,
        to: &Addr,
        coins: &[Coin],
    ) -> StdResult<()>;

    fn send_coins_from_account_to_module(
        &self,
        storage: &mut dyn Storage,
        from: &Addr,
        coins: &[Coin],
    ) -> StdResult<()>;

    fn send_coins_from_module_to_account(
        &self,
        storage: &mut dyn Storage,
        to: &Addr,
        coins: &[Coin],
    ) -> StdResult<()>;

    /// Mint into the module account
    fn mint_coins(&self, storage: &mut dyn Storage, coins: &[Coin]) -> StdResult<()>;

    /// Burn from the module account
    fn burn_coins(&self, storage: &mut dyn Storage, coins: &[Coin]) -> StdResult<()>;

    fn balance(&self, storage: &dyn Storage, address: &Addr, denom: &str) -> StdResult<Uint128>;
}

/// ICS20 denom traces and channel paths of IBC-connected chains
pub trait IbcKeeper {
    /// Resolve an `ibc/{hash}` denom to its trace
    fn parse_ibc_denom(&self, storage: &dyn Storage, ibc_denom: &str) -> StdResult<DenomTrace>;

    /// Transfer path (`port/channel`) registered for a chain
    fn get_ibc_path(&self, storage: &dyn Storage, chain: &ChainName) -> Option<String>;
}

/// Validator set as seen by the staking module
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatorInfo {
    pub address: Addr,
    pub consensus_power: Uint128,
    pub bonded: bool,
    pub jailed: bool,
}

pub trait StakingKeeper {
    fn validator(&self, storage: &dyn Storage, address: &Addr) -> Option<ValidatorInfo>;

    fn last_total_power(&self, storage: &dyn Storage) -> Uint128;
}

/// Mapping between validators and the proxy accounts that vote for them
pub trait ProxyKeeper {
    /// Validator a proxy account acts for
    fn get_operator(&self, storage: &dyn Storage, proxy: &Addr) -> Option<Addr>;

    fn has_active_proxy(&self, storage: &dyn Storage, operator: &Addr) -> bool;
}

/// Contract execution on the VM
pub trait WasmKeeper {
    fn execute(
        &self,
        storage: &mut dyn Storage,
        contract: &Addr,
        caller: &Addr,
        msg: &Binary,
        funds: &[Coin],
    ) -> StdResult<Binary>;
}

/// Every collaborator a state transition may need
#[derive(Clone, Copy)]
pub struct Keepers<'a> {
    pub bank: &'a dyn BankKeeper,
    pub ibc: &'a dyn IbcKeeper,
    pub staking: &'a dyn StakingKeeper,
    pub proxy: &'a dyn ProxyKeeper,
    pub wasm: &'a dyn WasmKeeper,
}
