//! In-memory collaborators and fixtures for tests.
//!
//! The mocks keep their balances in the same storage the core writes to,
//! under their own namespaces, so a test sees one consistent store.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use cosmwasm_std::{Addr, Binary, Coin, Env, StdError, StdResult, Storage, Uint128};
use cw_storage_plus::Map;

use nexus_common::{
    Chain, ChainName, GeneralMessage, KeyType, AXELARNET_MODULE, EVM_MODULE, WASM_MODULE,
};

use crate::custody::DenomTrace;
use crate::error::ContractError;
use crate::keepers::{
    BankKeeper, IbcKeeper, ProxyKeeper, StakingKeeper, ValidatorInfo, WasmKeeper,
};
use crate::router::{MessageRoute, RoutingContext};
use crate::state::{Config, Params, CONFIG, PARAMS};

/// A valid EVM address
pub const EVM_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

/// A valid bech32 account address
pub const TERRA_ADDRESS: &str = "terra1x46rqay4d3cssq8gxxvqz8xt6nwlz4td20k38v";

pub const HOME_CHAIN: &str = "Axelarnet";
pub const MODULE_ACCOUNT: &str = "axelar1nexusmodule";
pub const ADMIN: &str = "axelar1admin";

// ============================================================================
// Fixtures
// ============================================================================

pub fn chain(name: &str, native_asset: Option<&str>, supports_foreign_assets: bool, module: &str) -> Chain {
    Chain {
        name: ChainName::unchecked(name),
        native_asset: native_asset.map(str::to_string),
        supports_foreign_assets,
        key_type: KeyType::Multisig,
        module: module.to_string(),
    }
}

pub fn evm_chain(name: &str) -> Chain {
    chain(name, None, true, EVM_MODULE)
}

pub fn axelarnet_chain() -> Chain {
    Chain {
        key_type: KeyType::None,
        ..chain(HOME_CHAIN, Some("uaxl"), true, AXELARNET_MODULE)
    }
}

pub fn wasm_chain(name: &str) -> Chain {
    Chain {
        key_type: KeyType::None,
        ..chain(name, None, false, WASM_MODULE)
    }
}

pub fn mock_config() -> Config {
    Config {
        admin: Addr::unchecked(ADMIN),
        module_account: Addr::unchecked(MODULE_ACCOUNT),
        home_chain: ChainName::unchecked(HOME_CHAIN),
        address_prefix: "axelar".to_string(),
    }
}

/// Store the default config and params
pub fn setup_config(storage: &mut dyn Storage) -> StdResult<()> {
    CONFIG.save(storage, &mock_config())?;
    PARAMS.save(storage, &Params::default())
}

pub fn env_at_nanos(env: Env, nanos: u64) -> Env {
    let mut env = env;
    env.block.time = cosmwasm_std::Timestamp::from_nanos(nanos);
    env
}

// ============================================================================
// Bank
// ============================================================================

const BALANCES: Map<(&str, &str), Uint128> = Map::new("mock_bank_balances");
const SUPPLY: Map<&str, Uint128> = Map::new("mock_bank_supply");

/// Bank keeping balances in the shared store
pub struct MockBank {
    pub module_account: Addr,
}

impl Default for MockBank {
    fn default() -> Self {
        Self {
            module_account: Addr::unchecked(MODULE_ACCOUNT),
        }
    }
}

impl MockBank {
    /// Credit an account out of thin air, counting it as supply
    pub fn fund(&self, storage: &mut dyn Storage, address: &Addr, coin: &Coin) -> StdResult<()> {
        self.credit(storage, address, coin)?;
        SUPPLY.update(storage, &coin.denom, |s| -> StdResult<_> {
            Ok(s.unwrap_or_default() + coin.amount)
        })?;
        Ok(())
    }

    pub fn supply(&self, storage: &dyn Storage, denom: &str) -> Uint128 {
        SUPPLY.may_load(storage, denom).ok().flatten().unwrap_or_default()
    }

    fn credit(&self, storage: &mut dyn Storage, address: &Addr, coin: &Coin) -> StdResult<()> {
        BALANCES.update(storage, (address.as_str(), &coin.denom), |b| -> StdResult<_> {
            Ok(b.unwrap_or_default().checked_add(coin.amount)?)
        })?;
        Ok(())
    }

    fn debit(&self, storage: &mut dyn Storage, address: &Addr, coin: &Coin) -> StdResult<()> {
        let balance = self.balance(storage, address, &coin.denom)?;
        let remaining = balance.checked_sub(coin.amount).map_err(|_| {
            StdError::generic_err(format!(
                "insufficient funds: {} has {}{}, needs {}",
                address, balance, coin.denom, coin
            ))
        })?;
        BALANCES.save(storage, (address.as_str(), &coin.denom), &remaining)
    }
}

impl BankKeeper for MockBank {
    fn send_coins(&self, storage: &mut dyn Storage, from: &Addr, to: &Addr, coins: &[Coin]) -> StdResult<()> {
        for coin in coins {
            self.debit(storage, from, coin)?;
            self.credit(storage, to, coin)?;
        }
        Ok(())
    }

    fn send_coins_from_account_to_module(&self, storage: &mut dyn Storage, from: &Addr, coins: &[Coin]) -> StdResult<()> {
        let module = self.module_account.clone();
        self.send_coins(storage, from, &module, coins)
    }

    fn send_coins_from_module_to_account(&self, storage: &mut dyn Storage, to: &Addr, coins: &[Coin]) -> StdResult<()> {
        let module = self.module_account.clone();
        self.send_coins(storage, &module, to, coins)
    }

    fn mint_coins(&self, storage: &mut dyn Storage, coins: &[Coin]) -> StdResult<()> {
        let module = self.module_account.clone();
        for coin in coins {
            self.fund(storage, &module, coin)?;
        }
        Ok(())
    }

    fn burn_coins(&self, storage: &mut dyn Storage, coins: &[Coin]) -> StdResult<()> {
        let module = self.module_account.clone();
        for coin in coins {
            self.debit(storage, &module, coin)?;
            SUPPLY.update(storage, &coin.denom, |s| -> StdResult<_> {
                Ok(s.unwrap_or_default().checked_sub(coin.amount)?)
            })?;
        }
        Ok(())
    }

    fn balance(&self, storage: &dyn Storage, address: &Addr, denom: &str) -> StdResult<Uint128> {
        Ok(BALANCES
            .may_load(storage, (address.as_str(), denom))?
            .unwrap_or_default())
    }
}

// ============================================================================
// IBC
// ============================================================================

#[derive(Default)]
pub struct MockIbc {
    /// normalized chain name -> transfer path
    pub paths: HashMap<String, String>,
    /// ibc denom -> trace
    pub traces: HashMap<String, DenomTrace>,
}

impl MockIbc {
    /// Register the path of a chain and the voucher of its native asset
    pub fn with_chain(mut self, chain: &ChainName, path: &str, base_denom: &str) -> Self {
        let trace = DenomTrace {
            path: path.to_string(),
            base_denom: base_denom.to_string(),
        };
        self.paths.insert(chain.normalized(), path.to_string());
        self.traces.insert(trace.ibc_denom(), trace);
        self
    }
}

impl IbcKeeper for MockIbc {
    fn parse_ibc_denom(&self, _storage: &dyn Storage, ibc_denom: &str) -> StdResult<DenomTrace> {
        self.traces
            .get(ibc_denom)
            .cloned()
            .ok_or_else(|| StdError::not_found(format!("denom trace for {}", ibc_denom)))
    }

    fn get_ibc_path(&self, _storage: &dyn Storage, chain: &ChainName) -> Option<String> {
        self.paths.get(&chain.normalized()).cloned()
    }
}

// ============================================================================
// Staking & Proxies
// ============================================================================

#[derive(Default)]
pub struct MockStaking {
    pub validators: HashMap<Addr, ValidatorInfo>,
    pub total_power: Uint128,
}

impl MockStaking {
    pub fn with_validator(mut self, address: &str, power: u128, bonded: bool, jailed: bool) -> Self {
        let address = Addr::unchecked(address);
        self.validators.insert(
            address.clone(),
            ValidatorInfo {
                address,
                consensus_power: Uint128::new(power),
                bonded,
                jailed,
            },
        );
        self.total_power += Uint128::new(power);
        self
    }
}

impl StakingKeeper for MockStaking {
    fn validator(&self, _storage: &dyn Storage, address: &Addr) -> Option<ValidatorInfo> {
        self.validators.get(address).cloned()
    }

    fn last_total_power(&self, _storage: &dyn Storage) -> Uint128 {
        self.total_power
    }
}

#[derive(Default)]
pub struct MockProxy {
    /// proxy -> operator
    pub proxies: HashMap<Addr, Addr>,
    pub inactive: HashSet<Addr>,
}

impl MockProxy {
    pub fn with_proxy(mut self, proxy: &str, operator: &str) -> Self {
        self.proxies
            .insert(Addr::unchecked(proxy), Addr::unchecked(operator));
        self
    }

    pub fn deactivate(mut self, operator: &str) -> Self {
        self.inactive.insert(Addr::unchecked(operator));
        self
    }
}

impl ProxyKeeper for MockProxy {
    fn get_operator(&self, _storage: &dyn Storage, proxy: &Addr) -> Option<Addr> {
        self.proxies.get(proxy).cloned()
    }

    fn has_active_proxy(&self, _storage: &dyn Storage, operator: &Addr) -> bool {
        self.proxies.values().any(|o| o == operator) && !self.inactive.contains(operator)
    }
}

// ============================================================================
// VM & Routes
// ============================================================================

/// A contract execution captured by [`MockWasm`]
#[derive(Clone, Debug, PartialEq)]
pub struct Execution {
    pub contract: Addr,
    pub caller: Addr,
    pub msg: Binary,
}

#[derive(Default)]
pub struct MockWasm {
    pub executions: RefCell<Vec<Execution>>,
    pub fail: bool,
}

impl MockWasm {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn executions(&self) -> Vec<Execution> {
        self.executions.borrow().clone()
    }
}

impl WasmKeeper for MockWasm {
    fn execute(
        &self,
        _storage: &mut dyn Storage,
        contract: &Addr,
        caller: &Addr,
        msg: &Binary,
        _funds: &[Coin],
    ) -> StdResult<Binary> {
        if self.fail {
            return Err(StdError::generic_err("contract execution failed"));
        }

        self.executions.borrow_mut().push(Execution {
            contract: contract.clone(),
            caller: caller.clone(),
            msg: msg.clone(),
        });
        Ok(Binary::default())
    }
}

/// Route remembering the ids it was handed. Each attempt also leaves a mark
/// in the store before the route decides whether to fail.
#[derive(Default)]
pub struct RecordingRoute {
    routed: RefCell<Vec<String>>,
    pub fail: bool,
}

const ROUTE_MARKS: Map<&str, bool> = Map::new("recording_route_marks");

impl RecordingRoute {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn routed(&self) -> Vec<String> {
        self.routed.borrow().clone()
    }

    /// Whether an attempt to route `id` left its mark in `storage`
    pub fn marked(storage: &dyn Storage, id: &str) -> bool {
        ROUTE_MARKS.has(storage, id)
    }
}

impl MessageRoute for RecordingRoute {
    fn route(
        &self,
        storage: &mut dyn Storage,
        _env: &Env,
        _ctx: &RoutingContext,
        msg: &GeneralMessage,
    ) -> Result<(), ContractError> {
        ROUTE_MARKS.save(storage, &msg.id, &true)?;
        if self.fail {
            return Err(ContractError::Std(StdError::generic_err("route failed")));
        }

        self.routed.borrow_mut().push(msg.id.clone());
        Ok(())
    }
}
