//! Asset Custody
//!
//! Every coin the core moves falls into one of three custody models:
//!
//! | Type     | Denom                                  | Lock                 | Unlock                |
//! |----------|----------------------------------------|----------------------|-----------------------|
//! | ICS20    | `ibc/{hash}` of a cosmos chain's asset | send to escrow       | send from escrow      |
//! | Native   | native asset of the home chain         | send to escrow       | send from escrow      |
//! | External | other asset registered on home chain   | send to module, burn | mint, send to account |
//!
//! Internally ICS20 coins are tracked by their base denom; the `ibc/{hash}`
//! form is only rebuilt when talking to the bank.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Coin, StdResult, Storage};
use tracing::debug;

use nexus_common::validate_denom;

use crate::address_codec::encode_bech32_address;
use crate::chain::{get_chain_by_native_asset, is_asset_registered, must_get_chain};
use crate::error::ContractError;
use crate::hash::sha256;
use crate::keepers::{BankKeeper, IbcKeeper};
use crate::state::{Config, CONFIG};

/// Prefix of ICS20 voucher denoms
pub const IBC_DENOM_PREFIX: &str = "ibc";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoinType {
    Ics20,
    Native,
    External,
}

/// Origin of an ICS20 voucher: the transfer path and the denom on the source
#[cw_serde]
pub struct DenomTrace {
    pub path: String,
    pub base_denom: String,
}

impl DenomTrace {
    /// `{path}/{base_denom}`, or just the base denom without a path
    pub fn full_path(&self) -> String {
        if self.path.is_empty() {
            self.base_denom.clone()
        } else {
            format!("{}/{}", self.path, self.base_denom)
        }
    }

    /// Voucher denom `ibc/{UPPERCASE_HEX(sha256(full_path))}`
    pub fn ibc_denom(&self) -> String {
        if self.path.is_empty() {
            return self.base_denom.clone();
        }
        format!(
            "{}/{}",
            IBC_DENOM_PREFIX,
            hex::encode_upper(sha256(self.full_path().as_bytes()))
        )
    }
}

/// Whether the denom has the `ibc/{64 hex chars}` shape
pub fn is_ibc_denom(denom: &str) -> bool {
    if validate_denom(denom).is_err() {
        return false;
    }

    match denom.split_once('/') {
        Some((prefix, hash)) => {
            prefix == IBC_DENOM_PREFIX && hash.len() == 64 && hex::decode(hash).is_ok()
        }
        None => false,
    }
}

/// Escrow account holding locked coins of a denom
pub fn get_escrow_address(address_prefix: &str, denom: &str) -> StdResult<Addr> {
    let hash = sha256(denom.as_bytes());
    encode_bech32_address(&hash[..20], address_prefix).map(Addr::unchecked)
}

// ============================================================================
// Lockable Asset
// ============================================================================

/// A classified coin that can be locked from or unlocked to an account
pub struct LockableAsset<'a> {
    /// Coin in the denom nexus registered
    asset: Coin,
    /// Coin in the denom the bank knows
    coin: Coin,
    coin_type: CoinType,
    bank: &'a dyn BankKeeper,
    config: Config,
}

impl<'a> std::fmt::Debug for LockableAsset<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockableAsset")
            .field("asset", &self.asset)
            .field("coin", &self.coin)
            .field("coin_type", &self.coin_type)
            .finish()
    }
}

impl<'a> LockableAsset<'a> {
    /// Classify the coin, normalizing ICS20 vouchers to their base denom.
    /// Fails if the coin is unrecognized, or if an ICS20 voucher does not
    /// round-trip through the registered channel path.
    pub fn new(
        storage: &dyn Storage,
        ibc: &dyn IbcKeeper,
        bank: &'a dyn BankKeeper,
        coin: Coin,
    ) -> Result<Self, ContractError> {
        let config = CONFIG.load(storage)?;
        let coin_type = get_coin_type(storage, &config, &coin.denom)?;

        let asset = match coin_type {
            CoinType::Ics20 => Coin {
                denom: ibc.parse_ibc_denom(storage, &coin.denom)?.base_denom,
                amount: coin.amount,
            },
            CoinType::Native | CoinType::External => coin.clone(),
        };

        let bank_coin = match coin_type {
            CoinType::Ics20 => to_ics20(storage, ibc, &asset)?,
            CoinType::Native | CoinType::External => asset.clone(),
        };
        if bank_coin.denom != coin.denom {
            return Err(ContractError::DenomMismatch {
                expected: coin.denom,
                got: bank_coin.denom,
            });
        }

        Ok(Self {
            asset,
            coin: bank_coin,
            coin_type,
            bank,
            config,
        })
    }

    pub fn coin_type(&self) -> CoinType {
        self.coin_type
    }

    /// The coin in nexus denom
    pub fn get_asset(&self) -> Coin {
        self.asset.clone()
    }

    /// The coin in bank denom (`ibc/{hash}` for ICS20)
    pub fn get_coin(&self) -> Coin {
        self.coin.clone()
    }

    pub fn lock_from(&self, storage: &mut dyn Storage, from: &Addr) -> Result<(), ContractError> {
        let coins = [self.coin.clone()];

        match self.coin_type {
            CoinType::Ics20 | CoinType::Native => {
                let escrow = get_escrow_address(&self.config.address_prefix, &self.coin.denom)?;
                self.bank.send_coins(storage, from, &escrow, &coins)?;
            }
            CoinType::External => {
                self.bank
                    .send_coins_from_account_to_module(storage, from, &coins)?;
                // the coins were just moved to the module account
                if let Err(err) = self.bank.burn_coins(storage, &coins) {
                    panic!("failed to burn {} held by the module account: {}", self.coin, err);
                }
            }
        }

        debug!(coin = %self.coin, from = %from, coin_type = ?self.coin_type, "locked coin");
        Ok(())
    }

    pub fn unlock_to(&self, storage: &mut dyn Storage, to: &Addr) -> Result<(), ContractError> {
        let coins = [self.coin.clone()];

        match self.coin_type {
            CoinType::Ics20 | CoinType::Native => {
                let escrow = get_escrow_address(&self.config.address_prefix, &self.coin.denom)?;
                self.bank.send_coins(storage, &escrow, to, &coins)?;
            }
            CoinType::External => {
                self.bank.mint_coins(storage, &coins)?;
                // the coins were just minted to the module account
                if let Err(err) = self
                    .bank
                    .send_coins_from_module_to_account(storage, to, &coins)
                {
                    panic!("failed to send minted {} to {}: {}", self.coin, to, err);
                }
            }
        }

        debug!(coin = %self.coin, to = %to, coin_type = ?self.coin_type, "unlocked coin");
        Ok(())
    }
}

fn get_coin_type(storage: &dyn Storage, config: &Config, denom: &str) -> Result<CoinType, ContractError> {
    if is_ibc_denom(denom) {
        return Ok(CoinType::Ics20);
    }

    let home_chain = must_get_chain(storage, &config.home_chain)?;
    let native_chain = get_chain_by_native_asset(storage, denom)?;
    if native_chain.map_or(false, |chain| chain.name == home_chain.name) {
        return Ok(CoinType::Native);
    }

    if is_asset_registered(storage, &home_chain, denom)? {
        return Ok(CoinType::External);
    }

    Err(ContractError::UnrecognizedCoin {
        denom: denom.to_string(),
    })
}

/// Rebuild the voucher denom from the channel path of the asset's origin chain
fn to_ics20(storage: &dyn Storage, ibc: &dyn IbcKeeper, asset: &Coin) -> Result<Coin, ContractError> {
    let chain = get_chain_by_native_asset(storage, &asset.denom)?.ok_or_else(|| {
        ContractError::AssetNotLinkedToChain {
            denom: asset.denom.clone(),
        }
    })?;

    let path = ibc
        .get_ibc_path(storage, &chain.name)
        .ok_or_else(|| ContractError::IbcPathNotFound {
            chain: chain.name.to_string(),
        })?;

    let trace = DenomTrace {
        path,
        base_denom: asset.denom.clone(),
    };

    Ok(Coin {
        denom: trace.ibc_denom(),
        amount: asset.amount,
    })
}
