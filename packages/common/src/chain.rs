//! Chain identity, assets and cross-chain addresses.

use std::fmt;
use std::hash::{Hash, Hasher};

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{StdError, StdResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Chain module handling EVM-compatible chains
pub const EVM_MODULE: &str = "evm";

/// Chain module handling the home chain and IBC-connected cosmos chains
pub const AXELARNET_MODULE: &str = "axelarnet";

/// Chain module handling chains connected through contracts on the VM
pub const WASM_MODULE: &str = "wasm";

/// Max length of a chain name in bytes
pub const CHAIN_NAME_LENGTH_MAX: usize = 20;

// ============================================================================
// Chain Name
// ============================================================================

/// Case-insensitive chain name.
///
/// Keeps the spelling it was created with for display, but compares, hashes
/// and keys storage by its lowercase form.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, JsonSchema)]
#[serde(transparent)]
pub struct ChainName(String);

impl ChainName {
    /// Create a validated chain name
    pub fn new(name: impl Into<String>) -> StdResult<Self> {
        let name = Self(name.into());
        name.validate()?;
        Ok(name)
    }

    /// Create a chain name without validation (tests, constants)
    pub fn unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn validate(&self) -> StdResult<()> {
        if self.0.trim().is_empty() {
            return Err(StdError::generic_err("chain name cannot be empty"));
        }
        if self.0.trim() != self.0 {
            return Err(StdError::generic_err(
                "chain name cannot have leading or trailing whitespace",
            ));
        }
        if self.0.len() > CHAIN_NAME_LENGTH_MAX {
            return Err(StdError::generic_err(format!(
                "chain name length {} is greater than {}",
                self.0.len(),
                CHAIN_NAME_LENGTH_MAX
            )));
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercase form used as storage key
    pub fn normalized(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl PartialEq for ChainName {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Hash for ChainName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl fmt::Display for ChainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Chain
// ============================================================================

/// Key scheme a chain uses to authorize outgoing commands
#[cw_serde]
#[derive(Copy, Eq)]
pub enum KeyType {
    None,
    Threshold,
    Multisig,
}

/// A chain known to the nexus
#[cw_serde]
pub struct Chain {
    pub name: ChainName,
    /// Denom of the chain's native asset, if the chain has one
    pub native_asset: Option<String>,
    /// Whether assets native to other chains may be transferred to/from it
    pub supports_foreign_assets: bool,
    pub key_type: KeyType,
    /// Name of the chain module responsible for this chain
    pub module: String,
}

impl Chain {
    pub fn validate(&self) -> StdResult<()> {
        self.name.validate()?;

        if let Some(denom) = &self.native_asset {
            validate_denom(denom)?;
        }

        if self.module.trim().is_empty() {
            return Err(StdError::generic_err("chain module cannot be empty"));
        }

        Ok(())
    }

    /// Whether the chain is handled by the given module
    pub fn is_from(&self, module: &str) -> bool {
        self.module == module
    }
}

// ============================================================================
// Asset
// ============================================================================

#[cw_serde]
pub struct Asset {
    pub denom: String,
    pub is_native_asset: bool,
}

impl Asset {
    pub fn new(denom: impl Into<String>, is_native_asset: bool) -> Self {
        Self {
            denom: denom.into(),
            is_native_asset,
        }
    }

    pub fn validate(&self) -> StdResult<()> {
        validate_denom(&self.denom)
    }
}

/// Validate a coin denomination: a letter followed by 2 to 127 characters
/// out of `[a-zA-Z0-9/:._-]`.
pub fn validate_denom(denom: &str) -> StdResult<()> {
    let mut chars = denom.chars();
    let starts_with_letter = chars.next().map_or(false, |c| c.is_ascii_alphabetic());
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || "/:._-".contains(c));

    if !starts_with_letter || !valid_rest || denom.len() < 3 || denom.len() > 128 {
        return Err(StdError::generic_err(format!("invalid denom: {}", denom)));
    }
    Ok(())
}

// ============================================================================
// Cross-Chain Address
// ============================================================================

/// An address on a specific chain
#[cw_serde]
pub struct CrossChainAddress {
    pub chain: Chain,
    pub address: String,
}

impl CrossChainAddress {
    pub fn new(chain: Chain, address: impl Into<String>) -> Self {
        Self {
            chain,
            address: address.into(),
        }
    }

    /// Stateless check, the address format itself is validated per chain module
    pub fn validate(&self) -> StdResult<()> {
        self.chain.validate()?;

        if self.address.trim().is_empty() {
            return Err(StdError::generic_err("address cannot be empty"));
        }
        Ok(())
    }
}

impl fmt::Display for CrossChainAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain.name, self.address)
    }
}
