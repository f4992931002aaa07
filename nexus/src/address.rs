//! Address Linker
//!
//! Links deposit addresses on one chain to recipient addresses on another.
//! Address formats are checked by per-module validators, registered once at
//! wiring time into a sealed [`AddressValidators`] table.

use std::collections::HashMap;

use cosmwasm_std::{StdResult, Storage};
use tracing::info;

use nexus_common::{
    Chain, CrossChainAddress, AXELARNET_MODULE, EVM_MODULE, WASM_MODULE,
};

use crate::address_codec::{validate_cosmos_address, validate_evm_address, validate_wasm_address};
use crate::chain::is_chain_activated;
use crate::error::ContractError;
use crate::state::{LinkedAddresses, LATEST_DEPOSIT_ADDRESSES, LINKED_ADDRESSES};

// ============================================================================
// Validators
// ============================================================================

/// Checks the format of addresses belonging to one chain module
pub trait AddressValidator {
    fn validate(&self, address: &CrossChainAddress) -> StdResult<()>;
}

impl<F> AddressValidator for F
where
    F: Fn(&CrossChainAddress) -> StdResult<()>,
{
    fn validate(&self, address: &CrossChainAddress) -> StdResult<()> {
        self(address)
    }
}

/// Open table of validators, turned into [`AddressValidators`] by [`seal`](Self::seal)
#[derive(Default)]
pub struct AddressValidatorsBuilder {
    validators: HashMap<String, Box<dyn AddressValidator>>,
}

impl AddressValidatorsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the validator of a chain module.
    ///
    /// # Panics
    ///
    /// On an empty module name or a module registered twice; both are wiring
    /// mistakes.
    pub fn add_validator(
        mut self,
        module: impl Into<String>,
        validator: impl AddressValidator + 'static,
    ) -> Self {
        let module = module.into();
        if module.is_empty() {
            panic!("module name cannot be an empty string");
        }
        if self.validators.contains_key(&module) {
            panic!("validator for module {} has already been registered", module);
        }

        self.validators.insert(module, Box::new(validator));
        self
    }

    pub fn seal(self) -> AddressValidators {
        AddressValidators {
            validators: self.validators,
        }
    }
}

/// Sealed, read-only validator table
pub struct AddressValidators {
    validators: HashMap<String, Box<dyn AddressValidator>>,
}

impl AddressValidators {
    /// Validators for the built-in chain modules
    pub fn with_defaults() -> Self {
        AddressValidatorsBuilder::new()
            .add_validator(EVM_MODULE, validate_evm_address)
            .add_validator(AXELARNET_MODULE, validate_cosmos_address)
            .add_validator(WASM_MODULE, validate_wasm_address)
            .seal()
    }

    /// Validate an address with the validator of its chain's module
    pub fn validate_address(&self, address: &CrossChainAddress) -> Result<(), ContractError> {
        let validator = self.validators.get(&address.chain.module).ok_or_else(|| {
            ContractError::UnknownAddressModule {
                chain: address.chain.name.to_string(),
                module: address.chain.module.clone(),
            }
        })?;

        validator
            .validate(address)
            .map_err(|e| ContractError::InvalidAddress {
                address: address.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn has_module(&self, module: &str) -> bool {
        self.validators.contains_key(module)
    }
}

// ============================================================================
// Linking
// ============================================================================

/// Link a deposit address to a recipient address, replacing any previous link
pub fn link_addresses(
    storage: &mut dyn Storage,
    validators: &AddressValidators,
    deposit: &CrossChainAddress,
    recipient: &CrossChainAddress,
) -> Result<(), ContractError> {
    validators.validate_address(deposit)?;
    validators.validate_address(recipient)?;

    ensure_activated(storage, &deposit.chain)?;
    ensure_activated(storage, &recipient.chain)?;

    let deposit_chain = deposit.chain.name.normalized();
    let recipient_chain = recipient.chain.name.normalized();

    LINKED_ADDRESSES.save(
        storage,
        (&deposit_chain, &deposit.address),
        &LinkedAddresses {
            deposit_address: deposit.clone(),
            recipient_address: recipient.clone(),
        },
    )?;
    LATEST_DEPOSIT_ADDRESSES.save(
        storage,
        (&deposit_chain, &recipient_chain, &recipient.address),
        deposit,
    )?;

    info!(deposit = %deposit, recipient = %recipient, "addresses linked");
    Ok(())
}

/// Recipient linked to a deposit address
pub fn get_recipient(
    storage: &dyn Storage,
    deposit: &CrossChainAddress,
) -> StdResult<Option<CrossChainAddress>> {
    Ok(LINKED_ADDRESSES
        .may_load(storage, (&deposit.chain.name.normalized(), &deposit.address))?
        .map(|linked| linked.recipient_address))
}

/// Deposit address most recently linked to the recipient on the given chain
pub fn get_latest_deposit_address(
    storage: &dyn Storage,
    deposit_chain: &Chain,
    recipient: &CrossChainAddress,
) -> StdResult<Option<CrossChainAddress>> {
    LATEST_DEPOSIT_ADDRESSES.may_load(
        storage,
        (
            &deposit_chain.name.normalized(),
            &recipient.chain.name.normalized(),
            &recipient.address,
        ),
    )
}

pub fn get_linked_addresses(storage: &dyn Storage) -> StdResult<Vec<LinkedAddresses>> {
    LINKED_ADDRESSES
        .range(storage, None, None, cosmwasm_std::Order::Ascending)
        .map(|item| item.map(|(_, linked)| linked))
        .collect()
}

fn ensure_activated(storage: &dyn Storage, chain: &Chain) -> Result<(), ContractError> {
    if !is_chain_activated(storage, chain)? {
        return Err(ContractError::ChainNotActivated {
            chain: chain.name.to_string(),
        });
    }
    Ok(())
}
