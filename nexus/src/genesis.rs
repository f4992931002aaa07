//! Genesis import and export

use std::collections::HashSet;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Coin, Storage};

use nexus_common::{Chain, CrossChainTransfer, FeeInfo, GeneralMessage, MessageStatus};

use crate::address::get_linked_addresses;
use crate::chain::{get_chain_states, get_chains, set_chain_state};
use crate::error::ContractError;
use crate::fee_manager::{add_transfer_fee, get_fee_infos, get_transfer_fees};
use crate::general_message::get_messages;
use crate::message_id::{current_message_nonce, set_message_nonce};
use crate::rate_limit::{get_rate_limits, get_transfer_epochs, set_transfer_epoch};
use crate::state::{
    ChainState, Config, LinkedAddresses, Params, RateLimit, TransferEpoch, CHAINS,
    CHAIN_BY_NATIVE_ASSET, CONFIG, FEE_INFOS, LATEST_DEPOSIT_ADDRESSES, LINKED_ADDRESSES, MESSAGES,
    PARAMS, PROCESSING_MESSAGES, RATE_LIMITS,
};
use crate::transfer::{get_all_transfers, get_transfer_nonce, set_transfer, set_transfer_nonce};

#[cw_serde]
pub struct GenesisState {
    pub params: Params,
    pub config: Config,
    /// Next transfer id
    pub nonce: u64,
    pub chains: Vec<Chain>,
    pub chain_states: Vec<ChainState>,
    pub linked_addresses: Vec<LinkedAddresses>,
    pub transfers: Vec<CrossChainTransfer>,
    /// Collected transfer fees
    pub fee: Vec<Coin>,
    pub fee_infos: Vec<FeeInfo>,
    pub rate_limits: Vec<RateLimit>,
    pub transfer_epochs: Vec<TransferEpoch>,
    pub messages: Vec<GeneralMessage>,
    pub message_nonce: u64,
}

impl GenesisState {
    /// Empty state with default params
    pub fn new(config: Config) -> Self {
        Self {
            params: Params::default(),
            config,
            nonce: 0,
            chains: vec![],
            chain_states: vec![],
            linked_addresses: vec![],
            transfers: vec![],
            fee: vec![],
            fee_infos: vec![],
            rate_limits: vec![],
            transfer_epochs: vec![],
            messages: vec![],
            message_nonce: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ContractError> {
        self.params.validate()?;
        self.config.home_chain.validate()?;

        let mut chains = HashSet::new();
        for chain in &self.chains {
            chain.validate()?;
            if !chains.insert(chain.name.normalized()) {
                return invalid(format!("duplicate chain {}", chain.name));
            }
        }

        let mut states = HashSet::new();
        for state in &self.chain_states {
            if !chains.contains(&state.chain.name.normalized()) {
                return invalid(format!("chain state for unknown chain {}", state.chain.name));
            }
            if !states.insert(state.chain.name.normalized()) {
                return invalid(format!("duplicate chain state {}", state.chain.name));
            }
            for asset in &state.assets {
                asset.validate()?;
            }

            let mut maintainers = HashSet::new();
            for maintainer in &state.maintainer_states {
                if !maintainers.insert(maintainer.address.as_str()) {
                    return invalid(format!(
                        "duplicate maintainer {} of {}",
                        maintainer.address, state.chain.name
                    ));
                }
                for votes in [&maintainer.missing_votes, &maintainer.incorrect_votes] {
                    if let Err(reason) = votes.validate() {
                        return invalid(format!(
                            "votes of maintainer {} of {}: {}",
                            maintainer.address, state.chain.name, reason
                        ));
                    }
                }
            }
        }

        let mut native_assets = HashSet::new();
        for asset in self.chain_states.iter().flat_map(|s| &s.assets) {
            if asset.is_native_asset && !native_assets.insert(asset.denom.as_str()) {
                return invalid(format!("{} is native to more than one chain", asset.denom));
            }
        }

        let mut deposits = HashSet::new();
        for linked in &self.linked_addresses {
            linked.deposit_address.validate()?;
            linked.recipient_address.validate()?;
            if !deposits.insert((
                linked.deposit_address.chain.name.normalized(),
                linked.deposit_address.address.as_str(),
            )) {
                return invalid(format!("duplicate deposit address {}", linked.deposit_address));
            }
        }

        let mut transfer_ids = HashSet::new();
        for transfer in &self.transfers {
            if !transfer_ids.insert(transfer.id.u64()) {
                return invalid(format!("duplicate transfer {}", transfer.id));
            }
            if transfer.id.u64() >= self.nonce {
                return invalid(format!("transfer {} is not below nonce {}", transfer.id, self.nonce));
            }
        }

        let mut fee_infos = HashSet::new();
        for fee_info in &self.fee_infos {
            fee_info.validate()?;
            if !chains.contains(&fee_info.chain.normalized()) {
                return invalid(format!("fee info for unknown chain {}", fee_info.chain));
            }
            if !fee_infos.insert((fee_info.chain.normalized(), fee_info.asset.as_str())) {
                return invalid(format!(
                    "duplicate fee info for {} on {}",
                    fee_info.asset, fee_info.chain
                ));
            }
        }

        let mut rate_limits = HashSet::new();
        for rate_limit in &self.rate_limits {
            if rate_limit.window == 0 {
                return invalid(format!("rate limit window of {} must be positive", rate_limit.chain));
            }
            if !rate_limits.insert((rate_limit.chain.normalized(), rate_limit.limit.denom.as_str())) {
                return invalid(format!(
                    "duplicate rate limit for {} on {}",
                    rate_limit.limit.denom, rate_limit.chain
                ));
            }
        }

        let mut epochs = HashSet::new();
        for epoch in &self.transfer_epochs {
            if !chains.contains(&epoch.chain.normalized()) {
                return invalid(format!("transfer epoch for unknown chain {}", epoch.chain));
            }
            if !epochs.insert((
                epoch.chain.normalized(),
                epoch.amount.denom.as_str(),
                epoch.direction.as_str(),
            )) {
                return invalid(format!(
                    "duplicate transfer epoch for {} on {}",
                    epoch.amount.denom, epoch.chain
                ));
            }
        }

        let mut message_ids = HashSet::new();
        for msg in &self.messages {
            msg.validate_basic()?;
            if !message_ids.insert(msg.id.as_str()) {
                return invalid(format!("duplicate message {}", msg.id));
            }
        }

        Ok(())
    }
}

fn invalid(reason: String) -> Result<(), ContractError> {
    Err(ContractError::InvalidGenesis { reason })
}

/// Write a validated genesis state into an empty store
pub fn init_genesis(storage: &mut dyn Storage, genesis: &GenesisState) -> Result<(), ContractError> {
    genesis.validate()?;

    PARAMS.save(storage, &genesis.params)?;
    CONFIG.save(storage, &genesis.config)?;
    set_transfer_nonce(storage, genesis.nonce)?;

    for chain in &genesis.chains {
        CHAINS.save(storage, &chain.name.normalized(), chain)?;
    }

    for state in &genesis.chain_states {
        for asset in state.assets.iter().filter(|a| a.is_native_asset) {
            CHAIN_BY_NATIVE_ASSET.save(storage, &asset.denom, &state.chain.name)?;
        }
        set_chain_state(storage, state)?;
    }

    for linked in &genesis.linked_addresses {
        let deposit = &linked.deposit_address;
        let recipient = &linked.recipient_address;
        LINKED_ADDRESSES.save(storage, (&deposit.chain.name.normalized(), &deposit.address), linked)?;
        LATEST_DEPOSIT_ADDRESSES.save(
            storage,
            (
                &deposit.chain.name.normalized(),
                &recipient.chain.name.normalized(),
                &recipient.address,
            ),
            deposit,
        )?;
    }

    for transfer in &genesis.transfers {
        set_transfer(storage, transfer)?;
    }

    for fee in &genesis.fee {
        add_transfer_fee(storage, fee)?;
    }

    for fee_info in &genesis.fee_infos {
        FEE_INFOS.save(storage, (&fee_info.chain.normalized(), &fee_info.asset), fee_info)?;
    }

    for rate_limit in &genesis.rate_limits {
        RATE_LIMITS.save(
            storage,
            (&rate_limit.chain.normalized(), &rate_limit.limit.denom),
            rate_limit,
        )?;
    }

    for epoch in &genesis.transfer_epochs {
        set_transfer_epoch(storage, epoch)?;
    }

    for msg in &genesis.messages {
        MESSAGES.save(storage, &msg.id, msg)?;
        if msg.is(MessageStatus::Processing) {
            PROCESSING_MESSAGES.save(storage, (&msg.destination_chain().normalized(), &msg.id), &true)?;
        }
    }
    set_message_nonce(storage, genesis.message_nonce)?;

    Ok(())
}

pub fn export_genesis(storage: &dyn Storage) -> Result<GenesisState, ContractError> {
    Ok(GenesisState {
        params: PARAMS.load(storage)?,
        config: CONFIG.load(storage)?,
        nonce: get_transfer_nonce(storage)?,
        chains: get_chains(storage)?,
        chain_states: get_chain_states(storage)?,
        linked_addresses: get_linked_addresses(storage)?,
        transfers: get_all_transfers(storage)?,
        fee: get_transfer_fees(storage)?,
        fee_infos: get_fee_infos(storage)?,
        rate_limits: get_rate_limits(storage)?,
        transfer_epochs: get_transfer_epochs(storage)?,
        messages: get_messages(storage)?,
        message_nonce: current_message_nonce(storage)?,
    })
}
