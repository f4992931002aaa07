//! End-of-block processing
//!
//! 1. Maintainers of activated chains that missed or botched too many votes
//!    in the check window, or lost their proxy, are deregistered.
//! 2. Up to `end_blocker_limit` queued messages are routed. A message that
//!    fails to route is marked `Failed` and can be queued again; routing
//!    failures never fail the block.

use cosmwasm_std::{Env, Event, Response, Storage, Uint128};
use tracing::{info, warn};

use crate::address::AddressValidators;
use crate::chain::{get_chain_maintainer_states, get_chains, is_chain_activated, remove_chain_maintainer};
use crate::cache::StorageCache;
use crate::error::ContractError;
use crate::general_message::{dequeue_route_message, set_message_failed, set_message_processing};
use crate::keepers::ProxyKeeper;
use crate::router::{MessageRouter, RoutingContext};
use crate::state::{CONFIG, PARAMS};

pub fn end_blocker(
    storage: &mut dyn Storage,
    env: &Env,
    proxy: &dyn ProxyKeeper,
    validators: &AddressValidators,
    router: &MessageRouter,
) -> Result<Response, ContractError> {
    let response = check_chain_maintainers(storage, proxy)?;
    let routed = route_queued_messages(storage, env, validators, router)?;

    Ok(response.add_attribute("routed_messages", routed.to_string()))
}

fn check_chain_maintainers(
    storage: &mut dyn Storage,
    proxy: &dyn ProxyKeeper,
) -> Result<Response, ContractError> {
    let params = PARAMS.load(storage)?;
    let check_window = params.chain_maintainer_check_window;
    let window = Uint128::from(check_window);
    let mut response = Response::new().add_attribute("method", "end_block");

    for chain in get_chains(storage)? {
        if !is_chain_activated(storage, &chain)? {
            continue;
        }

        for maintainer in get_chain_maintainer_states(storage, &chain)? {
            let missing = Uint128::from(maintainer.count_missing_votes(check_window));
            let incorrect = Uint128::from(maintainer.count_incorrect_votes(check_window));
            let has_proxy = proxy.has_active_proxy(storage, &maintainer.address);

            if has_proxy
                && !params
                    .chain_maintainer_missing_vote_threshold
                    .is_exceeded_by(missing, window)
                && !params
                    .chain_maintainer_incorrect_vote_threshold
                    .is_exceeded_by(incorrect, window)
            {
                continue;
            }

            remove_chain_maintainer(storage, &chain, &maintainer.address)?;

            info!(
                chain = %chain.name,
                validator = %maintainer.address,
                missing_votes = %missing,
                incorrect_votes = %incorrect,
                has_proxy,
                "deregistered chain maintainer"
            );
            response = response.add_event(
                Event::new("chain_maintainer")
                    .add_attribute("action", "deregister")
                    .add_attribute("chain", chain.name.to_string())
                    .add_attribute("address", maintainer.address.to_string()),
            );
        }
    }

    Ok(response)
}

fn route_queued_messages(
    storage: &mut dyn Storage,
    env: &Env,
    validators: &AddressValidators,
    router: &MessageRouter,
) -> Result<u64, ContractError> {
    let limit = PARAMS.load(storage)?.end_blocker_limit;
    let ctx = RoutingContext {
        sender: CONFIG.load(storage)?.module_account,
        payload: None,
    };

    let mut routed = 0;
    for _ in 0..limit {
        let Some(msg) = dequeue_route_message(storage)? else {
            break;
        };

        let msg = match set_message_processing(storage, validators, &msg.id) {
            Ok(msg) => msg,
            Err(err) => {
                warn!(id = %msg.id, error = %err, "queued message failed validation");
                continue;
            }
        };

        // writes of a failed route are dropped with the cache
        let routed_writes = {
            let mut cache = StorageCache::new(&*storage);
            router
                .route(&mut cache, env, &ctx, &msg)
                .map(|()| cache.into_writes())
        };

        match routed_writes {
            Ok(writes) => {
                writes.commit(storage);
                routed += 1;
            }
            Err(err) => {
                warn!(id = %msg.id, error = %err, "failed to route queued message");
                set_message_failed(storage, &msg.id)?;
            }
        }
    }

    Ok(routed)
}
