//! Message Router
//!
//! Dispatches general messages to the route of their destination chain's
//! module. Routes are registered on a [`MessageRouterBuilder`] at wiring time
//! and sealed into a read-only [`MessageRouter`]; only the sealed router can
//! route.

use std::collections::HashMap;

use cosmwasm_std::{Addr, Binary, Env, Storage};
use tracing::debug;

use nexus_common::GeneralMessage;

use crate::error::ContractError;
use crate::hash::keccak256;

/// Who is routing, plus the payload when the router can check it against the
/// message's payload hash
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutingContext {
    pub sender: Addr,
    pub payload: Option<Binary>,
}

/// Delivers messages to the chains of one module
pub trait MessageRoute {
    fn route(
        &self,
        storage: &mut dyn Storage,
        env: &Env,
        ctx: &RoutingContext,
        msg: &GeneralMessage,
    ) -> Result<(), ContractError>;
}

impl<T: MessageRoute + ?Sized> MessageRoute for &T {
    fn route(
        &self,
        storage: &mut dyn Storage,
        env: &Env,
        ctx: &RoutingContext,
        msg: &GeneralMessage,
    ) -> Result<(), ContractError> {
        (**self).route(storage, env, ctx, msg)
    }
}

#[derive(Default)]
pub struct MessageRouterBuilder<'a> {
    routes: HashMap<String, Box<dyn MessageRoute + 'a>>,
}

impl<'a> MessageRouterBuilder<'a> {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Register the route of a chain module.
    ///
    /// # Panics
    ///
    /// On an empty module name or a module registered twice.
    pub fn add_route(mut self, module: impl Into<String>, route: impl MessageRoute + 'a) -> Self {
        let module = module.into();
        if module.is_empty() {
            panic!("module name cannot be an empty string");
        }
        if self.routes.contains_key(&module) {
            panic!("route for module {} has already been registered", module);
        }

        self.routes.insert(module, Box::new(route));
        self
    }

    pub fn seal(self) -> MessageRouter<'a> {
        MessageRouter {
            routes: self.routes,
        }
    }
}

/// Sealed route table
pub struct MessageRouter<'a> {
    routes: HashMap<String, Box<dyn MessageRoute + 'a>>,
}

impl<'a> MessageRouter<'a> {
    pub fn route(
        &self,
        storage: &mut dyn Storage,
        env: &Env,
        ctx: &RoutingContext,
        msg: &GeneralMessage,
    ) -> Result<(), ContractError> {
        if let Some(payload) = &ctx.payload {
            if keccak256(payload.as_slice()).as_slice() != msg.payload_hash.as_slice() {
                return Err(ContractError::PayloadHashMismatch);
            }
        }

        let module = &msg.recipient.chain.module;
        let route = self
            .routes
            .get(module)
            .ok_or_else(|| ContractError::NoRouteFound {
                module: module.clone(),
            })?;

        debug!(id = %msg.id, module = %module, "routing message");
        route.route(storage, env, ctx, msg)
    }

    pub fn has_route(&self, module: &str) -> bool {
        self.routes.contains_key(module)
    }
}
