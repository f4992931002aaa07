//! Execute handlers for the nexus ledger core.
//!
//! This module contains all execute message handlers, organized by category:
//! - `chain` - Maintainers, chain and asset registration, activation
//! - `config` - Fees, rate limits and params
//! - `messages` - Contract-call ingress and message routing

mod chain;
mod config;
mod messages;

pub use chain::*;
pub use config::*;
pub use messages::*;
