//! Cross-chain transfers and transfer fees.

use std::fmt;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Coin, Decimal, StdError, StdResult, Uint128};

use crate::chain::{validate_denom, ChainName, CrossChainAddress};

/// Monotonic transfer nonce
#[cw_serde]
#[derive(Copy, Eq, PartialOrd, Ord, Hash)]
pub struct TransferId(pub u64);

impl TransferId {
    pub fn u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cw_serde]
#[derive(Copy, Eq)]
pub enum TransferState {
    Pending,
    /// Amount did not cover the fee; kept around to merge with later deposits
    InsufficientAmount,
    /// Consumed, terminal
    Archived,
}

impl TransferState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferState::Pending => "pending",
            TransferState::InsufficientAmount => "insufficient_amount",
            TransferState::Archived => "archived",
        }
    }
}

/// Direction of a transfer relative to a chain, rate limits count each separately
#[cw_serde]
#[derive(Copy, Eq)]
pub enum TransferDirection {
    Incoming,
    Outgoing,
}

impl TransferDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferDirection::Incoming => "incoming",
            TransferDirection::Outgoing => "outgoing",
        }
    }
}

#[cw_serde]
pub struct CrossChainTransfer {
    pub id: TransferId,
    pub recipient: CrossChainAddress,
    pub asset: Coin,
    pub state: TransferState,
}

// ============================================================================
// Fee Info
// ============================================================================

/// Transfer fee parameters of an asset on a chain
#[cw_serde]
pub struct FeeInfo {
    pub chain: ChainName,
    pub asset: String,
    /// Proportional fee in `[0, 1]`
    pub fee_rate: Decimal,
    pub min_fee: Uint128,
    pub max_fee: Uint128,
}

impl FeeInfo {
    pub fn new(
        chain: ChainName,
        asset: impl Into<String>,
        fee_rate: Decimal,
        min_fee: Uint128,
        max_fee: Uint128,
    ) -> Self {
        Self {
            chain,
            asset: asset.into(),
            fee_rate,
            min_fee,
            max_fee,
        }
    }

    pub fn zero(chain: ChainName, asset: impl Into<String>) -> Self {
        Self::new(
            chain,
            asset,
            Decimal::zero(),
            Uint128::zero(),
            Uint128::zero(),
        )
    }

    pub fn validate(&self) -> StdResult<()> {
        self.chain.validate()?;
        validate_denom(&self.asset)?;

        if self.min_fee > self.max_fee {
            return Err(StdError::generic_err(
                "min fee should not be greater than max fee",
            ));
        }
        if self.fee_rate > Decimal::one() {
            return Err(StdError::generic_err(
                "fee rate should not be greater than one",
            ));
        }
        if !self.fee_rate.is_zero() && self.max_fee.is_zero() {
            return Err(StdError::generic_err(
                "fee rate is non zero while max fee is zero",
            ));
        }
        Ok(())
    }
}
