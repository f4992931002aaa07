//! Fractional thresholds over voting power and vote counts.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{StdError, StdResult, Uint128};

/// A fraction `numerator / denominator` in `[0, 1]`
#[cw_serde]
#[derive(Copy, Eq)]
pub struct Threshold {
    pub numerator: u64,
    pub denominator: u64,
}

impl Threshold {
    pub const fn new(numerator: u64, denominator: u64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    pub fn validate(&self) -> StdResult<()> {
        if self.denominator == 0 {
            return Err(StdError::generic_err("threshold denominator must be positive"));
        }
        if self.numerator > self.denominator {
            return Err(StdError::generic_err(
                "threshold numerator must not exceed denominator",
            ));
        }
        Ok(())
    }

    /// `value / total >= threshold`
    pub fn is_met_by(&self, value: Uint128, total: Uint128) -> bool {
        value.full_mul(self.denominator) >= total.full_mul(self.numerator)
    }

    /// `value / total > threshold`
    pub fn is_exceeded_by(&self, value: Uint128, total: Uint128) -> bool {
        value.full_mul(self.denominator) > total.full_mul(self.numerator)
    }
}
