//! Atomic-unit conversion for settlement.
//!
//! Net balances are exact decimals, but matching runs on whole atomic units
//! (cents by default). A balance that rounds to zero units is settled, which is
//! what replaces a floating-point epsilon.

use crate::model::Money;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use std::str::FromStr;
use thiserror::Error;

/// Rounding mode used when a balance is not a whole number of atomic units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RoundingMode {
    /// Round half away from zero (0.005 -> 0.01, -0.005 -> -0.01).
    #[default]
    HalfUp,
    /// Round half to nearest even (banker's rounding).
    HalfEven,
}

impl RoundingMode {
    fn strategy(self) -> RoundingStrategy {
        match self {
            RoundingMode::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            RoundingMode::HalfEven => RoundingStrategy::MidpointNearestEven,
        }
    }
}

impl FromStr for RoundingMode {
    type Err = SettlementError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "half-up" | "half_up" | "halfup" => Ok(RoundingMode::HalfUp),
            "half-even" | "half_even" | "halfeven" | "bankers" => Ok(RoundingMode::HalfEven),
            _ => Err(SettlementError::UnknownRoundingMode(value.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    #[error("Scale {scale} is not supported (max {max_supported})")]
    UnsupportedScale { scale: u32, max_supported: u32 },
    #[error("Amount {0} does not fit in atomic units")]
    AmountOutOfRange(Money),
    #[error("Unknown rounding mode '{0}' (expected half-up or half-even)")]
    UnknownRoundingMode(String),
}

const MAX_SETTLEMENT_SCALE: u32 = 18;

/// How amounts are quantized before matching.
///
/// # Example
/// ```
/// use rateio_domain::{Money, RoundingMode, SettlementContext};
///
/// let ctx = SettlementContext::cents();
/// assert_eq!(ctx.to_atomic_units(Money::new(12345, 3)), Ok(1235));
///
/// let bankers = SettlementContext { rounding_mode: RoundingMode::HalfEven, ..ctx };
/// assert_eq!(bankers.to_atomic_units(Money::new(12345, 3)), Ok(1234));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SettlementContext {
    /// Decimal places of the atomic unit (2 for cents, 0 for whole units).
    pub scale: u32,
    pub rounding_mode: RoundingMode,
}

impl Default for SettlementContext {
    fn default() -> Self {
        Self::cents()
    }
}

impl SettlementContext {
    pub fn cents() -> Self {
        Self {
            scale: 2,
            rounding_mode: RoundingMode::HalfUp,
        }
    }

    pub fn validate(self) -> Result<Self, SettlementError> {
        if self.scale <= MAX_SETTLEMENT_SCALE {
            return Ok(self);
        }
        Err(SettlementError::UnsupportedScale {
            scale: self.scale,
            max_supported: MAX_SETTLEMENT_SCALE,
        })
    }

    /// Rounds `amount` to this context's atomic unit and returns the unit count.
    pub fn to_atomic_units(self, amount: Money) -> Result<i64, SettlementError> {
        self.validate()?;
        let factor = Decimal::from(10_i64.pow(self.scale));
        amount
            .as_decimal()
            .checked_mul(factor)
            .map(|units| units.round_dp_with_strategy(0, self.rounding_mode.strategy()))
            .and_then(|units| units.to_i64())
            .ok_or(SettlementError::AmountOutOfRange(amount))
    }

    pub fn from_atomic_units(self, units: i64) -> Result<Money, SettlementError> {
        self.validate()?;
        Ok(Money::new(units, self.scale))
    }

    /// `amount` rounded to the atomic unit, as money.
    pub fn quantize(self, amount: Money) -> Result<Money, SettlementError> {
        self.to_atomic_units(amount)
            .and_then(|units| self.from_atomic_units(units))
    }
}
