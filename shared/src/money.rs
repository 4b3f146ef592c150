//! Money helpers using rust_decimal for precision
//!
//! Amounts travel as decimals in currency units. The wallet charge API
//! wants integer minor units (cents), which is the only place they appear.

use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half-up)
pub const DECIMAL_PLACES: u32 = 2;

/// Minor units per currency unit
const MINOR_PER_UNIT: i64 = 100;

/// Round to 2 decimal places, half away from zero
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a currency-unit amount to minor units, rounding half away from zero.
///
/// Returns `None` if the scaled value overflows or does not fit in i64.
pub fn to_minor_units(value: Decimal) -> Option<i64> {
    value
        .checked_mul(Decimal::from(MINOR_PER_UNIT))?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Minor units back to currency units
#[inline]
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, DECIMAL_PLACES)
}

/// Amount handed to the wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletAmount {
    /// Non-negative minor units
    pub minor: i64,
    /// The source amount was negative (or unrepresentable) and was clamped to 0
    pub anomaly: bool,
}

/// Resolve the wallet charge amount.
///
/// A backend-declared minor amount wins; otherwise the major amount is
/// converted. Negative results are clamped to zero and flagged.
pub fn wallet_amount(declared_minor: Option<i64>, major: Option<Decimal>) -> Option<WalletAmount> {
    let raw = match (declared_minor, major) {
        (Some(minor), _) => Some(minor),
        (None, Some(major)) => Some(to_minor_units(major).unwrap_or(-1)),
        (None, None) => None,
    }?;

    if raw < 0 {
        tracing::warn!(amount = raw, "Negative wallet amount, clamping to zero");
        return Some(WalletAmount {
            minor: 0,
            anomaly: true,
        });
    }
    Some(WalletAmount {
        minor: raw,
        anomaly: false,
    })
}
