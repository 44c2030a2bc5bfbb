//! Decimal-to-base-unit conversion
//!
//! The chain counts in integer base units (10^-decimals of the asset).
//! Conversion must be exact: a remainder below the smallest unit means the
//! request asks for precision the chain cannot carry, and is rejected before
//! anything is sent.

use cexbank_core::Amount;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::gateway::GatewayError;

/// Convert `amount` to the chain's smallest unit.
pub fn to_base_units(amount: Amount, decimals: u32) -> Result<u128, GatewayError> {
    let value = amount.value();
    let unrepresentable = || GatewayError::Unrepresentable {
        amount: value,
        decimals,
    };

    // 10^29 already exceeds Decimal's mantissa; no real chain goes past 18.
    if decimals > 28 {
        return Err(unrepresentable());
    }

    let factor = Decimal::from_i128_with_scale(10i128.pow(decimals), 0);
    let scaled = value.checked_mul(factor).ok_or_else(unrepresentable)?;

    if !scaled.fract().is_zero() {
        return Err(unrepresentable());
    }

    scaled.to_u128().ok_or_else(unrepresentable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn amount(d: Decimal) -> Amount {
        Amount::new(d).unwrap()
    }

    #[test]
    fn test_whole_units() {
        assert_eq!(to_base_units(amount(dec!(30)), 6).unwrap(), 30_000_000);
    }

    #[test]
    fn test_fractional_units() {
        assert_eq!(to_base_units(amount(dec!(0.000001)), 6).unwrap(), 1);
        assert_eq!(to_base_units(amount(dec!(1.5)), 18).unwrap(), 1_500_000_000_000_000_000);
    }

    #[test]
    fn test_zero() {
        assert_eq!(to_base_units(Amount::ZERO, 18).unwrap(), 0);
    }

    #[test]
    fn test_sub_unit_precision_rejected() {
        let err = to_base_units(amount(dec!(0.0000001)), 6).unwrap_err();
        assert!(matches!(err, GatewayError::Unrepresentable { decimals: 6, .. }));
    }
}
