//! 256-bit intermediates for fixed-point products.
//!
//! Stored values stay `u128`. Products against [`crate::SCALE`] are formed
//! in 256 bits, so only a final result that does not fit `u128` reports
//! [`LedgerError::Overflow`].

use ruint::aliases::U256;

use crate::{LedgerError, Result};

/// Lift a `u128` into 256 bits.
pub(crate) fn widen(value: u128) -> U256 {
    U256::from(value)
}

/// Narrow back to `u128`.
///
/// # Errors
///
/// - [`LedgerError::Overflow`] if the value does not fit
pub(crate) fn narrow(value: U256) -> Result<u128> {
    u128::try_from(value).map_err(|_| LedgerError::Overflow)
}

/// `floor(a * b / divisor)` without intermediate overflow.
///
/// # Errors
///
/// - [`LedgerError::Overflow`] if the quotient does not fit `u128` or
///   `divisor` is zero
pub fn mul_div(a: u128, b: u128, divisor: u128) -> Result<u128> {
    let quotient = (widen(a) * widen(b))
        .checked_div(widen(divisor))
        .ok_or(LedgerError::Overflow)?;
    narrow(quotient)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_beyond_u128_product() {
        // 10^24 * 10^18 overflows u128, the quotient does not.
        let a = 1_000_000_000_000_000_000_000_000u128;
        let b = 1_000_000_000_000_000_000u128;
        assert_eq!(mul_div(a, b, b).expect("mul_div"), a);
    }

    #[test]
    fn test_mul_div_truncates() {
        assert_eq!(mul_div(7, 3, 2).expect("mul_div"), 10);
    }

    #[test]
    fn test_mul_div_quotient_overflow() {
        assert!(matches!(
            mul_div(u128::MAX, 2, 1),
            Err(LedgerError::Overflow)
        ));
    }

    #[test]
    fn test_mul_div_zero_divisor() {
        assert!(matches!(mul_div(1, 1, 0), Err(LedgerError::Overflow)));
    }

    #[test]
    fn test_narrow_round_trip() {
        assert_eq!(narrow(widen(u128::MAX)).expect("fits"), u128::MAX);
        assert!(narrow(widen(u128::MAX) + widen(1)).is_err());
    }
}
