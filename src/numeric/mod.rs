// ============================================================================
// Numeric Module
// Checked integer arithmetic for balances, amounts and prices
// ============================================================================
//
// Amounts and prices are plain unsigned integers with no implicit decimal
// scaling. Every mutation goes through the checked helpers below so that an
// overflowing deposit or notional is rejected instead of wrapping.

mod errors;

pub use errors::{NumericError, NumericResult};

/// Quantity of an asset (custody asset or token units)
pub type Amount = u128;

/// Limit price in custody-asset units per token unit
pub type Price = u128;

/// Add `delta` to `balance`, failing on overflow.
#[inline]
pub fn checked_credit(balance: Amount, delta: Amount) -> NumericResult<Amount> {
    balance.checked_add(delta).ok_or(NumericError::Overflow)
}

/// Subtract `delta` from `balance`, failing instead of going negative.
#[inline]
pub fn checked_debit(balance: Amount, delta: Amount) -> NumericResult<Amount> {
    balance.checked_sub(delta).ok_or(NumericError::Underflow)
}

/// Custody-asset cost of buying `amount` tokens at `price`.
#[inline]
pub fn notional(amount: Amount, price: Price) -> NumericResult<Amount> {
    amount.checked_mul(price).ok_or(NumericError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_and_debit() {
        assert_eq!(checked_credit(10, 5), Ok(15));
        assert_eq!(checked_debit(10, 10), Ok(0));
        assert_eq!(checked_debit(10, 11), Err(NumericError::Underflow));
        assert_eq!(checked_credit(Amount::MAX, 1), Err(NumericError::Overflow));
    }

    #[test]
    fn test_notional() {
        assert_eq!(notional(10, 40), Ok(400));
        assert_eq!(notional(0, 40), Ok(0));
        assert_eq!(notional(Amount::MAX, 2), Err(NumericError::Overflow));
    }
}
