// ============================================================================
// Exchange Errors
// Business-rule rejections raised by the wallet, registry and order books
// ============================================================================

use crate::domain::{OrderId, Side, TokenSymbol, TraderId};
use crate::interfaces::CustodyError;
use crate::numeric::{Amount, NumericError};
use thiserror::Error;

/// Every way an exchange operation can be rejected.
///
/// All variants are synchronous and non-retryable. An operation that returns
/// one of them has not changed any wallet, registry or book state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DexError {
    #[error("caller {caller} is not the registry owner")]
    Unauthorized { caller: TraderId },

    #[error("token {0} is already registered")]
    DuplicateSymbol(TokenSymbol),

    #[error("token {0} is not registered")]
    UnknownToken(TokenSymbol),

    #[error("invalid token symbol: {0}")]
    InvalidSymbol(String),

    #[error("insufficient {symbol} balance: required {required}, available {available}")]
    InsufficientBalance {
        symbol: TokenSymbol,
        required: Amount,
        available: Amount,
    },

    #[error("insufficient eth balance: required {required}, available {available}")]
    InsufficientEthBalance { required: Amount, available: Amount },

    #[error("insufficient {symbol} token balance: required {required}, available {available}")]
    InsufficientTokenBalance {
        symbol: TokenSymbol,
        required: Amount,
        available: Amount,
    },

    #[error("insufficient {symbol} allowance: required {required}, approved {approved}")]
    InsufficientAllowance {
        symbol: TokenSymbol,
        required: Amount,
        approved: Amount,
    },

    #[error("order {order_id} does not belong to {requester}")]
    NotOwner {
        order_id: OrderId,
        requester: TraderId,
    },

    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    #[error("invalid order: {0}")]
    InvalidOrder(&'static str),

    #[error("{trader} already has {limit} open {side:?} orders on {symbol}")]
    OrderLimitExceeded {
        trader: TraderId,
        symbol: TokenSymbol,
        side: Side,
        limit: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("custody transfer failed: {0}")]
    Custody(CustodyError),

    #[error(transparent)]
    Numeric(#[from] NumericError),
}

/// Result type alias for exchange operations
pub type DexResult<T> = Result<T, DexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let link = TokenSymbol::new("LINK").unwrap();
        let err = DexError::InsufficientTokenBalance {
            symbol: link,
            required: 10,
            available: 0,
        };
        assert_eq!(
            err.to_string(),
            "insufficient LINK token balance: required 10, available 0"
        );

        let err = DexError::OrderNotFound(OrderId::from_raw(7));
        assert_eq!(err.to_string(), "order 7 not found");
    }

    #[test]
    fn test_numeric_conversion() {
        let err: DexError = NumericError::Overflow.into();
        assert_eq!(err, DexError::Numeric(NumericError::Overflow));
    }
}
