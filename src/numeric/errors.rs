// ============================================================================
// Numeric Errors
// Error types for checked integer arithmetic on balances and notionals
// ============================================================================

use thiserror::Error;

/// Errors that can occur during checked balance arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum NumericError {
    /// Result exceeded u128::MAX
    #[error("arithmetic overflow: result exceeded maximum value")]
    Overflow,
    /// Result would drop below zero
    #[error("arithmetic underflow: result below zero")]
    Underflow,
}

/// Result type alias for numeric operations
pub type NumericResult<T> = Result<T, NumericError>;
