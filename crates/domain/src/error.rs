//! Domain error types.

use thiserror::Error;

/// Errors produced by [`Money`](crate::Money) arithmetic and validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// The two operands are denominated in different currencies.
    #[error("Currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: String, right: String },

    /// The amount breaks the nanos range or sign rule, or overflowed.
    #[error("Invalid money value: {0}")]
    InvalidValue(String),
}
