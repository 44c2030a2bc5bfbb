//! Core errors

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors from domain type construction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Amount cannot be negative: {0}")]
    NegativeAmount(Decimal),

    #[error("Amount must be positive: {0}")]
    NonPositiveAmount(Decimal),

    #[error("Invalid chain address: {0}")]
    InvalidAddress(String),
}
