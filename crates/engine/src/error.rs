//! Engine errors
//!
//! The taxonomy callers see. Validation and business-rule failures are
//! returned synchronously with a specific reason; `Indeterminate` and
//! `Reconciliation` are escalation conditions that are also logged with full
//! context at the point they arise and must never trigger an automatic
//! retry.

use cexbank_persistence::PersistenceError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors from engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("user {0} is not active; KYC required")]
    NotActive(i64),

    #[error("recipient account is not active; transfer aborted")]
    RecipientNotActive,

    #[error("user {0} is already active")]
    AlreadyActive(i64),

    #[error("insufficient funds: available {available}, required {required}")]
    InsufficientFunds {
        available: Decimal,
        required: Decimal,
    },

    #[error("address {0} is not in the withdrawal whitelist")]
    NotWhitelisted(String),

    #[error("address {0} is frozen")]
    AddressFrozen(String),

    #[error("{kind} already exists: {value}")]
    DuplicateResource { kind: String, value: String },

    #[error("bank card {card_id} does not belong to the initiator")]
    CardNotOwned { card_id: i64 },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("external transfer rejected: {reason}")]
    ExternalTransferRejected { reason: String, tx_id: i64 },

    #[error(
        "external transfer outcome unknown (ledger row {tx_id}, correlation {correlation_id}); \
         manual reconciliation required, do not retry"
    )]
    ExternalTransferIndeterminate { tx_id: i64, correlation_id: String },

    #[error(
        "reconciliation failure: on-chain transfer {tx_hash} succeeded but the internal \
         debit could not be recorded (correlation {correlation_id}): {detail}"
    )]
    Reconciliation {
        tx_hash: String,
        correlation_id: String,
        detail: String,
    },

    #[error("settlement task aborted: {0}")]
    Settlement(String),

    #[error("persistence error: {0}")]
    Persistence(#[source] PersistenceError),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn duplicate(kind: &str, value: impl ToString) -> Self {
        Self::DuplicateResource {
            kind: kind.to_string(),
            value: value.to_string(),
        }
    }
}

impl From<cexbank_core::CoreError> for EngineError {
    fn from(err: cexbank_core::CoreError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<PersistenceError> for EngineError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::NotFound { entity, id } => Self::NotFound { entity, id },
            // Fallback for races the pre-checks did not catch; pre-checks
            // report the precise resource kind.
            PersistenceError::UniqueViolation(msg) => Self::DuplicateResource {
                kind: "resource".to_string(),
                value: msg,
            },
            other => Self::Persistence(other),
        }
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        Self::Persistence(PersistenceError::from_sqlx(err))
    }
}
