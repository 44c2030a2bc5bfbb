//! Cexbank Core - Domain types
//!
//! This crate contains the fundamental types used across Cexbank:
//! - `Amount`: Non-negative decimal wrapper for financial amounts
//! - `ChainAddress`: Syntactically validated on-chain address
//! - Status codes for users, transactions, and whitelist entries

pub mod address;
pub mod amount;
pub mod error;
pub mod status;

pub use address::ChainAddress;
pub use amount::Amount;
pub use error::CoreError;
pub use status::{TxKind, TxStatus, UserStatus, WhitelistStatus};
