//! Transfer gateway contract

use async_trait::async_trait;
use cexbank_core::{Amount, ChainAddress};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Hash of a confirmed on-chain transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(String);

impl TxHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Failures of an external transfer attempt.
///
/// `Rejected` and `Indeterminate` are distinguished by contract: a rejected
/// send definitively did not move funds; an indeterminate one may still land
/// on-chain after the timeout.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("transfer rejected by the network: {0}")]
    Rejected(String),

    #[error("transfer outcome unknown after {timeout_ms}ms")]
    Indeterminate { timeout_ms: u64 },

    #[error("amount {amount} not representable in {decimals} chain decimals")]
    Unrepresentable { amount: Decimal, decimals: u32 },
}

/// Capability for sending value out of the hot wallet.
///
/// `decimals` is fetched once when the gateway is constructed and cached for
/// the process lifetime; `send` carries its own timeout whose expiry maps to
/// [`GatewayError::Indeterminate`], never to a silent drop.
#[async_trait]
pub trait TransferGateway: Send + Sync {
    /// Per-asset precision of the chain's smallest unit
    fn decimals(&self) -> u32;

    /// Address users deposit into
    fn hot_wallet(&self) -> &ChainAddress;

    /// Send `amount` to `to`, returning the transaction hash on success.
    async fn send(&self, to: &ChainAddress, amount: Amount) -> Result<TxHash, GatewayError>;
}
