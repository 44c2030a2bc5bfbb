//! Simulated gateway - in-process stand-in for the hot-wallet RPC client
//!
//! Behaves like the real thing at the contract level: decimals cached at
//! construction, a latency budget on every send, hashes that look like chain
//! hashes. Useful for demos and for wiring the CLI without a node.

use cexbank_core::{Amount, ChainAddress};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use crate::gateway::{GatewayError, TransferGateway, TxHash};
use crate::units::to_base_units;

/// In-process transfer gateway with configurable decimals and latency.
pub struct SimulatedGateway {
    hot_wallet: ChainAddress,
    decimals: u32,
    latency: Duration,
    nonce: AtomicU64,
}

impl SimulatedGateway {
    /// Construct the gateway, fixing `decimals` for the process lifetime
    /// (the real client fetches this once from the token contract at
    /// startup).
    pub fn new(hot_wallet: ChainAddress, decimals: u32) -> Self {
        Self {
            hot_wallet,
            decimals,
            latency: Duration::from_millis(50),
            nonce: AtomicU64::new(rand::random::<u32>() as u64),
        }
    }

    /// Override the simulated network latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn derive_hash(&self, nonce: u64, to: &ChainAddress, units: u128) -> TxHash {
        let mut hasher = Sha256::new();
        hasher.update(nonce.to_be_bytes());
        hasher.update(to.as_str().as_bytes());
        hasher.update(units.to_be_bytes());
        TxHash::new(format!("0x{}", hex::encode(hasher.finalize())))
    }
}

#[async_trait::async_trait]
impl TransferGateway for SimulatedGateway {
    fn decimals(&self) -> u32 {
        self.decimals
    }

    fn hot_wallet(&self) -> &ChainAddress {
        &self.hot_wallet
    }

    async fn send(&self, to: &ChainAddress, amount: Amount) -> Result<TxHash, GatewayError> {
        let units = to_base_units(amount, self.decimals)?;
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);

        tokio::time::sleep(self.latency).await;

        let hash = self.derive_hash(nonce, to, units);
        debug!(%to, %amount, %units, %hash, "simulated transfer confirmed");
        Ok(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn address(tail: &str) -> ChainAddress {
        ChainAddress::parse(&format!("0x{:0>40}", tail)).unwrap()
    }

    #[tokio::test]
    async fn test_send_returns_unique_hashes() {
        let gateway = SimulatedGateway::new(address("aa"), 6).with_latency(Duration::ZERO);
        let to = address("bb");
        let amount = Amount::new(dec!(30)).unwrap();

        let first = gateway.send(&to, amount).await.unwrap();
        let second = gateway.send(&to, amount).await.unwrap();

        assert!(first.as_str().starts_with("0x"));
        assert_eq!(first.as_str().len(), 66);
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_send_rejects_unrepresentable_amount() {
        let gateway = SimulatedGateway::new(address("aa"), 2).with_latency(Duration::ZERO);
        let err = gateway
            .send(&address("bb"), Amount::new(dec!(0.001)).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unrepresentable { .. }));
    }
}
