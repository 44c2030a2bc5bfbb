//! Shared test fixtures: a scripted gateway and engine constructors

// Each test binary compiles this module separately and uses a subset of it.
#![allow(dead_code)]

use async_trait::async_trait;
use cexbank_chain::{GatewayError, TransferGateway, TxHash};
use cexbank_core::{Amount, ChainAddress};
use cexbank_engine::Engine;
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// One scripted outcome for a `send` call.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Confirm with this hash
    Sent(String),
    /// Definite network rejection
    Rejected(String),
    /// Never answer within any reasonable timeout
    Hang,
}

/// Gateway that replays a fixed script of outcomes and counts calls.
pub struct ScriptedGateway {
    hot_wallet: ChainAddress,
    decimals: u32,
    script: Mutex<VecDeque<Outcome>>,
    pub calls: AtomicU64,
}

impl ScriptedGateway {
    pub fn new(decimals: u32, script: Vec<Outcome>) -> Self {
        Self {
            hot_wallet: address("c0ffee"),
            decimals,
            script: Mutex::new(script.into()),
            calls: AtomicU64::new(0),
        }
    }

    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransferGateway for ScriptedGateway {
    fn decimals(&self) -> u32 {
        self.decimals
    }

    fn hot_wallet(&self) -> &ChainAddress {
        &self.hot_wallet
    }

    async fn send(&self, _to: &ChainAddress, _amount: Amount) -> Result<TxHash, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("gateway called more times than scripted");
        match outcome {
            Outcome::Sent(hash) => Ok(TxHash::new(hash)),
            Outcome::Rejected(reason) => Err(GatewayError::Rejected(reason)),
            Outcome::Hang => {
                tokio::time::sleep(Duration::from_secs(600)).await;
                unreachable!("hanging send completed")
            }
        }
    }
}

/// A well-formed address with a recognizable tail.
pub fn address(tail: &str) -> ChainAddress {
    ChainAddress::parse(&format!("0x{:0>40}", tail)).unwrap()
}

/// Engine over a fresh on-disk database and the given gateway.
///
/// The TempDir must outlive the engine; tests keep it bound.
pub async fn engine_with(gateway: Arc<ScriptedGateway>) -> (Engine, TempDir) {
    let dir = TempDir::new().unwrap();
    let engine = Engine::open(dir.path().join("cexbank.db"), gateway)
        .await
        .unwrap();
    (engine, dir)
}

/// Engine whose gateway is never expected to be reached.
pub async fn engine() -> (Engine, TempDir) {
    engine_with(Arc::new(ScriptedGateway::new(6, Vec::new()))).await
}

/// Register + KYC-activate a user, returning its id.
pub async fn active_user(engine: &Engine, email: &str, national_id: &str) -> i64 {
    let user = engine.register(email).await.unwrap();
    engine
        .submit_kyc(user.id, "Test Holder", national_id)
        .await
        .unwrap();
    user.id
}

/// Active user with a starting balance.
pub async fn funded_user(
    engine: &Engine,
    email: &str,
    national_id: &str,
    balance: Decimal,
) -> i64 {
    let user_id = active_user(engine, email, national_id).await;
    engine.deposit_fiat(user_id, balance).await.unwrap();
    user_id
}
