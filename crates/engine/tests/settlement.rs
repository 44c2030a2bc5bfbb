//! Withdrawal coordinator integration tests: the three gateway outcomes,
//! eligibility gating, and whitelist semantics.

mod common;

use cexbank_core::WhitelistStatus;
use cexbank_engine::EngineError;
use common::{address, engine, engine_with, funded_user, Outcome, ScriptedGateway};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

const HASH: &str = "0xabc";

#[tokio::test]
async fn test_withdraw_web3_success_settles() {
    let gateway = Arc::new(ScriptedGateway::new(6, vec![Outcome::Sent(HASH.into())]));
    let (engine, _dir) = engine_with(gateway.clone()).await;
    let alice = funded_user(&engine, "alice@example.com", "A1", dec!(100)).await;
    let dest = address("d1");
    engine.whitelist_add("market maker", dest.as_str()).await.unwrap();

    let receipt = engine
        .withdraw_web3(alice, dest.as_str(), dec!(30))
        .await
        .unwrap();

    assert_eq!(receipt.balance, dec!(70));
    assert_eq!(receipt.transaction.kind, "withdraw_web3");
    assert_eq!(receipt.transaction.status, "completed");
    assert_eq!(receipt.transaction.tx_hash.as_deref(), Some(HASH));
    assert!(receipt.transaction.completed_at.is_some());
    assert_eq!(engine.balance_of(alice).await.unwrap(), dec!(70));
    assert_eq!(gateway.call_count(), 1);
}

#[tokio::test]
async fn test_withdraw_web3_rejected_leaves_balance() {
    let gateway = Arc::new(ScriptedGateway::new(
        6,
        vec![Outcome::Rejected("insufficient gas".into())],
    ));
    let (engine, _dir) = engine_with(gateway.clone()).await;
    let alice = funded_user(&engine, "alice@example.com", "A1", dec!(100)).await;
    let dest = address("d1");
    engine.whitelist_add("market maker", dest.as_str()).await.unwrap();

    let err = engine
        .withdraw_web3(alice, dest.as_str(), dec!(30))
        .await
        .unwrap_err();

    match err {
        EngineError::ExternalTransferRejected { reason, .. } => {
            assert_eq!(reason, "insufficient gas")
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(engine.balance_of(alice).await.unwrap(), dec!(100));

    // One failed row, no hash.
    let history = engine.history(alice).await.unwrap();
    let failed = &history[0];
    assert_eq!(failed.kind, "withdraw_web3");
    assert_eq!(failed.status, "failed");
    assert!(failed.tx_hash.is_none());
    assert!(failed.completed_at.is_none());
}

#[tokio::test]
async fn test_withdraw_web3_indeterminate_records_pending_and_escalates() {
    let gateway = Arc::new(ScriptedGateway::new(6, vec![Outcome::Hang]));
    let (engine, _dir) = engine_with(gateway.clone()).await;
    let engine = engine.with_gateway_timeout(Duration::from_millis(50));
    let alice = funded_user(&engine, "alice@example.com", "A1", dec!(100)).await;
    let dest = address("d1");
    engine.whitelist_add("market maker", dest.as_str()).await.unwrap();

    let err = engine
        .withdraw_web3(alice, dest.as_str(), dec!(30))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::ExternalTransferIndeterminate { .. }
    ));
    // No phantom debit, no automatic retry.
    assert_eq!(engine.balance_of(alice).await.unwrap(), dec!(100));
    assert_eq!(gateway.call_count(), 1);

    let history = engine.history(alice).await.unwrap();
    let pending = &history[0];
    assert_eq!(pending.status, "pending");
    assert!(pending.tx_hash.is_none());
    assert!(pending.completed_at.is_none());
}

#[tokio::test]
async fn test_withdraw_web3_not_whitelisted() {
    let gateway = Arc::new(ScriptedGateway::new(6, Vec::new()));
    let (engine, _dir) = engine_with(gateway.clone()).await;
    let alice = funded_user(&engine, "alice@example.com", "A1", dec!(100)).await;

    let err = engine
        .withdraw_web3(alice, address("d1").as_str(), dec!(30))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::NotWhitelisted(_)));
    assert_eq!(engine.balance_of(alice).await.unwrap(), dec!(100));
    // The gateway was never invoked for an ineligible destination.
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn test_withdraw_web3_frozen_address() {
    let gateway = Arc::new(ScriptedGateway::new(6, Vec::new()));
    let (engine, _dir) = engine_with(gateway.clone()).await;
    let alice = funded_user(&engine, "alice@example.com", "A1", dec!(100)).await;
    let dest = address("d1");
    let entry = engine.whitelist_add("market maker", dest.as_str()).await.unwrap();
    engine
        .whitelist_set_status(entry.id, WhitelistStatus::Frozen)
        .await
        .unwrap();

    let err = engine
        .withdraw_web3(alice, dest.as_str(), dec!(30))
        .await
        .unwrap_err();

    // Frozen is distinguishable from absent.
    assert!(matches!(err, EngineError::AddressFrozen(_)));
    assert_eq!(engine.balance_of(alice).await.unwrap(), dec!(100));
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn test_withdraw_web3_insufficient_funds_checked_before_send() {
    let gateway = Arc::new(ScriptedGateway::new(6, Vec::new()));
    let (engine, _dir) = engine_with(gateway.clone()).await;
    let alice = funded_user(&engine, "alice@example.com", "A1", dec!(20)).await;
    let dest = address("d1");
    engine.whitelist_add("market maker", dest.as_str()).await.unwrap();

    let err = engine
        .withdraw_web3(alice, dest.as_str(), dec!(30))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::InsufficientFunds { .. }));
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn test_withdraw_web3_requires_active_user() {
    let gateway = Arc::new(ScriptedGateway::new(6, Vec::new()));
    let (engine, _dir) = engine_with(gateway.clone()).await;
    let user = engine.register("alice@example.com").await.unwrap();
    let dest = address("d1");
    engine.whitelist_add("market maker", dest.as_str()).await.unwrap();

    let err = engine
        .withdraw_web3(user.id, dest.as_str(), dec!(30))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::NotActive(_)));
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn test_withdraw_web3_sub_unit_precision_rejected_before_send() {
    let gateway = Arc::new(ScriptedGateway::new(2, Vec::new()));
    let (engine, _dir) = engine_with(gateway.clone()).await;
    let alice = funded_user(&engine, "alice@example.com", "A1", dec!(100)).await;
    let dest = address("d1");
    engine.whitelist_add("market maker", dest.as_str()).await.unwrap();

    let err = engine
        .withdraw_web3(alice, dest.as_str(), dec!(0.001))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Validation(_)));
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn test_withdraw_web3_malformed_address_rejected() {
    let (engine, _dir) = engine().await;
    let alice = funded_user(&engine, "alice@example.com", "A1", dec!(100)).await;

    let err = engine
        .withdraw_web3(alice, "0xnot-an-address", dec!(30))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn test_whitelist_add_rejects_duplicates_and_bad_addresses() {
    let (engine, _dir) = engine().await;
    let dest = address("d1");

    engine.whitelist_add("first", dest.as_str()).await.unwrap();
    assert!(matches!(
        engine.whitelist_add("second", dest.as_str()).await.unwrap_err(),
        EngineError::DuplicateResource { .. }
    ));
    assert!(matches!(
        engine.whitelist_add("bad", "12345").await.unwrap_err(),
        EngineError::Validation(_)
    ));

    // Lookup is case-insensitive through address normalization.
    let upper = dest.as_str().to_uppercase().replace("0X", "0x");
    let entry = engine.whitelist_lookup(&upper).await.unwrap();
    assert_eq!(entry.map(|e| e.label), Some("first".to_string()));
    assert!(engine
        .whitelist_lookup(address("d2").as_str())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_whitelist_freeze_is_idempotent() {
    let (engine, _dir) = engine().await;
    let entry = engine
        .whitelist_add("market maker", address("d1").as_str())
        .await
        .unwrap();

    let frozen = engine
        .whitelist_set_status(entry.id, WhitelistStatus::Frozen)
        .await
        .unwrap();
    let frozen_at = frozen.frozen_at.expect("frozen_at set when frozen");

    // Re-freezing keeps the original timestamp.
    let refrozen = engine
        .whitelist_set_status(entry.id, WhitelistStatus::Frozen)
        .await
        .unwrap();
    assert_eq!(refrozen.frozen_at, Some(frozen_at));

    // Unfreezing clears it.
    let normal = engine
        .whitelist_set_status(entry.id, WhitelistStatus::Normal)
        .await
        .unwrap();
    assert_eq!(normal.status, "normal");
    assert!(normal.frozen_at.is_none());
}

#[tokio::test]
async fn test_whitelist_set_status_unknown_entry() {
    let (engine, _dir) = engine().await;
    let err = engine
        .whitelist_set_status(999, WhitelistStatus::Frozen)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));
}
