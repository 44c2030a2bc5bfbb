//! Withdrawal coordinator
//!
//! Bank withdrawals are synchronous bookkeeping: no external system is
//! invoked, so debit + ledger row commit as one unit and there is nothing to
//! roll back.
//!
//! Web3 withdrawals straddle an irreversible external send and reversible
//! internal state. The ordering is fixed: read-only eligibility checks,
//! then the gateway call, and only after confirmed success the debit and
//! the completed ledger row in one transaction. A rejected send records a
//! failed row and leaves the balance untouched. An indeterminate send —
//! timeout, no confirmation — records a pending row, leaves the balance
//! untouched, and escalates: the original may still land on-chain, so an
//! automatic retry risks paying twice.

use cexbank_chain::{to_base_units, GatewayError, TxHash};
use cexbank_core::{Amount, ChainAddress, TxKind, TxStatus};
use cexbank_persistence::{
    AccountRepo, BankAccountRepo, NewTransaction, TransactionRepo, TransactionRow, WhitelistRepo,
};
use rust_decimal::Decimal;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::engine::{Engine, Receipt};
use crate::error::{EngineError, EngineResult};

impl Engine {
    /// Withdraw to a bank card owned by the initiator.
    pub async fn withdraw_bank(
        &self,
        user_id: i64,
        bank_account_id: i64,
        amount: Decimal,
    ) -> EngineResult<Receipt> {
        let amount = Amount::positive(amount)?;

        let user = self.user(user_id).await?;
        Self::require_active(&user)?;

        let card = BankAccountRepo::get_by_id(&self.pool, bank_account_id).await?;
        if card.user_id != user_id {
            return Err(EngineError::CardNotOwned {
                card_id: bank_account_id,
            });
        }

        let _guard = self.locks.acquire(user_id).await;
        let mut tx = self.pool.begin().await?;

        let account = AccountRepo::get_by_user_id(&mut *tx, user_id).await?;
        let balance = Amount::new_unchecked(account.balance()?);
        let after = balance
            .checked_sub(&amount)
            .ok_or_else(|| EngineError::InsufficientFunds {
                available: balance.value(),
                required: amount.value(),
            })?;

        AccountRepo::set_balance(&mut *tx, user_id, after).await?;
        let row = TransactionRepo::insert(
            &mut *tx,
            &NewTransaction {
                initiator_user_id: user_id,
                recipient_user_id: None,
                recipient_address: None,
                bank_account_id: Some(bank_account_id),
                kind: TxKind::WithdrawBank,
                amount,
                status: TxStatus::Completed,
                tx_hash: None,
                correlation_id: Uuid::new_v4().to_string(),
            },
        )
        .await?;

        tx.commit().await?;

        info!(user_id, bank_account_id, %amount, tx_id = row.id, "bank withdrawal settled");
        Ok(Receipt {
            transaction: row,
            balance: after.value(),
        })
    }

    /// Withdraw to a whitelisted on-chain address.
    pub async fn withdraw_web3(
        &self,
        user_id: i64,
        address: &str,
        amount: Decimal,
    ) -> EngineResult<Receipt> {
        let amount = Amount::positive(amount)?;
        let address = ChainAddress::parse(address)?;

        // Representability in chain units is a validation concern; catch it
        // before anything is sent.
        to_base_units(amount, self.gateway.decimals())
            .map_err(|e| EngineError::validation(e.to_string()))?;

        // Read-only eligibility checks, before any external call and before
        // any balance mutation.
        let user = self.user(user_id).await?;
        Self::require_active(&user)?;

        let balance = self.balance_of(user_id).await?;
        if balance < amount.value() {
            return Err(EngineError::InsufficientFunds {
                available: balance,
                required: amount.value(),
            });
        }

        match WhitelistRepo::get_by_address(&self.pool, &address).await? {
            None => return Err(EngineError::NotWhitelisted(address.to_string())),
            Some(entry) if entry.is_frozen() => {
                return Err(EngineError::AddressFrozen(address.to_string()))
            }
            Some(_) => {}
        }

        // Once the gateway is invoked the settlement must reach a recorded
        // conclusion; a caller-side cancellation must not abandon it, so the
        // remainder runs on its own task.
        let correlation_id = Uuid::new_v4().to_string();
        let engine = self.clone();
        let task_address = address.clone();
        let task_correlation = correlation_id.clone();
        let handle = tokio::spawn(async move {
            engine
                .settle_web3(user_id, task_address, amount, task_correlation)
                .await
        });

        handle
            .await
            .map_err(|e| EngineError::Settlement(e.to_string()))?
    }

    async fn settle_web3(
        &self,
        user_id: i64,
        address: ChainAddress,
        amount: Amount,
        correlation_id: String,
    ) -> EngineResult<Receipt> {
        let timeout_ms = self.gateway_timeout.as_millis() as u64;
        let outcome =
            match tokio::time::timeout(self.gateway_timeout, self.gateway.send(&address, amount))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(GatewayError::Indeterminate { timeout_ms }),
            };

        match outcome {
            Ok(hash) => {
                self.settle_web3_success(user_id, address, amount, hash, correlation_id)
                    .await
            }
            Err(GatewayError::Rejected(reason)) => {
                let row = self
                    .record_unsettled(user_id, &address, amount, TxStatus::Failed, &correlation_id)
                    .await?;
                warn!(
                    user_id,
                    %address,
                    %amount,
                    %correlation_id,
                    tx_id = row.id,
                    %reason,
                    "web3 withdrawal rejected by the network"
                );
                Err(EngineError::ExternalTransferRejected {
                    reason,
                    tx_id: row.id,
                })
            }
            Err(GatewayError::Indeterminate { timeout_ms }) => {
                // Escalate before touching the store so the context survives
                // even if the ledger write fails too.
                error!(
                    user_id,
                    %address,
                    %amount,
                    %correlation_id,
                    timeout_ms,
                    "web3 withdrawal outcome UNKNOWN; manual reconciliation required, do not retry"
                );
                let row = self
                    .record_unsettled(user_id, &address, amount, TxStatus::Pending, &correlation_id)
                    .await?;
                Err(EngineError::ExternalTransferIndeterminate {
                    tx_id: row.id,
                    correlation_id,
                })
            }
            Err(err @ GatewayError::Unrepresentable { .. }) => {
                // Pre-checked before dispatch; if it surfaces here the
                // gateway refused before any network send.
                let row = self
                    .record_unsettled(user_id, &address, amount, TxStatus::Failed, &correlation_id)
                    .await?;
                warn!(user_id, %address, %amount, tx_id = row.id, %err, "web3 withdrawal not dispatchable");
                Err(EngineError::validation(err.to_string()))
            }
        }
    }

    /// Success leg: debit and completed ledger row as one atomic step.
    ///
    /// Funds have already left custody; any failure here is a
    /// reconciliation condition, surfaced loudly and never swallowed.
    async fn settle_web3_success(
        &self,
        user_id: i64,
        address: ChainAddress,
        amount: Amount,
        hash: TxHash,
        correlation_id: String,
    ) -> EngineResult<Receipt> {
        let _guard = self.locks.acquire(user_id).await;

        let settled: Result<(TransactionRow, Amount), String> = async {
            let mut tx = self.pool.begin().await.map_err(|e| e.to_string())?;

            let account = AccountRepo::get_by_user_id(&mut *tx, user_id)
                .await
                .map_err(|e| e.to_string())?;
            let balance = Amount::new_unchecked(account.balance().map_err(|e| e.to_string())?);
            let after = balance.checked_sub(&amount).ok_or_else(|| {
                format!(
                    "balance {} below confirmed debit {}",
                    balance.value(),
                    amount.value()
                )
            })?;

            AccountRepo::set_balance(&mut *tx, user_id, after)
                .await
                .map_err(|e| e.to_string())?;
            let row = TransactionRepo::insert(
                &mut *tx,
                &NewTransaction {
                    initiator_user_id: user_id,
                    recipient_user_id: None,
                    recipient_address: Some(address.clone()),
                    bank_account_id: None,
                    kind: TxKind::WithdrawWeb3,
                    amount,
                    status: TxStatus::Completed,
                    tx_hash: Some(hash.as_str().to_string()),
                    correlation_id: correlation_id.clone(),
                },
            )
            .await
            .map_err(|e| e.to_string())?;

            tx.commit().await.map_err(|e| e.to_string())?;
            Ok((row, after))
        }
        .await;

        match settled {
            Ok((row, after)) => {
                info!(
                    user_id,
                    %address,
                    %amount,
                    tx_hash = %hash,
                    tx_id = row.id,
                    "web3 withdrawal settled"
                );
                Ok(Receipt {
                    transaction: row,
                    balance: after.value(),
                })
            }
            Err(detail) => {
                error!(
                    user_id,
                    %address,
                    %amount,
                    tx_hash = %hash,
                    %correlation_id,
                    %detail,
                    "RECONCILIATION FAILURE: funds left custody without a matching internal debit"
                );
                // Best-effort audit row; the escalation above already carries
                // the full context if this fails as well.
                let _ = self
                    .record_unsettled_with_hash(
                        user_id,
                        &address,
                        amount,
                        TxStatus::Pending,
                        Some(hash.as_str()),
                        &correlation_id,
                    )
                    .await;
                Err(EngineError::Reconciliation {
                    tx_hash: hash.into_inner(),
                    correlation_id,
                    detail,
                })
            }
        }
    }

    async fn record_unsettled(
        &self,
        user_id: i64,
        address: &ChainAddress,
        amount: Amount,
        status: TxStatus,
        correlation_id: &str,
    ) -> EngineResult<TransactionRow> {
        self.record_unsettled_with_hash(user_id, address, amount, status, None, correlation_id)
            .await
    }

    async fn record_unsettled_with_hash(
        &self,
        user_id: i64,
        address: &ChainAddress,
        amount: Amount,
        status: TxStatus,
        tx_hash: Option<&str>,
        correlation_id: &str,
    ) -> EngineResult<TransactionRow> {
        TransactionRepo::insert(
            &self.pool,
            &NewTransaction {
                initiator_user_id: user_id,
                recipient_user_id: None,
                recipient_address: Some(address.clone()),
                bank_account_id: None,
                kind: TxKind::WithdrawWeb3,
                amount,
                status,
                tx_hash: tx_hash.map(str::to_string),
                correlation_id: correlation_id.to_string(),
            },
        )
        .await
        .map_err(Into::into)
    }
}
