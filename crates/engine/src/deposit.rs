//! Deposits - fiat-simulated and on-chain arrivals
//!
//! Both paths credit the account and append a completed ledger row in one
//! transaction. Deposits require an active initiator: value does not enter
//! the custodial pool for an unverified identity.

use cexbank_core::{Amount, TxKind, TxStatus};
use cexbank_persistence::{AccountRepo, NewTransaction, TransactionRepo};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::engine::{Engine, Receipt};
use crate::error::{EngineError, EngineResult};

impl Engine {
    /// Credit a confirmed fiat-rail deposit.
    pub async fn deposit_fiat(&self, user_id: i64, amount: Decimal) -> EngineResult<Receipt> {
        self.settle_deposit(user_id, TxKind::DepositFiat, amount).await
    }

    /// Credit a confirmed on-chain deposit into the hot wallet.
    pub async fn deposit_web3(&self, user_id: i64, amount: Decimal) -> EngineResult<Receipt> {
        self.settle_deposit(user_id, TxKind::DepositWeb3, amount).await
    }

    async fn settle_deposit(
        &self,
        user_id: i64,
        kind: TxKind,
        amount: Decimal,
    ) -> EngineResult<Receipt> {
        let amount = Amount::positive(amount)?;

        let user = self.user(user_id).await?;
        Self::require_active(&user)?;

        let _guard = self.locks.acquire(user_id).await;
        let mut tx = self.pool.begin().await?;

        let account = AccountRepo::get_by_user_id(&mut *tx, user_id).await?;
        let balance = Amount::new_unchecked(account.balance()?);
        let new_balance = balance
            .checked_add(&amount)
            .ok_or_else(|| EngineError::validation("balance overflow"))?;

        AccountRepo::set_balance(&mut *tx, user_id, new_balance).await?;
        let row = TransactionRepo::insert(
            &mut *tx,
            &NewTransaction {
                initiator_user_id: user_id,
                recipient_user_id: None,
                recipient_address: None,
                bank_account_id: None,
                kind,
                amount,
                status: TxStatus::Completed,
                tx_hash: None,
                correlation_id: Uuid::new_v4().to_string(),
            },
        )
        .await?;

        tx.commit().await?;

        info!(user_id, %amount, kind = %row.kind, tx_id = row.id, "deposit credited");
        Ok(Receipt {
            transaction: row,
            balance: new_balance.value(),
        })
    }
}
