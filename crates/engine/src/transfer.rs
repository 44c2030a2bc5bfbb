//! Internal transfers - both legs and the ledger row as one unit
//!
//! A partially applied transfer (debit without credit) is prevented by
//! construction: both accounts' critical sections are held, in ascending
//! user-id order, and both balance writes plus the ledger row share one
//! transaction.

use cexbank_core::{Amount, TxKind, TxStatus};
use cexbank_persistence::{AccountRepo, NewTransaction, TransactionRepo, UserRepo};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::engine::{Engine, Receipt};
use crate::error::{EngineError, EngineResult};

impl Engine {
    /// Move value between two internal accounts, addressed by recipient
    /// email.
    pub async fn transfer(
        &self,
        user_id: i64,
        recipient_email: &str,
        amount: Decimal,
    ) -> EngineResult<Receipt> {
        let amount = Amount::positive(amount)?;

        let initiator = self.user(user_id).await?;
        Self::require_active(&initiator)?;

        let recipient = UserRepo::get_by_email(&self.pool, recipient_email.trim())
            .await?
            .ok_or_else(|| EngineError::NotFound {
                entity: "User".to_string(),
                id: recipient_email.trim().to_string(),
            })?;
        if recipient.id == user_id {
            return Err(EngineError::validation("cannot transfer to yourself"));
        }
        if !recipient.is_active() {
            return Err(EngineError::RecipientNotActive);
        }

        let _guard = self.locks.acquire_pair(user_id, recipient.id).await;
        let mut tx = self.pool.begin().await?;

        let sender = AccountRepo::get_by_user_id(&mut *tx, user_id).await?;
        let sender_balance = Amount::new_unchecked(sender.balance()?);
        let sender_after = sender_balance.checked_sub(&amount).ok_or_else(|| {
            EngineError::InsufficientFunds {
                available: sender_balance.value(),
                required: amount.value(),
            }
        })?;

        let receiver = AccountRepo::get_by_user_id(&mut *tx, recipient.id).await?;
        let receiver_balance = Amount::new_unchecked(receiver.balance()?);
        let receiver_after = receiver_balance
            .checked_add(&amount)
            .ok_or_else(|| EngineError::validation("balance overflow"))?;

        AccountRepo::set_balance(&mut *tx, user_id, sender_after).await?;
        AccountRepo::set_balance(&mut *tx, recipient.id, receiver_after).await?;
        let row = TransactionRepo::insert(
            &mut *tx,
            &NewTransaction {
                initiator_user_id: user_id,
                recipient_user_id: Some(recipient.id),
                recipient_address: None,
                bank_account_id: None,
                kind: TxKind::InternalTransfer,
                amount,
                status: TxStatus::Completed,
                tx_hash: None,
                correlation_id: Uuid::new_v4().to_string(),
            },
        )
        .await?;

        tx.commit().await?;

        info!(
            user_id,
            recipient_id = recipient.id,
            %amount,
            tx_id = row.id,
            "internal transfer settled"
        );
        Ok(Receipt {
            transaction: row,
            balance: sender_after.value(),
        })
    }
}
