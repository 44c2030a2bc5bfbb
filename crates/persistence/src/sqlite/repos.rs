//! Repository implementations for SQLite
//!
//! Every function runs exactly one statement against the executor it is
//! given. A `&SqlitePool` works for standalone reads; the engine passes
//! `&mut *tx` to compose mutations inside one transaction (debit + ledger
//! row, or both legs of a transfer, commit together or not at all).

use chrono::Utc;
use cexbank_core::{Amount, ChainAddress, TxStatus, UserStatus, WhitelistStatus};
use rust_decimal::Decimal;
use sqlx::{Executor, Sqlite};

use crate::error::{PersistenceError, PersistenceResult};
use crate::sqlite::schema::{
    AccountRow, BankAccountRow, NewTransaction, TransactionDetailRow, TransactionRow, UserRow,
    WhitelistRow,
};

// ============================================================================
// User Repository
// ============================================================================

/// Repository for the `users` table
pub struct UserRepo;

impl UserRepo {
    /// Insert a new unverified user, returning its id.
    pub async fn insert<'e, E>(ex: E, email: &str) -> PersistenceResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "INSERT INTO users (email, status, created_at) VALUES (?, 'unverified', ?)",
        )
        .bind(email)
        .bind(Utc::now())
        .execute(ex)
        .await
        .map_err(PersistenceError::from_sqlx)?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_by_id<'e, E>(ex: E, id: i64) -> PersistenceResult<UserRow>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(ex)
            .await?
            .ok_or_else(|| PersistenceError::not_found("User", id))
    }

    pub async fn get_by_email<'e, E>(ex: E, email: &str) -> PersistenceResult<Option<UserRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(ex)
            .await?;
        Ok(row)
    }

    pub async fn get_by_national_id<'e, E>(
        ex: E,
        national_id: &str,
    ) -> PersistenceResult<Option<UserRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE national_id = ?")
            .bind(national_id)
            .fetch_optional(ex)
            .await?;
        Ok(row)
    }

    /// Persist KYC data and flip the user to active.
    ///
    /// Guarded on the current status so the unverified -> active transition
    /// can only happen once even under a race.
    pub async fn activate<'e, E>(
        ex: E,
        id: i64,
        full_name: &str,
        national_id: &str,
    ) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "UPDATE users SET full_name = ?, national_id = ?, status = ? \
             WHERE id = ? AND status = ?",
        )
        .bind(full_name)
        .bind(national_id)
        .bind(UserStatus::Active.to_string())
        .bind(id)
        .bind(UserStatus::Unverified.to_string())
        .execute(ex)
        .await
        .map_err(PersistenceError::from_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("unverified user", id));
        }
        Ok(())
    }
}

// ============================================================================
// Account Repository
// ============================================================================

/// Repository for the `accounts` table
pub struct AccountRepo;

impl AccountRepo {
    /// Create the account for a user with a zero balance.
    pub async fn create<'e, E>(ex: E, user_id: i64) -> PersistenceResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result =
            sqlx::query("INSERT INTO accounts (user_id, balance, updated_at) VALUES (?, '0', ?)")
                .bind(user_id)
                .bind(Utc::now())
                .execute(ex)
                .await
                .map_err(PersistenceError::from_sqlx)?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_by_user_id<'e, E>(ex: E, user_id: i64) -> PersistenceResult<AccountRow>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(ex)
            .await?
            .ok_or_else(|| PersistenceError::not_found("Account", user_id))
    }

    /// Current balance for a user.
    pub async fn balance<'e, E>(ex: E, user_id: i64) -> PersistenceResult<Decimal>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = Self::get_by_user_id(ex, user_id).await?;
        row.balance()
    }

    /// Overwrite the stored balance.
    ///
    /// Callers hold the per-account critical section and have already
    /// verified the non-negative invariant on the new value.
    pub async fn set_balance<'e, E>(
        ex: E,
        user_id: i64,
        balance: Amount,
    ) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("UPDATE accounts SET balance = ?, updated_at = ? WHERE user_id = ?")
            .bind(balance.value().to_string())
            .bind(Utc::now())
            .bind(user_id)
            .execute(ex)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("Account", user_id));
        }
        Ok(())
    }
}

// ============================================================================
// Transaction Repository (the ledger)
// ============================================================================

/// Repository for the `transactions` table — the append-only ledger.
pub struct TransactionRepo;

impl TransactionRepo {
    /// Append one ledger row.
    ///
    /// `completed_at` is set if and only if the row is recorded as
    /// completed at creation time.
    pub async fn insert<'e, E>(ex: E, new: &NewTransaction) -> PersistenceResult<TransactionRow>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let created_at = Utc::now();
        let completed_at = match new.status {
            TxStatus::Completed => Some(created_at),
            _ => None,
        };

        let result = sqlx::query(
            "INSERT INTO transactions \
             (initiator_user_id, recipient_user_id, recipient_address, bank_account_id, \
              kind, amount, status, tx_hash, correlation_id, created_at, completed_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(new.initiator_user_id)
        .bind(new.recipient_user_id)
        .bind(new.recipient_address.as_ref().map(ChainAddress::as_str))
        .bind(new.bank_account_id)
        .bind(new.kind.to_string())
        .bind(new.amount.value().to_string())
        .bind(new.status.to_string())
        .bind(new.tx_hash.as_deref())
        .bind(&new.correlation_id)
        .bind(created_at)
        .bind(completed_at)
        .execute(ex)
        .await
        .map_err(PersistenceError::from_sqlx)?;

        Ok(TransactionRow {
            id: result.last_insert_rowid(),
            initiator_user_id: new.initiator_user_id,
            recipient_user_id: new.recipient_user_id,
            recipient_address: new
                .recipient_address
                .as_ref()
                .map(|a| a.as_str().to_string()),
            bank_account_id: new.bank_account_id,
            kind: new.kind.to_string(),
            amount: new.amount.value().to_string(),
            status: new.status.to_string(),
            tx_hash: new.tx_hash.clone(),
            correlation_id: new.correlation_id.clone(),
            created_at,
            completed_at,
        })
    }

    pub async fn get_by_id<'e, E>(ex: E, id: i64) -> PersistenceResult<TransactionRow>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, TransactionRow>("SELECT * FROM transactions WHERE id = ?")
            .bind(id)
            .fetch_optional(ex)
            .await?
            .ok_or_else(|| PersistenceError::not_found("Transaction", id))
    }

    /// Finalize a pending row exactly once.
    ///
    /// Sets the terminal status, the hash when one exists, and
    /// `completed_at` iff the terminal status is completed. The status guard
    /// makes a second finalization fail rather than overwrite.
    pub async fn finalize<'e, E>(
        ex: E,
        id: i64,
        status: TxStatus,
        tx_hash: Option<&str>,
    ) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let completed_at = match status {
            TxStatus::Completed => Some(Utc::now()),
            _ => None,
        };

        let result = sqlx::query(
            "UPDATE transactions SET status = ?, tx_hash = ?, completed_at = ? \
             WHERE id = ? AND status = ?",
        )
        .bind(status.to_string())
        .bind(tx_hash)
        .bind(completed_at)
        .bind(id)
        .bind(TxStatus::Pending.to_string())
        .execute(ex)
        .await
        .map_err(PersistenceError::from_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::AlreadyFinalized(id));
        }
        Ok(())
    }

    /// Transaction history for a user (initiator or recipient), newest
    /// first, with counterparty and bank-card references resolved.
    pub async fn history<'e, E>(ex: E, user_id: i64) -> PersistenceResult<Vec<TransactionDetailRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, TransactionDetailRow>(
            "SELECT t.id, t.kind, t.amount, t.status, t.created_at, t.completed_at, \
                    iu.email AS initiator_email, iu.full_name AS initiator_name, \
                    ru.email AS recipient_email, ru.full_name AS recipient_name, \
                    t.recipient_address, \
                    ba.bank_name AS bank_name, ba.card_number AS card_number, \
                    t.tx_hash \
             FROM transactions t \
             JOIN users iu ON iu.id = t.initiator_user_id \
             LEFT JOIN users ru ON ru.id = t.recipient_user_id \
             LEFT JOIN bank_accounts ba ON ba.id = t.bank_account_id \
             WHERE t.initiator_user_id = ? OR t.recipient_user_id = ? \
             ORDER BY t.created_at DESC, t.id DESC",
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(ex)
        .await?;

        Ok(rows)
    }
}

// ============================================================================
// Bank Account Repository
// ============================================================================

/// Repository for the `bank_accounts` table
pub struct BankAccountRepo;

impl BankAccountRepo {
    pub async fn insert<'e, E>(
        ex: E,
        user_id: i64,
        holder_name: &str,
        bank_name: &str,
        card_number: &str,
    ) -> PersistenceResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "INSERT INTO bank_accounts (user_id, holder_name, bank_name, card_number, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(holder_name)
        .bind(bank_name)
        .bind(card_number)
        .bind(Utc::now())
        .execute(ex)
        .await
        .map_err(PersistenceError::from_sqlx)?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_by_id<'e, E>(ex: E, id: i64) -> PersistenceResult<BankAccountRow>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, BankAccountRow>("SELECT * FROM bank_accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(ex)
            .await?
            .ok_or_else(|| PersistenceError::not_found("BankAccount", id))
    }

    pub async fn get_by_card_number<'e, E>(
        ex: E,
        card_number: &str,
    ) -> PersistenceResult<Option<BankAccountRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row =
            sqlx::query_as::<_, BankAccountRow>("SELECT * FROM bank_accounts WHERE card_number = ?")
                .bind(card_number)
                .fetch_optional(ex)
                .await?;
        Ok(row)
    }

    pub async fn list_by_user<'e, E>(ex: E, user_id: i64) -> PersistenceResult<Vec<BankAccountRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, BankAccountRow>(
            "SELECT * FROM bank_accounts WHERE user_id = ? ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(ex)
        .await?;
        Ok(rows)
    }
}

// ============================================================================
// Whitelist Repository
// ============================================================================

/// Repository for the `whitelist` table — the global withdrawal allow-list.
pub struct WhitelistRepo;

impl WhitelistRepo {
    pub async fn insert<'e, E>(
        ex: E,
        label: &str,
        address: &ChainAddress,
    ) -> PersistenceResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "INSERT INTO whitelist (label, address, status, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(label)
        .bind(address.as_str())
        .bind(WhitelistStatus::Normal.to_string())
        .bind(Utc::now())
        .execute(ex)
        .await
        .map_err(PersistenceError::from_sqlx)?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_by_id<'e, E>(ex: E, id: i64) -> PersistenceResult<WhitelistRow>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, WhitelistRow>("SELECT * FROM whitelist WHERE id = ?")
            .bind(id)
            .fetch_optional(ex)
            .await?
            .ok_or_else(|| PersistenceError::not_found("WhitelistEntry", id))
    }

    pub async fn get_by_address<'e, E>(
        ex: E,
        address: &ChainAddress,
    ) -> PersistenceResult<Option<WhitelistRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, WhitelistRow>("SELECT * FROM whitelist WHERE address = ?")
            .bind(address.as_str())
            .fetch_optional(ex)
            .await?;
        Ok(row)
    }

    pub async fn list<'e, E>(ex: E) -> PersistenceResult<Vec<WhitelistRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, WhitelistRow>("SELECT * FROM whitelist ORDER BY id")
            .fetch_all(ex)
            .await?;
        Ok(rows)
    }

    /// Set the entry status; `frozen_at` tracks it.
    ///
    /// Idempotent: re-freezing keeps the original `frozen_at`, re-normalizing
    /// an already-normal entry is a no-op.
    pub async fn set_status<'e, E>(
        ex: E,
        id: i64,
        status: WhitelistStatus,
    ) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = match status {
            WhitelistStatus::Frozen => {
                sqlx::query(
                    "UPDATE whitelist SET status = ?, frozen_at = COALESCE(frozen_at, ?) \
                     WHERE id = ?",
                )
                .bind(status.to_string())
                .bind(Utc::now())
                .bind(id)
                .execute(ex)
                .await?
            }
            WhitelistStatus::Normal => {
                sqlx::query("UPDATE whitelist SET status = ?, frozen_at = NULL WHERE id = ?")
                    .bind(status.to_string())
                    .bind(id)
                    .execute(ex)
                    .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("WhitelistEntry", id));
        }
        Ok(())
    }
}
