//! Database schema and row types
//!
//! Monetary columns are TEXT decimal strings; SQLite floats are never used
//! for balances or amounts. Timestamps are RFC 3339 UTC via the sqlx chrono
//! adapter.

use chrono::{DateTime, Utc};
use cexbank_core::{Amount, ChainAddress, TxKind, TxStatus, UserStatus, WhitelistStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{PersistenceError, PersistenceResult};

/// Schema bootstrap statements, executed in order by `init_schema`.
pub const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE,
        full_name TEXT,
        national_id TEXT UNIQUE,
        status TEXT NOT NULL DEFAULT 'unverified',
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS accounts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL UNIQUE REFERENCES users(id),
        balance TEXT NOT NULL DEFAULT '0',
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS bank_accounts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id),
        holder_name TEXT NOT NULL,
        bank_name TEXT NOT NULL,
        card_number TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS transactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        initiator_user_id INTEGER NOT NULL REFERENCES users(id),
        recipient_user_id INTEGER REFERENCES users(id),
        recipient_address TEXT,
        bank_account_id INTEGER REFERENCES bank_accounts(id),
        kind TEXT NOT NULL,
        amount TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending',
        tx_hash TEXT UNIQUE,
        correlation_id TEXT NOT NULL,
        created_at TEXT NOT NULL,
        completed_at TEXT
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_transactions_initiator
    ON transactions(initiator_user_id)
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_transactions_recipient
    ON transactions(recipient_user_id)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS whitelist (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        label TEXT NOT NULL,
        address TEXT NOT NULL UNIQUE,
        status TEXT NOT NULL DEFAULT 'normal',
        frozen_at TEXT,
        created_at TEXT NOT NULL
    )
    "#,
];

fn parse_decimal(s: &str) -> PersistenceResult<Decimal> {
    Decimal::from_str(s).map_err(|_| PersistenceError::InvalidDecimal(s.to_string()))
}

fn parse_code<T: FromStr>(field: &str, value: &str) -> PersistenceResult<T> {
    value
        .parse()
        .map_err(|_| PersistenceError::InvalidEnumValue {
            field: field.to_string(),
            value: value.to_string(),
        })
}

/// Row type for the `users` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub full_name: Option<String>,
    pub national_id: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    pub fn status(&self) -> PersistenceResult<UserStatus> {
        parse_code("users.status", &self.status)
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active.to_string()
    }
}

/// Row type for the `accounts` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct AccountRow {
    pub id: i64,
    pub user_id: i64,
    pub balance: String,
    pub updated_at: DateTime<Utc>,
}

impl AccountRow {
    pub fn balance(&self) -> PersistenceResult<Decimal> {
        parse_decimal(&self.balance)
    }
}

/// Row type for the `transactions` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct TransactionRow {
    pub id: i64,
    pub initiator_user_id: i64,
    pub recipient_user_id: Option<i64>,
    pub recipient_address: Option<String>,
    pub bank_account_id: Option<i64>,
    pub kind: String,
    pub amount: String,
    pub status: String,
    pub tx_hash: Option<String>,
    pub correlation_id: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TransactionRow {
    pub fn kind(&self) -> PersistenceResult<TxKind> {
        parse_code("transactions.kind", &self.kind)
    }

    pub fn status(&self) -> PersistenceResult<TxStatus> {
        parse_code("transactions.status", &self.status)
    }

    pub fn amount(&self) -> PersistenceResult<Decimal> {
        parse_decimal(&self.amount)
    }
}

/// Insert payload for one ledger row.
///
/// Built by the engine; the repository fills in id and created_at.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub initiator_user_id: i64,
    pub recipient_user_id: Option<i64>,
    pub recipient_address: Option<ChainAddress>,
    pub bank_account_id: Option<i64>,
    pub kind: TxKind,
    pub amount: Amount,
    pub status: TxStatus,
    pub tx_hash: Option<String>,
    pub correlation_id: String,
}

/// Row type for the `bank_accounts` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct BankAccountRow {
    pub id: i64,
    pub user_id: i64,
    pub holder_name: String,
    pub bank_name: String,
    pub card_number: String,
    pub created_at: DateTime<Utc>,
}

/// Row type for the `whitelist` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct WhitelistRow {
    pub id: i64,
    pub label: String,
    pub address: String,
    pub status: String,
    pub frozen_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl WhitelistRow {
    pub fn status(&self) -> PersistenceResult<WhitelistStatus> {
        parse_code("whitelist.status", &self.status)
    }

    pub fn is_frozen(&self) -> bool {
        self.status == WhitelistStatus::Frozen.to_string()
    }
}

/// Read-side join for transaction history: the ledger row plus counterparty
/// and bank-card references resolved to displayable fields. Timestamps stay
/// raw UTC and card numbers stay full; redaction is a view-layer concern.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct TransactionDetailRow {
    pub id: i64,
    pub kind: String,
    pub amount: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub initiator_email: String,
    pub initiator_name: Option<String>,
    pub recipient_email: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_address: Option<String>,
    pub bank_name: Option<String>,
    pub card_number: Option<String>,
    pub tx_hash: Option<String>,
}

impl TransactionDetailRow {
    pub fn amount(&self) -> PersistenceResult<Decimal> {
        parse_decimal(&self.amount)
    }
}
