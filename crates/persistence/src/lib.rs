//! Cexbank Persistence - SQLite repositories
//!
//! One relational store holds all durable state: users, accounts,
//! transactions, bank cards, and the withdrawal whitelist.
//!
//! Repository functions that only read take any SQLite executor (a pool or a
//! transaction); functions that mutate are written to be composed inside a
//! single `sqlx` transaction by the engine, so that debit + ledger row (and
//! both legs of a transfer) commit or roll back as one unit.

pub mod error;
pub mod sqlite;

pub use error::{PersistenceError, PersistenceResult};
pub use sqlite::repos::{
    AccountRepo, BankAccountRepo, TransactionRepo, UserRepo, WhitelistRepo,
};
pub use sqlite::schema::{
    AccountRow, BankAccountRow, NewTransaction, TransactionDetailRow, TransactionRow, UserRow,
    WhitelistRow,
};
pub use sqlite::{connect, init_schema};
