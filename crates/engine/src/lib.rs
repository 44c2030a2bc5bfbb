//! Cexbank Engine - ledger, activation gate, and withdrawal coordinator
//!
//! The operations a presentation layer calls, keyed by an authenticated user
//! id. Nothing in this crate knows about HTTP; the adapter's only job is to
//! hand over that id and a validated payload.
//!
//! Balance invariants are enforced in two layers: a per-account async lock
//! makes read-check-write linearizable for one account, and a SQLite
//! transaction makes balance mutation + ledger row (and both legs of a
//! transfer) atomic.

pub mod cards;
pub mod deposit;
pub mod engine;
pub mod error;
pub mod kyc;
pub mod locks;
pub mod register;
pub mod transfer;
pub mod whitelist;
pub mod withdrawal;

pub use engine::{Engine, Receipt};
pub use error::{EngineError, EngineResult};
pub use locks::AccountLocks;
