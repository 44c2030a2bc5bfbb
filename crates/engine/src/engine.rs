//! Engine - wires the store, the gateway, and the lock registry together

use cexbank_chain::TransferGateway;
use cexbank_core::ChainAddress;
use cexbank_persistence::{
    connect, init_schema, AccountRepo, TransactionDetailRow, TransactionRepo, TransactionRow,
    UserRepo, UserRow,
};
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{EngineError, EngineResult};
use crate::locks::AccountLocks;

/// Default budget for one gateway send; expiry is the indeterminate outcome.
const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of a balance-moving operation: the ledger row that recorded it
/// and the initiator's balance after commit.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub transaction: TransactionRow,
    pub balance: Decimal,
}

/// The core service: account store, ledger, KYC gate, whitelist, and the
/// withdrawal coordinator, over one SQLite pool and one transfer gateway.
///
/// Cheap to clone; settlement tasks clone it onto a spawned task so they run
/// to a recorded conclusion even if the calling request is abandoned.
#[derive(Clone)]
pub struct Engine {
    pub(crate) pool: SqlitePool,
    pub(crate) gateway: Arc<dyn TransferGateway>,
    pub(crate) locks: AccountLocks,
    pub(crate) gateway_timeout: Duration,
}

impl Engine {
    pub fn new(pool: SqlitePool, gateway: Arc<dyn TransferGateway>) -> Self {
        Self {
            pool,
            gateway,
            locks: AccountLocks::new(),
            gateway_timeout: DEFAULT_GATEWAY_TIMEOUT,
        }
    }

    /// Open (creating if missing) the database at `path` and bootstrap the
    /// schema.
    pub async fn open(
        path: impl AsRef<Path>,
        gateway: Arc<dyn TransferGateway>,
    ) -> EngineResult<Self> {
        let pool = connect(path).await?;
        init_schema(&pool).await?;
        Ok(Self::new(pool, gateway))
    }

    pub fn with_gateway_timeout(mut self, timeout: Duration) -> Self {
        self.gateway_timeout = timeout;
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Load a user by id.
    pub async fn user(&self, user_id: i64) -> EngineResult<UserRow> {
        UserRepo::get_by_id(&self.pool, user_id)
            .await
            .map_err(Into::into)
    }

    /// Current balance for a user's account.
    pub async fn balance_of(&self, user_id: i64) -> EngineResult<Decimal> {
        AccountRepo::balance(&self.pool, user_id)
            .await
            .map_err(Into::into)
    }

    /// Transaction history (as initiator or recipient), newest first.
    ///
    /// Raw UTC timestamps and full identifiers; formatting and redaction
    /// belong to the view layer.
    pub async fn history(&self, user_id: i64) -> EngineResult<Vec<TransactionDetailRow>> {
        UserRepo::get_by_id(&self.pool, user_id).await?;
        TransactionRepo::history(&self.pool, user_id)
            .await
            .map_err(Into::into)
    }

    /// The hot wallet address users deposit into.
    pub fn deposit_address(&self) -> ChainAddress {
        self.gateway.hot_wallet().clone()
    }

    /// Gate for every value-moving operation.
    pub(crate) fn require_active(user: &UserRow) -> EngineResult<()> {
        if user.is_active() {
            Ok(())
        } else {
            Err(EngineError::NotActive(user.id))
        }
    }
}
