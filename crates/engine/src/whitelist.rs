//! Whitelist administration
//!
//! The allow-list is global, not per-user: an address is either a vetted
//! destination for the whole exchange or it is not.

use cexbank_core::{ChainAddress, WhitelistStatus};
use cexbank_persistence::{WhitelistRepo, WhitelistRow};
use tracing::info;

use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};

impl Engine {
    /// Look up an address in the registry.
    pub async fn whitelist_lookup(&self, address: &str) -> EngineResult<Option<WhitelistRow>> {
        let address = ChainAddress::parse(address)?;
        WhitelistRepo::get_by_address(&self.pool, &address)
            .await
            .map_err(Into::into)
    }

    /// All entries, for the admin view.
    pub async fn whitelist_list(&self) -> EngineResult<Vec<WhitelistRow>> {
        WhitelistRepo::list(&self.pool).await.map_err(Into::into)
    }

    /// Add a vetted address.
    ///
    /// Syntax is validated before insertion; a duplicate address is a
    /// `DuplicateResource`.
    pub async fn whitelist_add(&self, label: &str, address: &str) -> EngineResult<WhitelistRow> {
        let label = label.trim();
        if label.is_empty() {
            return Err(EngineError::validation("label must not be empty"));
        }
        let address = ChainAddress::parse(address)?;

        if WhitelistRepo::get_by_address(&self.pool, &address)
            .await?
            .is_some()
        {
            return Err(EngineError::duplicate("whitelist address", &address));
        }

        let id = WhitelistRepo::insert(&self.pool, label, &address)
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    EngineError::duplicate("whitelist address", &address)
                } else {
                    EngineError::from(e)
                }
            })?;

        info!(id, %address, label, "whitelist entry added");
        WhitelistRepo::get_by_id(&self.pool, id)
            .await
            .map_err(Into::into)
    }

    /// Set an entry's status. Idempotent; `frozen_at` tracks the status.
    pub async fn whitelist_set_status(
        &self,
        entry_id: i64,
        status: WhitelistStatus,
    ) -> EngineResult<WhitelistRow> {
        WhitelistRepo::set_status(&self.pool, entry_id, status).await?;
        let row = WhitelistRepo::get_by_id(&self.pool, entry_id).await?;
        info!(entry_id, status = %row.status, "whitelist entry status set");
        Ok(row)
    }
}
