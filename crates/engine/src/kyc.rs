//! KYC / activation state machine
//!
//! One transition: unverified -> active, triggered by a successful KYC
//! submission. Terminal; there is no re-verification flow.

use cexbank_persistence::{UserRepo, UserRow};
use tracing::info;

use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};

impl Engine {
    /// Submit KYC data and activate the user.
    ///
    /// Fails with `AlreadyActive` if the transition already happened, and
    /// with `DuplicateResource` if the national id is bound to a different
    /// user — checked across all users, not just active ones. No partial
    /// mutation on failure: the read, the uniqueness check, and the update
    /// share one transaction.
    pub async fn submit_kyc(
        &self,
        user_id: i64,
        full_name: &str,
        national_id: &str,
    ) -> EngineResult<UserRow> {
        let full_name = full_name.trim();
        let national_id = national_id.trim();
        if full_name.is_empty() {
            return Err(EngineError::validation("full name must not be empty"));
        }
        if national_id.is_empty() {
            return Err(EngineError::validation("national id must not be empty"));
        }

        let mut tx = self.pool.begin().await?;

        let user = UserRepo::get_by_id(&mut *tx, user_id).await?;
        if user.is_active() {
            return Err(EngineError::AlreadyActive(user_id));
        }

        if let Some(holder) = UserRepo::get_by_national_id(&mut *tx, national_id).await? {
            if holder.id != user_id {
                return Err(EngineError::duplicate("national id", national_id));
            }
        }

        UserRepo::activate(&mut *tx, user_id, full_name, national_id)
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    EngineError::duplicate("national id", national_id)
                } else {
                    EngineError::from(e)
                }
            })?;

        tx.commit().await?;

        info!(user_id, "user activated via KYC");
        UserRepo::get_by_id(&self.pool, user_id)
            .await
            .map_err(Into::into)
    }
}
