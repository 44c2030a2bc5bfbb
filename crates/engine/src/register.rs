//! Registration - user plus zero-balance account, created as one unit

use cexbank_persistence::{AccountRepo, UserRepo, UserRow};
use tracing::info;

use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};

impl Engine {
    /// Register a new user.
    ///
    /// Credentials and token issuance live outside the core; registration
    /// here is the ledger-side half: a unique email, an unverified user row,
    /// and its account at balance zero, committed together.
    pub async fn register(&self, email: &str) -> EngineResult<UserRow> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') || email.contains(char::is_whitespace) {
            return Err(EngineError::validation(format!("malformed email: {email:?}")));
        }

        if UserRepo::get_by_email(&self.pool, email).await?.is_some() {
            return Err(EngineError::duplicate("email", email));
        }

        let mut tx = self.pool.begin().await?;
        let user_id = UserRepo::insert(&mut *tx, email).await.map_err(|e| {
            if e.is_unique_violation() {
                EngineError::duplicate("email", email)
            } else {
                EngineError::from(e)
            }
        })?;
        AccountRepo::create(&mut *tx, user_id).await?;
        tx.commit().await?;

        info!(user_id, email, "registered user");
        UserRepo::get_by_id(&self.pool, user_id)
            .await
            .map_err(Into::into)
    }
}
