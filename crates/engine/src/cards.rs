//! Bank cards - withdrawal destination references
//!
//! A card never holds funds; it only names where a bank withdrawal goes.
//! Card numbers are unique across the whole system so one card cannot be
//! attached to two identities.

use cexbank_persistence::{BankAccountRepo, BankAccountRow};
use tracing::info;

use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};

impl Engine {
    /// Bind a bank card to the user.
    pub async fn add_card(
        &self,
        user_id: i64,
        holder_name: &str,
        bank_name: &str,
        card_number: &str,
    ) -> EngineResult<BankAccountRow> {
        let holder_name = holder_name.trim();
        let bank_name = bank_name.trim();
        let card_number = card_number.trim();

        if holder_name.is_empty() || bank_name.is_empty() {
            return Err(EngineError::validation(
                "holder name and bank name must not be empty",
            ));
        }
        if card_number.len() < 8 || !card_number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(EngineError::validation(format!(
                "malformed card number: {card_number:?}"
            )));
        }

        let user = self.user(user_id).await?;
        Self::require_active(&user)?;

        if BankAccountRepo::get_by_card_number(&self.pool, card_number)
            .await?
            .is_some()
        {
            return Err(EngineError::duplicate("card number", card_number));
        }

        let id = BankAccountRepo::insert(&self.pool, user_id, holder_name, bank_name, card_number)
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    EngineError::duplicate("card number", card_number)
                } else {
                    EngineError::from(e)
                }
            })?;

        info!(user_id, card_id = id, bank_name, "bank card added");
        BankAccountRepo::get_by_id(&self.pool, id)
            .await
            .map_err(Into::into)
    }

    /// All cards bound to the user.
    pub async fn list_cards(&self, user_id: i64) -> EngineResult<Vec<BankAccountRow>> {
        self.user(user_id).await?;
        BankAccountRepo::list_by_user(&self.pool, user_id)
            .await
            .map_err(Into::into)
    }
}
