//! "Repeated!" button presses.
//!
//! The payload carries the counter the reminder was composed at. The store
//! only advances an item whose counter still matches, so a stale or repeated
//! press changes nothing and is still acknowledged as done.

use anyhow::Result;
use log::{info, warn};
use uuid::Uuid;

use super::{texts, DialogueEngine};
use crate::features::reminders::schedule::{next_due_date, Confirmation};
use crate::transport::{CallbackRef, MessageRef};

impl DialogueEngine {
    pub(super) async fn handle_confirmation(
        &self,
        request_id: Uuid,
        callback: &CallbackRef,
        data: &str,
        message: &MessageRef,
        message_text: &str,
    ) -> Result<()> {
        let Some(confirmation) = Confirmation::parse(data) else {
            warn!("[{request_id}] ⚠️ Malformed confirmation payload: '{data}'");
            return self
                .messenger
                .answer_callback(callback, texts::UNKNOWN_BUTTON)
                .await;
        };

        let new_due = next_due_date(self.calendar.today(), confirmation.counter);
        match self
            .store
            .advance_if_counter(confirmation.item_id, confirmation.counter, new_due)
            .await
        {
            Ok(true) => info!(
                "[{request_id}] ✅ Item {} advanced past counter {}",
                confirmation.item_id, confirmation.counter
            ),
            Ok(false) => warn!(
                "[{request_id}] 🔁 Stale confirmation for item {} at counter {}",
                confirmation.item_id, confirmation.counter
            ),
            Err(e) => {
                warn!(
                    "[{request_id}] ❌ Failed to advance item {}: {e}",
                    confirmation.item_id
                );
                return self
                    .messenger
                    .answer_callback(callback, texts::CONFIRM_FAILED)
                    .await;
            }
        }

        self.messenger
            .answer_callback(callback, texts::CONFIRMED)
            .await?;

        let edited = format!("{message_text}{}", texts::CONFIRMED_SUFFIX);
        if let Err(e) = self.messenger.edit(message, &edited).await {
            warn!(
                "[{request_id}] ⚠️ Failed to mark message {} as done: {e}",
                message.message_id
            );
        }
        Ok(())
    }
}
