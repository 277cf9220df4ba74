//! Registering modules and listing the repetition schedule.

use anyhow::Result;
use log::{info, warn};

use super::{texts, DialogueEngine, Turn};
use crate::core::models::{format_date, GroupId, Item};
use crate::core::response::escape_markdown;
use crate::core::validation::{
    is_valid_item_name, is_valid_url, parse_group_id, parse_module_sentence, ModuleSubmission,
};
use crate::features::reminders::schedule::initial_due_date;
use crate::features::session::{scratch, DialogueState};
use crate::transport::OutboundMessage;

impl DialogueEngine {
    pub(super) async fn begin_item(&self, turn: &Turn<'_>) -> Result<()> {
        if turn.memberships.is_empty() {
            return self.reply(turn, texts::NOT_IN_GROUP).await;
        }

        if turn.memberships.sole().is_some() {
            self.enter(turn, DialogueState::AwaitingItemUrl);
            return self.reply(turn, texts::ASK_ITEM_URL).await;
        }

        self.enter(turn, DialogueState::AwaitingGroupChoiceForItem);
        self.reply(
            turn,
            format!(
                "{}\n{}",
                texts::ASK_ITEM_GROUP,
                texts::your_groups(turn.memberships)
            ),
        )
        .await
    }

    pub(super) async fn receive_item_group_choice(&self, turn: &Turn<'_>, text: &str) -> Result<()> {
        let Some(group_id) = self.chosen_group(turn, text).await? else {
            return Ok(());
        };

        self.sessions
            .set_scratch(turn.user, scratch::ITEM_GROUP_ID, group_id.to_string());
        self.enter(turn, DialogueState::AwaitingItemUrl);
        self.reply(turn, texts::ASK_ITEM_URL_AFTER_GROUP).await
    }

    pub(super) async fn receive_item_url(&self, turn: &Turn<'_>, text: &str) -> Result<()> {
        let url = text.trim();
        if !is_valid_url(url) {
            return self.reply(turn, texts::BAD_URL).await;
        }

        self.sessions.set_scratch(turn.user, scratch::ITEM_URL, url);
        self.enter(turn, DialogueState::AwaitingItemName);
        self.reply(turn, texts::ASK_ITEM_NAME).await
    }

    pub(super) async fn receive_item_name(&self, turn: &Turn<'_>, text: &str) -> Result<()> {
        let name = text.trim();
        if !is_valid_item_name(name) {
            return self.reply(turn, texts::BAD_ITEM_NAME).await;
        }

        let Some(url) = self.sessions.scratch(turn.user, scratch::ITEM_URL) else {
            warn!("[{}] Item name without a stored URL", turn.request_id);
            return self.reply(turn, texts::FORGOT_URL).await;
        };

        let chosen = self
            .sessions
            .scratch(turn.user, scratch::ITEM_GROUP_ID)
            .and_then(|raw| raw.parse::<GroupId>().ok());
        let group_id = match chosen {
            Some(id) if turn.memberships.contains(id) => id,
            Some(id) => {
                self.finish(turn);
                return self.reply_with_menu(turn, texts::not_member_of(id)).await;
            }
            None => match turn.memberships.sole() {
                Some(group) => group.id,
                None => {
                    self.finish(turn);
                    return self.reply_with_menu(turn, texts::NOT_IN_GROUP).await;
                }
            },
        };

        self.create_item(turn, group_id, &url, name).await
    }

    /// `Я изучаю <name> на Quizlet: <url>` sent from idle
    pub(super) async fn submit_full(
        &self,
        turn: &Turn<'_>,
        raw: &str,
        submission: ModuleSubmission,
    ) -> Result<()> {
        if !is_valid_item_name(&submission.name) {
            return self.reply(turn, texts::BAD_ITEM_NAME).await;
        }

        if turn.memberships.is_empty() {
            return self.reply(turn, texts::NOT_IN_GROUP).await;
        }

        if let Some(group) = turn.memberships.sole() {
            return self
                .create_item(turn, group.id, &submission.url, &submission.name)
                .await;
        }

        self.sessions
            .set_scratch(turn.user, scratch::FULL_SUBMISSION, raw.trim());
        self.enter(turn, DialogueState::AwaitingGroupChoiceForFullSubmission);
        self.reply(
            turn,
            format!(
                "{}\n{}",
                texts::ASK_GROUP_FOR_SUBMISSION,
                texts::your_groups(turn.memberships)
            ),
        )
        .await
    }

    pub(super) async fn receive_submission_group_choice(
        &self,
        turn: &Turn<'_>,
        text: &str,
    ) -> Result<()> {
        let Some(group_id) = self.chosen_group(turn, text).await? else {
            return Ok(());
        };

        let Some(submission) = self
            .sessions
            .scratch(turn.user, scratch::FULL_SUBMISSION)
            .and_then(|raw| parse_module_sentence(&raw))
        else {
            warn!("[{}] Group chosen but the stored submission is gone", turn.request_id);
            return self.reply(turn, texts::LOST_CONTEXT).await;
        };

        self.create_item(turn, group_id, &submission.url, &submission.name)
            .await
    }

    /// Parse a typed group id and check the caller belongs to it.
    /// Replies and yields `None` when the choice is rejected.
    async fn chosen_group(&self, turn: &Turn<'_>, text: &str) -> Result<Option<GroupId>> {
        let Some(group_id) = parse_group_id(text) else {
            self.reply(turn, texts::BAD_GROUP_CHOICE).await?;
            return Ok(None);
        };

        if !turn.memberships.contains(group_id) {
            info!(
                "[{}] 🚫 User {} chose group {group_id} without membership",
                turn.request_id, turn.user
            );
            self.reply(turn, texts::not_member_of(group_id)).await?;
            return Ok(None);
        }

        Ok(Some(group_id))
    }

    async fn create_item(
        &self,
        turn: &Turn<'_>,
        group_id: GroupId,
        url: &str,
        name: &str,
    ) -> Result<()> {
        let next_due = initial_due_date(self.calendar.today());

        let item = match self.store.create_item(group_id, url, name, next_due).await {
            Ok(item) => item,
            Err(e) => {
                warn!(
                    "[{}] ❌ Failed to store item for group {group_id}: {e}",
                    turn.request_id
                );
                return self.reply(turn, texts::CREATE_ITEM_FAILED).await;
            }
        };

        info!(
            "[{}] ✅ User {} added item {} '{}' to group {group_id}, due {}",
            turn.request_id, turn.user, item.id, item.name, item.next_due
        );
        self.finish(turn);
        self.reply_with_menu(turn, texts::item_added(item.next_due))
            .await
    }

    pub(super) async fn show_schedule(&self, turn: &Turn<'_>) -> Result<()> {
        if turn.memberships.is_empty() {
            return self.reply(turn, texts::NOT_IN_GROUP).await;
        }

        let mut sections = Vec::with_capacity(turn.memberships.len());
        for group in turn.memberships.groups() {
            let body = match self.store.get_items_by_group(group.id).await {
                Ok(items) if items.is_empty() => texts::SCHEDULE_EMPTY.to_string(),
                Ok(items) => schedule_lines(&items),
                Err(e) => {
                    warn!(
                        "[{}] Failed to load items of group {}: {e}",
                        turn.request_id, group.id
                    );
                    texts::SCHEDULE_FAILED.to_string()
                }
            };
            sections.push(format!("{}\n{body}", texts::schedule_header(group.id)));
        }

        self.messenger
            .send(OutboundMessage::text(turn.channel, sections.join("\n\n")).markdown())
            .await?;
        Ok(())
    }
}

/// `n. (dd.mm.yyyy) name` plus a link line per item
fn schedule_lines(items: &[Item]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            format!(
                "{}. ({}) {}\nСсылка на модуль: [тыц](<{}>)",
                index + 1,
                format_date(item.next_due),
                escape_markdown(&item.name),
                item.url
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
