//! Creating, joining and leaving groups.

use anyhow::Result;
use log::{info, warn};

use super::{menu, texts, DialogueEngine, Turn};
use crate::core::models::{hash_password, GroupId};
use crate::core::validation::{is_valid_password, parse_group_id};
use crate::features::session::{scratch, DialogueState};

impl DialogueEngine {
    pub(super) async fn begin_create_group(&self, turn: &Turn<'_>) -> Result<()> {
        if !turn.memberships.is_empty() {
            self.reply(turn, texts::already_member(turn.memberships))
                .await?;
        }
        self.enter(turn, DialogueState::AwaitingGroupPassword);
        self.reply(turn, texts::ASK_NEW_PASSWORD).await
    }

    pub(super) async fn receive_new_password(&self, turn: &Turn<'_>, password: &str) -> Result<()> {
        if !is_valid_password(password) {
            return self.reply(turn, texts::BAD_NEW_PASSWORD).await;
        }

        let hash = hash_password(password, &self.password_salt);
        let group = match self.store.create_group(&hash).await {
            Ok(group) => group,
            Err(e) => {
                warn!("[{}] ❌ Failed to create group: {e}", turn.request_id);
                return self.reply(turn, texts::CREATE_GROUP_FAILED).await;
            }
        };

        // A failure here leaves the new group without members
        if let Err(e) = self.store.add_user_to_group(turn.user, group.id).await {
            warn!(
                "[{}] ❌ Group {} created but adding user {} failed: {e}",
                turn.request_id, group.id, turn.user
            );
            return self.reply(turn, texts::CREATE_GROUP_FAILED).await;
        }

        info!(
            "[{}] ✅ User {} created group {}",
            turn.request_id, turn.user, group.id
        );
        self.finish(turn);
        self.reply_with_keyboard(turn, texts::group_created(group.id), menu::keyboard_for(1))
            .await
    }

    pub(super) async fn begin_join(&self, turn: &Turn<'_>) -> Result<()> {
        if !turn.memberships.is_empty() {
            self.reply(turn, texts::already_member(turn.memberships))
                .await?;
        }
        self.enter(turn, DialogueState::AwaitingGroupIdToJoin);
        self.reply(turn, texts::ASK_GROUP_ID_TO_JOIN).await
    }

    pub(super) async fn receive_join_group_id(&self, turn: &Turn<'_>, text: &str) -> Result<()> {
        let Some(group_id) = parse_group_id(text) else {
            return self.reply(turn, texts::NOT_A_NUMBER).await;
        };

        match self.store.get_group(group_id).await {
            Ok(Some(_)) => {
                self.sessions
                    .set_scratch(turn.user, scratch::JOIN_GROUP_ID, group_id.to_string());
                self.enter(turn, DialogueState::AwaitingJoinPassword);
                self.reply(turn, texts::ASK_JOIN_PASSWORD).await
            }
            Ok(None) => self.reply(turn, texts::NO_SUCH_GROUP).await,
            Err(e) => {
                warn!("[{}] ❌ Failed to look up group {group_id}: {e}", turn.request_id);
                self.reply(turn, texts::GROUP_LOOKUP_FAILED).await
            }
        }
    }

    pub(super) async fn receive_join_password(&self, turn: &Turn<'_>, password: &str) -> Result<()> {
        let Some(group_id) = self
            .sessions
            .scratch(turn.user, scratch::JOIN_GROUP_ID)
            .and_then(|raw| raw.parse::<GroupId>().ok())
        else {
            warn!("[{}] Join password without a pending group", turn.request_id);
            return self.reply(turn, texts::LOST_CONTEXT).await;
        };

        if !is_valid_password(password) {
            return self.reply(turn, texts::BAD_PASSWORD_FORMAT).await;
        }

        // The group may have changed since the id was accepted
        let group = match self.store.get_group(group_id).await {
            Ok(Some(group)) => group,
            Ok(None) => return self.reply(turn, texts::GROUP_VANISHED).await,
            Err(e) => {
                warn!("[{}] ❌ Failed to re-fetch group {group_id}: {e}", turn.request_id);
                return self.reply(turn, texts::GROUP_LOOKUP_FAILED).await;
            }
        };

        if !group.verify_password(password, &self.password_salt) {
            info!(
                "[{}] 🔒 Wrong password from user {} for group {group_id}",
                turn.request_id, turn.user
            );
            return self.reply(turn, texts::WRONG_PASSWORD).await;
        }

        if let Err(e) = self.store.add_user_to_group(turn.user, group_id).await {
            warn!("[{}] ❌ Failed to add user to group {group_id}: {e}", turn.request_id);
            return self.reply(turn, texts::JOIN_FAILED).await;
        }

        info!(
            "[{}] ✅ User {} joined group {group_id}",
            turn.request_id, turn.user
        );
        self.finish(turn);
        self.reply_with_keyboard(turn, texts::joined(group_id), menu::keyboard_for(1))
            .await
    }

    pub(super) async fn begin_leave(&self, turn: &Turn<'_>) -> Result<()> {
        if let Some(group) = turn.memberships.sole() {
            return self.leave(turn, group.id).await;
        }

        if turn.memberships.is_empty() {
            return self.reply(turn, texts::NOT_IN_ANY_GROUP).await;
        }

        self.enter(turn, DialogueState::AwaitingGroupChoiceToLeave);
        self.reply(
            turn,
            format!(
                "{}\n{}",
                texts::your_groups(turn.memberships),
                texts::ASK_GROUP_TO_LEAVE
            ),
        )
        .await
    }

    pub(super) async fn receive_leave_group_choice(&self, turn: &Turn<'_>, text: &str) -> Result<()> {
        let Some(group_id) = parse_group_id(text) else {
            return self.reply(turn, texts::BAD_GROUP_CHOICE).await;
        };
        if !turn.memberships.contains(group_id) {
            return self.reply(turn, texts::not_member_of(group_id)).await;
        }
        self.leave(turn, group_id).await
    }

    async fn leave(&self, turn: &Turn<'_>, group_id: GroupId) -> Result<()> {
        if let Err(e) = self.store.remove_user_from_group(turn.user, group_id).await {
            warn!("[{}] ❌ Failed to leave group {group_id}: {e}", turn.request_id);
            return self.reply(turn, texts::LEAVE_FAILED).await;
        }

        info!(
            "[{}] 👋 User {} left group {group_id}",
            turn.request_id, turn.user
        );
        self.finish(turn);
        let remaining = turn.memberships.len().saturating_sub(1);
        self.reply_with_keyboard(turn, texts::left(group_id), menu::keyboard_for(remaining))
            .await
    }
}
