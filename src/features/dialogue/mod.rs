//! # Feature: Dialogue
//!
//! The conversation state machine. Every inbound event is handled under the
//! sender's turn lock: memberships are resolved, then the event is routed by
//! kind (command, free text, button callback) and by the sender's session
//! state. Persistence failures become retry replies and never move the
//! state; only a failure to send a reply is returned as an error.
//!
//! - **Version**: 1.2.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: One-message module submission and multi-group choice prompts
//! - 1.1.0: Confirmation callbacks with counter fencing
//! - 1.0.0: Group creation, joining, leaving and guided module creation

pub mod commands;
pub mod menu;
pub mod texts;

mod confirm;
mod groups;
mod items;


use anyhow::Result;
use log::{debug, info, warn};
use std::sync::Arc;
use uuid::Uuid;

use self::commands::Command;
use self::menu::MenuAction;
use crate::core::clock::Calendar;
use crate::core::models::{ChannelId, Memberships, UserId};
use crate::core::validation::parse_module_sentence;
use crate::database::Store;
use crate::features::reminders::{CycleTrigger, Ticker};
use crate::features::session::{DialogueState, SessionStore};
use crate::transport::{EventKind, InboundEvent, Keyboard, Messenger, OutboundMessage};

/// Who is talking and what they belong to, for the duration of one event
pub(crate) struct Turn<'a> {
    pub request_id: Uuid,
    pub user: UserId,
    pub channel: ChannelId,
    pub memberships: &'a Memberships,
}

pub struct DialogueEngine {
    store: Arc<dyn Store>,
    messenger: Arc<dyn Messenger>,
    sessions: SessionStore,
    calendar: Calendar,
    ticker: Option<Arc<Ticker>>,
    operators: Vec<UserId>,
    password_salt: String,
}

impl DialogueEngine {
    pub fn new(
        store: Arc<dyn Store>,
        messenger: Arc<dyn Messenger>,
        calendar: Calendar,
        password_salt: impl Into<String>,
    ) -> Self {
        Self {
            store,
            messenger,
            sessions: SessionStore::new(),
            calendar,
            ticker: None,
            operators: Vec::new(),
            password_salt: password_salt.into(),
        }
    }

    /// Enable `/tick` against this ticker
    pub fn with_ticker(mut self, ticker: Arc<Ticker>) -> Self {
        self.ticker = Some(ticker);
        self
    }

    /// Restrict `/tick` to these users; empty allows everyone
    pub fn with_operators(mut self, operators: Vec<UserId>) -> Self {
        self.operators = operators;
        self
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handle one inbound event to completion
    pub async fn handle_event(&self, event: InboundEvent) -> Result<()> {
        let _turn = self.sessions.begin_turn(event.user).await;
        let request_id = Uuid::new_v4();
        let InboundEvent {
            user,
            channel,
            kind,
        } = event;

        debug!(
            "[{request_id}] 📥 Event from user {user} in channel {channel} | State: {:?}",
            self.sessions.state(user)
        );

        if let Err(e) = self.store.bind_channel(user, channel).await {
            warn!("[{request_id}] ⚠️ Failed to bind channel {channel} for user {user}: {e}");
        }

        let kind = match kind {
            EventKind::Callback {
                callback,
                data,
                message,
                message_text,
            } => {
                return self
                    .handle_confirmation(request_id, &callback, &data, &message, &message_text)
                    .await;
            }
            other => other,
        };

        let memberships = match self.store.get_user_groups(user).await {
            Ok(groups) => Memberships::new(groups),
            Err(e) => {
                warn!("[{request_id}] ❌ Failed to resolve memberships for user {user}: {e}");
                return self
                    .messenger
                    .send(OutboundMessage::text(channel, texts::TRY_AGAIN))
                    .await
                    .map(|_| ());
            }
        };

        let turn = Turn {
            request_id,
            user,
            channel,
            memberships: &memberships,
        };

        match kind {
            EventKind::Command { name, args } => {
                info!("[{request_id}] 🎯 Command /{name} from user {user}");
                self.handle_command(&turn, Command::parse(&name), &args).await
            }
            EventKind::Text(text) => self.handle_text(&turn, &text).await,
            EventKind::Callback { .. } => Ok(()),
        }
    }

    async fn handle_command(&self, turn: &Turn<'_>, command: Command, args: &str) -> Result<()> {
        if !args.is_empty() {
            debug!("[{}] Ignoring command arguments: '{args}'", turn.request_id);
        }

        match command {
            Command::Start => self.start(turn).await,
            Command::Help => self.reply(turn, texts::HELP).await,
            Command::Cancel => {
                self.sessions.reset(turn.user);
                self.reply_with_menu(turn, texts::CANCELLED).await
            }
            Command::Quit => self.begin_leave(turn).await,
            Command::Items => self.show_schedule(turn).await,
            Command::CreateItem => self.begin_item(turn).await,
            Command::Tick => self.manual_tick(turn).await,
            Command::Time => self.report_time(turn).await,
            Command::Unknown => self.reply(turn, texts::NOT_UNDERSTOOD).await,
        }
    }

    async fn handle_text(&self, turn: &Turn<'_>, text: &str) -> Result<()> {
        let state = self.sessions.state(turn.user);
        debug!("[{}] 💬 Text in state {state:?}", turn.request_id);

        match state {
            DialogueState::Idle => self.handle_idle_text(turn, text).await,
            DialogueState::AwaitingGroupPassword => self.receive_new_password(turn, text).await,
            DialogueState::AwaitingGroupIdToJoin => self.receive_join_group_id(turn, text).await,
            DialogueState::AwaitingJoinPassword => self.receive_join_password(turn, text).await,
            DialogueState::AwaitingItemUrl => self.receive_item_url(turn, text).await,
            DialogueState::AwaitingItemName => self.receive_item_name(turn, text).await,
            DialogueState::AwaitingGroupChoiceForItem => {
                self.receive_item_group_choice(turn, text).await
            }
            DialogueState::AwaitingGroupChoiceForFullSubmission => {
                self.receive_submission_group_choice(turn, text).await
            }
            DialogueState::AwaitingGroupChoiceToLeave => {
                self.receive_leave_group_choice(turn, text).await
            }
        }
    }

    async fn handle_idle_text(&self, turn: &Turn<'_>, text: &str) -> Result<()> {
        if let Some(action) = MenuAction::from_label(text) {
            debug!("[{}] 📋 Menu: {}", turn.request_id, action.label());
            return match action {
                MenuAction::CreateGroup => self.begin_create_group(turn).await,
                MenuAction::JoinGroup => self.begin_join(turn).await,
                MenuAction::AddModule => self.begin_item(turn).await,
                MenuAction::Schedule => self.show_schedule(turn).await,
                MenuAction::LeaveGroup => self.begin_leave(turn).await,
            };
        }

        if let Some(submission) = parse_module_sentence(text) {
            return self.submit_full(turn, text, submission).await;
        }

        self.reply(turn, texts::NOT_UNDERSTOOD).await
    }

    async fn start(&self, turn: &Turn<'_>) -> Result<()> {
        let text = if turn.memberships.is_empty() {
            texts::START_NEWCOMER.to_string()
        } else {
            texts::welcome_back(turn.memberships)
        };
        self.reply_with_menu(turn, text).await
    }

    async fn manual_tick(&self, turn: &Turn<'_>) -> Result<()> {
        if !self.operators.is_empty() && !self.operators.contains(&turn.user) {
            warn!(
                "[{}] 🚫 User {} is not allowed to run a cycle",
                turn.request_id, turn.user
            );
            return self.reply(turn, texts::OPERATORS_ONLY).await;
        }

        let Some(ticker) = &self.ticker else {
            return self.reply(turn, texts::TICKER_OFFLINE).await;
        };

        match ticker.run_cycle(CycleTrigger::Manual).await {
            Ok(report) => {
                let text = texts::tick_done(
                    report.items_due,
                    report.notify.reminders_sent,
                    report.notify.failed_sends,
                );
                self.reply(turn, text).await
            }
            Err(e) => {
                warn!("[{}] ❌ Manual cycle failed: {e:#}", turn.request_id);
                self.reply(turn, texts::TICK_FAILED).await
            }
        }
    }

    async fn report_time(&self, turn: &Turn<'_>) -> Result<()> {
        let app_time = self.calendar.now().format("%d.%m.%Y %H:%M:%S %:z").to_string();
        let database_time = match self.store.database_date().await {
            Ok(date) => date,
            Err(e) => {
                warn!("[{}] Failed to read database date: {e}", turn.request_id);
                texts::UNAVAILABLE.to_string()
            }
        };
        self.reply(turn, texts::time_report(&app_time, &database_time))
            .await
    }

    /// Plain reply without a keyboard
    async fn reply(&self, turn: &Turn<'_>, text: impl Into<String>) -> Result<()> {
        self.messenger
            .send(OutboundMessage::text(turn.channel, text))
            .await?;
        Ok(())
    }

    /// Reply carrying the menu for the caller's current memberships
    async fn reply_with_menu(&self, turn: &Turn<'_>, text: impl Into<String>) -> Result<()> {
        self.reply_with_keyboard(turn, text, menu::keyboard_for(turn.memberships.len()))
            .await
    }

    async fn reply_with_keyboard(
        &self,
        turn: &Turn<'_>,
        text: impl Into<String>,
        keyboard: Keyboard,
    ) -> Result<()> {
        self.messenger
            .send(OutboundMessage::text(turn.channel, text).with_keyboard(keyboard))
            .await?;
        Ok(())
    }

    /// Finish a flow: back to idle, scratch dropped
    fn finish(&self, turn: &Turn<'_>) {
        self.sessions.reset(turn.user);
        debug!("[{}] ↩️ User {} back to idle", turn.request_id, turn.user);
    }

    fn enter(&self, turn: &Turn<'_>, state: DialogueState) {
        self.sessions.set_state(turn.user, state);
        debug!("[{}] ➡️ User {} now {state:?}", turn.request_id, turn.user);
    }
}
