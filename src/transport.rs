//! # Messaging contract
//!
//! Transport-neutral shapes for inbound events and outbound messages, and the
//! [`Messenger`] trait the engine sends through. The Discord binding lives in
//! `message_components`.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

use anyhow::Result;
use async_trait::async_trait;

use crate::core::models::{ChannelId, UserId};

/// A message the bot has sent and may edit later
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub channel: ChannelId,
    pub message_id: u64,
}

/// Handle needed to answer a button press
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackRef {
    pub id: u64,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Free text, including menu-button presses (carrying the button label)
    Text(String),
    /// `/name args`
    Command { name: String, args: String },
    /// Inline button press with its opaque payload
    Callback {
        callback: CallbackRef,
        data: String,
        message: MessageRef,
        message_text: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub user: UserId,
    pub channel: ChannelId,
    pub kind: EventKind,
}

impl InboundEvent {
    /// Classify raw message text: a leading `/` makes it a command
    pub fn from_text(user: UserId, channel: ChannelId, content: &str) -> Self {
        let trimmed = content.trim();
        let kind = match trimmed.strip_prefix('/') {
            Some(rest) if !rest.is_empty() => {
                let (name, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                EventKind::Command {
                    name: name.to_lowercase(),
                    args: args.trim().to_string(),
                }
            }
            _ => EventKind::Text(trimmed.to_string()),
        };
        Self { user, channel, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    /// Pressing the button is the same as typing this text
    Reply(String),
    /// Pressing the button delivers this payload as a callback
    Callback(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: ButtonAction,
}

impl Button {
    pub fn reply(label: &str) -> Self {
        Self {
            label: label.to_string(),
            action: ButtonAction::Reply(label.to_string()),
        }
    }

    pub fn callback(label: &str, payload: String) -> Self {
        Self {
            label: label.to_string(),
            action: ButtonAction::Callback(payload),
        }
    }
}

/// Rows of buttons attached to a message
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new(rows: Vec<Vec<Button>>) -> Self {
        Self { rows }
    }

    pub fn labels(&self) -> Vec<&str> {
        self.rows
            .iter()
            .flatten()
            .map(|b| b.label.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub channel: ChannelId,
    pub text: String,
    pub keyboard: Option<Keyboard>,
    /// Render `text` as markdown; otherwise it is shown literally
    pub markdown: bool,
}

impl OutboundMessage {
    pub fn text(channel: ChannelId, text: impl Into<String>) -> Self {
        Self {
            channel,
            text: text.into(),
            keyboard: None,
            markdown: false,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    pub fn markdown(mut self) -> Self {
        self.markdown = true;
        self
    }
}

/// Outbound side of the chat transport
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, message: OutboundMessage) -> Result<MessageRef>;

    /// Replace a sent message's text, dropping its buttons
    async fn edit(&self, target: &MessageRef, text: &str) -> Result<()>;

    /// Acknowledge a button press with a short notice to the presser
    async fn answer_callback(&self, callback: &CallbackRef, text: &str) -> Result<()>;
}
