//! # Discord binding
//!
//! Implements [`Messenger`] over serenity's HTTP client and maps keyboards to
//! message-component buttons. Menu buttons carry `MENU:<label>` as their
//! custom id and come back as typed text; confirmation buttons carry their
//! payload verbatim and come back as callbacks.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use log::debug;
use serde_json::json;
use serenity::builder::CreateComponents;
use serenity::http::Http;
use serenity::model::application::component::ButtonStyle;
use serenity::model::id::{ChannelId as DiscordChannelId, MessageId};
use std::sync::Arc;

use crate::core::response::{chunk_for_message, escape_markdown};
use crate::transport::{ButtonAction, CallbackRef, Keyboard, MessageRef, Messenger, OutboundMessage};

/// Custom-id prefix of reply-keyboard buttons
pub const MENU_PREFIX: &str = "MENU:";

/// Discord allows at most five buttons per action row
const BUTTONS_PER_ROW: usize = 5;

/// Ephemeral reply to a component interaction
const CHANNEL_MESSAGE_WITH_SOURCE: u8 = 4;
const EPHEMERAL_FLAG: u64 = 1 << 6;

/// What a pressed button means to the dialogue engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentRoute {
    /// Same as typing the label
    Menu(String),
    /// Opaque payload for the callback handler
    Payload(String),
}

pub fn route_custom_id(custom_id: &str) -> ComponentRoute {
    match custom_id.strip_prefix(MENU_PREFIX) {
        Some(label) => ComponentRoute::Menu(label.to_string()),
        None => ComponentRoute::Payload(custom_id.to_string()),
    }
}

fn custom_id(action: &ButtonAction) -> String {
    match action {
        ButtonAction::Reply(text) => format!("{MENU_PREFIX}{text}"),
        ButtonAction::Callback(payload) => payload.clone(),
    }
}

/// Build action rows for a keyboard
pub fn keyboard_components(keyboard: &Keyboard) -> CreateComponents {
    let mut components = CreateComponents::default();

    for row in &keyboard.rows {
        for buttons in row.chunks(BUTTONS_PER_ROW) {
            components.create_action_row(|action_row| {
                for button in buttons {
                    let style = match button.action {
                        ButtonAction::Reply(_) => ButtonStyle::Secondary,
                        ButtonAction::Callback(_) => ButtonStyle::Success,
                    };
                    action_row.create_button(|btn| {
                        btn.custom_id(custom_id(&button.action))
                            .label(&button.label)
                            .style(style)
                    });
                }
                action_row
            });
        }
    }

    components
}

/// Sends through the bot's HTTP client
pub struct DiscordMessenger {
    http: Arc<Http>,
}

impl DiscordMessenger {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Messenger for DiscordMessenger {
    async fn send(&self, message: OutboundMessage) -> Result<MessageRef> {
        let content = if message.markdown {
            message.text
        } else {
            escape_markdown(&message.text)
        };

        let chunks = chunk_for_message(&content);
        let last = chunks.len().saturating_sub(1);
        let channel = DiscordChannelId(message.channel);
        let mut sent = None;

        for (index, chunk) in chunks.iter().enumerate() {
            let keyboard = message.keyboard.as_ref().filter(|_| index == last);
            let posted = channel
                .send_message(&self.http, |m| {
                    m.content(chunk);
                    if let Some(keyboard) = keyboard {
                        m.components(|c| {
                            *c = keyboard_components(keyboard);
                            c
                        });
                    }
                    m
                })
                .await
                .with_context(|| format!("Failed to send message to channel {}", message.channel))?;
            sent = Some(posted.id.0);
        }

        debug!(
            "📤 Sent {} message part(s) to channel {}",
            chunks.len(),
            message.channel
        );

        let message_id = sent.context("Nothing to send")?;
        Ok(MessageRef {
            channel: message.channel,
            message_id,
        })
    }

    async fn edit(&self, target: &MessageRef, text: &str) -> Result<()> {
        DiscordChannelId(target.channel)
            .edit_message(&self.http, MessageId(target.message_id), |m| {
                m.content(text).components(|c| c)
            })
            .await
            .with_context(|| format!("Failed to edit message {}", target.message_id))?;
        Ok(())
    }

    async fn answer_callback(&self, callback: &CallbackRef, text: &str) -> Result<()> {
        let response = json!({
            "type": CHANNEL_MESSAGE_WITH_SOURCE,
            "data": {
                "content": text,
                "flags": EPHEMERAL_FLAG,
            }
        });
        self.http
            .create_interaction_response(callback.id, &callback.token, &response)
            .await
            .context("Failed to answer button press")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Button;

    #[test]
    fn test_route_menu_button() {
        assert_eq!(
            route_custom_id("MENU:Добавить модуль"),
            ComponentRoute::Menu("Добавить модуль".to_string())
        );
    }

    #[test]
    fn test_route_payload_button() {
        assert_eq!(
            route_custom_id("SETOK:42.0"),
            ComponentRoute::Payload("SETOK:42.0".to_string())
        );
    }

    #[test]
    fn test_custom_ids() {
        assert_eq!(
            custom_id(&Button::reply("Покинуть группу").action),
            "MENU:Покинуть группу"
        );
        assert_eq!(
            custom_id(&Button::callback("Повторили!", "SETOK:1.2".to_string()).action),
            "SETOK:1.2"
        );
    }

    #[test]
    fn test_menu_custom_id_routes_back_to_its_label() {
        let button = Button::reply("Расписание повторений");
        assert_eq!(
            route_custom_id(&custom_id(&button.action)),
            ComponentRoute::Menu(button.label.clone())
        );
    }

    #[test]
    fn test_wide_rows_are_split() {
        let row: Vec<Button> = (0..7).map(|i| Button::reply(&format!("b{i}"))).collect();
        let components = keyboard_components(&Keyboard::new(vec![row]));
        assert_eq!(components.0.len(), 2);
    }
}
