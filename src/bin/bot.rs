use anyhow::Result;
use dotenvy::dotenv;
use log::{debug, error, info, warn};
use serenity::async_trait;
use serenity::http::Http;
use serenity::model::application::interaction::message_component::MessageComponentInteraction;
use serenity::model::application::interaction::{Interaction, InteractionResponseType};
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use std::sync::Arc;

use quizlet_reminder::core::{Calendar, Config};
use quizlet_reminder::database::{Database, Store};
use quizlet_reminder::features::dialogue::DialogueEngine;
use quizlet_reminder::features::reminders::Ticker;
use quizlet_reminder::message_components::{route_custom_id, ComponentRoute, DiscordMessenger};
use quizlet_reminder::transport::{CallbackRef, EventKind, InboundEvent, MessageRef, Messenger};

struct Handler {
    engine: Arc<DialogueEngine>,
}

impl Handler {
    /// Turn a button press into an engine event. Menu presses are
    /// acknowledged here; confirmation presses are answered by the engine.
    async fn component_event(
        &self,
        ctx: &Context,
        component: &MessageComponentInteraction,
    ) -> InboundEvent {
        let user = component.user.id.0;
        let channel = component.channel_id.0;

        let kind = match route_custom_id(&component.data.custom_id) {
            ComponentRoute::Menu(label) => {
                if let Err(e) = component
                    .create_interaction_response(&ctx.http, |response| {
                        response.kind(InteractionResponseType::DeferredUpdateMessage)
                    })
                    .await
                {
                    warn!("Failed to acknowledge menu press '{label}': {e}");
                }
                EventKind::Text(label)
            }
            ComponentRoute::Payload(data) => EventKind::Callback {
                callback: CallbackRef {
                    id: component.id.0,
                    token: component.token.clone(),
                },
                data,
                message: MessageRef {
                    channel,
                    message_id: component.message.id.0,
                },
                message_text: component.message.content.clone(),
            },
        };

        InboundEvent {
            user,
            channel,
            kind,
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, _ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        // Conversations happen in direct messages only
        if msg.guild_id.is_some() {
            debug!("Ignoring guild message {} in channel {}", msg.id, msg.channel_id);
            return;
        }

        if msg.content.trim().is_empty() {
            return;
        }

        let event = InboundEvent::from_text(msg.author.id.0, msg.channel_id.0, &msg.content);
        if let Err(e) = self.engine.handle_event(event).await {
            error!("Error handling message from user {}: {e:#}", msg.author.id);
        }
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());
        info!("🤖 Bot ID: {}", ready.user.id);
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::MessageComponent(component) = interaction else {
            debug!("Ignoring non-component interaction");
            return;
        };

        let event = self.component_event(&ctx, &component).await;
        if let Err(e) = self.engine.handle_event(event).await {
            error!(
                "Error handling component interaction '{}': {e:#}",
                component.data.custom_id
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting Quizlet reminder bot...");

    let database = Database::new(&config.database_path).await?;
    let store: Arc<dyn Store> = Arc::new(database);
    let calendar = Calendar::system(config.timezone_offset_hours)?;
    info!(
        "📅 Calendar at UTC{:+}, today is {}",
        config.timezone_offset_hours,
        calendar.today()
    );

    let http = Arc::new(Http::new(&config.discord_token));
    let messenger: Arc<dyn Messenger> = Arc::new(DiscordMessenger::new(http));

    let ticker = Arc::new(Ticker::new(
        store.clone(),
        messenger.clone(),
        calendar.clone(),
        config.tick_hour_utc,
    ));

    let engine = DialogueEngine::new(store, messenger, calendar, config.password_salt.clone())
        .with_ticker(ticker.clone())
        .with_operators(config.operator_user_ids.clone());

    let handler = Handler {
        engine: Arc::new(engine),
    };

    let intents = GatewayIntents::DIRECT_MESSAGES | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            error!("This could indicate:");
            error!("  - Invalid bot token format");
            error!("  - Network issues reaching Discord API");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    info!("Bot configured successfully. Connecting to Discord gateway...");

    // Start the daily reminder cycle
    tokio::spawn(async move {
        ticker.run().await;
    });

    info!("Gateway intents: {intents:?}");

    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {why:?}");
        error!("This could be due to:");
        error!("  - Invalid bot token");
        error!("  - Network connectivity issues");
        error!("  - Discord API outage");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    Ok(())
}
