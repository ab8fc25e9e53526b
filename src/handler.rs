// handler.rs - Gateway event handler
// Converts serenity events into router calls. Shards share one handler and
// therefore one router.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serenity::async_trait;
use serenity::client::{Context as GatewayContext, EventHandler};
use serenity::model::channel::{Message, Reaction};
use serenity::model::gateway::Ready;

use crate::model::{ChannelId, GuildId, InboundMessage, MessageId, ReactionEvent};
use crate::router::{Dispatch, Router};
use crate::serenity_backend::SerenityBackend;

pub struct Handler {
    router: Arc<Router>,
    backend: Arc<SerenityBackend>,
    /// `None` disables slash sync
    sync_guilds: Option<Vec<GuildId>>,
    synced: AtomicBool,
}

impl Handler {
    pub fn new(router: Arc<Router>, backend: Arc<SerenityBackend>, sync_guilds: Option<Vec<GuildId>>) -> Self {
        Handler {
            router,
            backend,
            sync_guilds,
            synced: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: GatewayContext, ready: Ready) {
        self.backend.attach_cache(ctx.cache.clone());
        self.router.set_bot_user(ready.user.id);
        println!("✅ Bot connected as {}!", ready.user.name);
        log::info!("[HANDLER] Shard {:?} ready in {} guilds", ready.shard, ready.guilds.len());

        // every shard fires ready, only the first one syncs
        if let Some(guilds) = &self.sync_guilds {
            if !self.synced.swap(true, Ordering::SeqCst) {
                match self.router.sync_commands(guilds).await {
                    Ok(()) => println!("✅ Slash commands synced"),
                    Err(e) => log::error!("❌ Slash command sync failed: {}", e),
                }
            }
        }
    }

    async fn message(&self, _ctx: GatewayContext, msg: Message) {
        let inbound = InboundMessage::from(&msg);
        match self.router.handle_message(&inbound).await {
            Ok(Dispatch::UnknownCommand(name)) => {
                log::debug!("[HANDLER] Unrecognized command '{}' from {} ({})", name, msg.author.name, msg.author.id.0);
            }
            Ok(_) => {}
            Err(e) if e.is_not_a_command() => {}
            Err(e) => log::warn!("[HANDLER] Couldn't build context for message {}: {}", msg.id.0, e),
        }
    }

    async fn reaction_add(&self, _ctx: GatewayContext, reaction: Reaction) {
        if let Some(event) = ReactionEvent::from_reaction(&reaction) {
            self.router.on_reaction_added(&event).await;
        }
    }

    async fn reaction_remove(&self, _ctx: GatewayContext, reaction: Reaction) {
        if let Some(event) = ReactionEvent::from_reaction(&reaction) {
            self.router.on_reaction_removed(&event).await;
        }
    }

    async fn message_delete(
        &self,
        _ctx: GatewayContext,
        _channel_id: ChannelId,
        deleted_message_id: MessageId,
        _guild_id: Option<GuildId>,
    ) {
        let removed = self.router.on_message_deleted(deleted_message_id).await;
        if removed > 0 {
            log::debug!("[HANDLER] Dropped {} subscriptions for deleted message {}", removed, deleted_message_id.0);
        }
    }

    async fn message_delete_bulk(
        &self,
        _ctx: GatewayContext,
        _channel_id: ChannelId,
        multiple_deleted_messages_ids: Vec<MessageId>,
        _guild_id: Option<GuildId>,
    ) {
        self.router.on_messages_deleted(&multiple_deleted_messages_ids).await;
    }
}
