// reactions.rs - Reaction subscriptions
// Lets a command react to future reactions on a message it sent. Each
// (message, emoji) pair holds at most one subscription; registering again
// replaces it.
//
// All operations share one mutex. A matching event spawns the callback while
// the lock is held and the lock is released right after, so callbacks never
// run under it and may subscribe or unsubscribe themselves.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use once_cell::sync::OnceCell;
use serenity::model::permissions::Permissions;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::context::Context;
use crate::error::CommandResult;
use crate::model::{EmojiKey, GuildId, MessageId, ReactionEvent, UserId};
use crate::platform::ChatApi;

/// Async body run when a subscription triggers
pub type ReactionCallback = Arc<dyn Fn(Arc<Context>) -> BoxFuture<'static, CommandResult> + Send + Sync>;

/// Wraps an async function so it can be used as a reaction callback
pub fn callback<F, Fut>(f: F) -> ReactionCallback
where
    F: Fn(Arc<Context>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CommandResult> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

/// Trigger and cleanup policy of a subscription
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscriptionOptions {
    /// Remove the subscription after its first trigger
    pub delete_on_trigger: bool,
    /// Remove the user's reaction from the message when triggered
    pub delete_reaction: bool,
    /// Also trigger when the user removes their reaction
    pub respond_to_removal: bool,
    /// Drop the subscription after this long even if it never triggered
    pub timeout: Option<Duration>,
}

impl SubscriptionOptions {
    pub fn one_shot() -> Self {
        SubscriptionOptions {
            delete_on_trigger: true,
            ..Default::default()
        }
    }

    pub fn persistent() -> Self {
        Self::default()
    }

    pub fn delete_reaction(mut self) -> Self {
        self.delete_reaction = true;
        self
    }

    pub fn respond_to_removal(mut self) -> Self {
        self.respond_to_removal = true;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ReactionKey {
    message: MessageId,
    emoji: EmojiKey,
}

struct Subscription {
    user: UserId,
    ctx: Arc<Context>,
    callback: ReactionCallback,
    options: SubscriptionOptions,
    // distinguishes this entry from a later one under the same key
    generation: u64,
}

impl Subscription {
    fn dispatch(&self, key: &ReactionKey) -> JoinHandle<()> {
        let fut = (self.callback)(self.ctx.clone());
        let emoji = key.emoji.clone();
        let message = key.message;
        tokio::spawn(async move {
            if let Err(e) = fut.await {
                log::error!("[REACTIONS] Callback for {} on message {} failed: {}", emoji, message.0, e);
            }
        })
    }
}

type SubscriptionMap = HashMap<ReactionKey, Subscription>;

pub struct ReactionRegistry {
    subscriptions: Arc<Mutex<SubscriptionMap>>,
    api: Arc<dyn ChatApi>,
    bot: OnceCell<UserId>,
    generation: AtomicU64,
}

impl ReactionRegistry {
    pub fn new(api: Arc<dyn ChatApi>) -> Self {
        ReactionRegistry {
            subscriptions: Arc::new(Mutex::new(HashMap::new())),
            api,
            bot: OnceCell::new(),
            generation: AtomicU64::new(0),
        }
    }

    /// The bot's own reactions are never stripped
    pub fn set_bot_user(&self, bot: UserId) {
        let _ = self.bot.set(bot);
    }

    /// Registers `callback` for `user` reacting with `emoji` on `message`,
    /// replacing any existing subscription for that pair.
    pub async fn subscribe(
        &self,
        message: MessageId,
        emoji: impl Into<EmojiKey>,
        user: UserId,
        ctx: Arc<Context>,
        options: SubscriptionOptions,
        callback: ReactionCallback,
    ) {
        let key = ReactionKey {
            message,
            emoji: emoji.into(),
        };
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);

        self.subscriptions.lock().await.insert(
            key.clone(),
            Subscription {
                user,
                ctx,
                callback,
                options,
                generation,
            },
        );

        if let Some(timeout) = options.timeout {
            let subscriptions = Arc::clone(&self.subscriptions);
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                let mut subscriptions = subscriptions.lock().await;
                if subscriptions.get(&key).map_or(false, |s| s.generation == generation) {
                    subscriptions.remove(&key);
                    log::debug!("[REACTIONS] Subscription for {} on message {} timed out", key.emoji, key.message.0);
                }
            });
        }
    }

    /// Handles a reaction being added. Returns the spawned callback, if any.
    pub async fn on_reaction_added(&self, event: &ReactionEvent) -> Option<JoinHandle<()>> {
        let key = ReactionKey {
            message: event.message_id,
            emoji: event.emoji.clone(),
        };

        let (handle, strip_in) = {
            let mut subscriptions = self.subscriptions.lock().await;
            let sub = subscriptions.get(&key)?;
            if sub.user != event.user_id {
                return None;
            }

            let strip_in = event
                .guild_id
                .filter(|_| sub.options.delete_reaction && self.bot.get() != Some(&event.user_id));
            let one_shot = sub.options.delete_on_trigger;
            let handle = sub.dispatch(&key);
            if one_shot {
                subscriptions.remove(&key);
            }
            (handle, strip_in)
        };

        if let Some(guild) = strip_in {
            self.strip_reaction(event, guild).await;
        }

        Some(handle)
    }

    /// Handles a reaction being removed. Only subscriptions that respond to
    /// removal trigger, and the reaction is never stripped.
    pub async fn on_reaction_removed(&self, event: &ReactionEvent) -> Option<JoinHandle<()>> {
        let key = ReactionKey {
            message: event.message_id,
            emoji: event.emoji.clone(),
        };

        let mut subscriptions = self.subscriptions.lock().await;
        let sub = subscriptions.get(&key)?;
        if !sub.options.respond_to_removal || sub.user != event.user_id {
            return None;
        }

        let one_shot = sub.options.delete_on_trigger;
        let handle = sub.dispatch(&key);
        if one_shot {
            subscriptions.remove(&key);
        }
        Some(handle)
    }

    /// Drops every subscription on a deleted message
    pub async fn on_message_deleted(&self, message: MessageId) -> usize {
        self.delete_for_message(message).await
    }

    /// Removes all subscriptions for `message`, whatever the emoji. Returns how many were removed.
    pub async fn delete_for_message(&self, message: MessageId) -> usize {
        let mut subscriptions = self.subscriptions.lock().await;
        let before = subscriptions.len();
        subscriptions.retain(|key, _| key.message != message);
        before - subscriptions.len()
    }

    pub async fn contains(&self, message: MessageId, emoji: impl Into<EmojiKey>) -> bool {
        let key = ReactionKey {
            message,
            emoji: emoji.into(),
        };
        self.subscriptions.lock().await.contains_key(&key)
    }

    pub async fn len(&self) -> usize {
        self.subscriptions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    // Failures here are only logged: the subscription has already triggered.
    async fn strip_reaction(&self, event: &ReactionEvent, guild: GuildId) {
        match self.api.bot_permissions(event.channel_id, guild).await {
            Ok(perms) if perms.contains(Permissions::MANAGE_MESSAGES) => {
                if let Err(e) = self
                    .api
                    .delete_user_reaction(event.channel_id, event.message_id, event.user_id, &event.emoji)
                    .await
                {
                    log::warn!("[REACTIONS] Failed to remove reaction {} on message {}: {}", event.emoji, event.message_id.0, e);
                }
            }
            Ok(_) => {
                log::debug!("[REACTIONS] Missing Manage Messages in channel {}, leaving reaction", event.channel_id.0);
            }
            Err(e) => {
                log::debug!("[REACTIONS] Couldn't check permissions in channel {}: {}", event.channel_id.0, e);
            }
        }
    }
}
