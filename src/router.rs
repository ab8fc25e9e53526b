// router.rs - The command router
// One router per process. It owns the command registry, reaction registry
// and cooldown gate, and is the entry point for every shard's events.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use tokio::task::JoinHandle;

use crate::command::Command;
use crate::config::BotConfig;
use crate::context::{skip_first_word, Context, Services};
use crate::cooldown::{CooldownGate, CooldownStatus, DEFAULT_CAPACITY};
use crate::error::{ApiError, ContextError};
use crate::model::{EmojiKey, GuildId, InboundMessage, MessageId, ReactionEvent, UserId};
use crate::platform::{ChatApi, CommandDeclaration, CommandScope, DataProvider, MentionPolicy};
use crate::prefix::{DefaultPrefixer, Prefixer};
use crate::reactions::{ReactionCallback, ReactionRegistry, SubscriptionOptions};
use crate::registry::CommandRegistry;

/// Returns true for contexts that must not run any command
pub type BlacklistFn = Arc<dyn Fn(&Context) -> bool + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    OwnerOnly,
    GuildOnly,
}

/// What the router did with a message
#[derive(Debug)]
pub enum Dispatch {
    /// Sent by a bot
    Ignored,
    Blacklisted,
    UnknownCommand(String),
    Denied(DenyReason),
    OnCooldown(Duration),
    /// The command body is running on its own task
    Dispatched(JoinHandle<()>),
}

pub struct Router {
    owners: Vec<UserId>,

    commands: Arc<CommandRegistry>,
    reactions: Arc<ReactionRegistry>,
    cooldowns: CooldownGate,

    default_prefixer: Arc<DefaultPrefixer>,
    prefixer: Arc<dyn Prefixer>,

    api: Arc<dyn ChatApi>,
    provider: Arc<dyn DataProvider>,

    bot: OnceCell<UserId>,
    blacklist: Option<BlacklistFn>,
    react_timeout: Option<Duration>,
    embed_colour: u32,
    default_mentions: MentionPolicy,
}

impl Router {
    pub fn new<I, S>(api: Arc<dyn ChatApi>, provider: Arc<dyn DataProvider>, owners: Vec<UserId>, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let default_prefixer = Arc::new(DefaultPrefixer::new(prefixes));
        Router {
            owners,
            commands: Arc::new(CommandRegistry::new()),
            reactions: Arc::new(ReactionRegistry::new(api.clone())),
            cooldowns: CooldownGate::new(DEFAULT_CAPACITY),
            prefixer: default_prefixer.clone(),
            default_prefixer,
            api,
            provider,
            bot: OnceCell::new(),
            blacklist: None,
            react_timeout: Some(Duration::from_secs(15 * 60)),
            embed_colour: 0x303136,
            default_mentions: MentionPolicy::users_only(),
        }
    }

    pub fn from_config(config: &BotConfig, api: Arc<dyn ChatApi>, provider: Arc<dyn DataProvider>) -> Self {
        Router::new(api, provider, config.owners.clone(), config.prefixes.clone())
            .with_react_timeout(Some(config.react_timeout))
            .with_embed_colour(config.embed_colour)
            .with_cooldown_capacity(config.cooldown_capacity)
    }

    /// Replaces the default prefix matching. Mention prefixes are then up to the caller.
    pub fn with_prefixer(mut self, prefixer: Arc<dyn Prefixer>) -> Self {
        self.prefixer = prefixer;
        self
    }

    pub fn with_blacklist(mut self, blacklist: BlacklistFn) -> Self {
        self.blacklist = Some(blacklist);
        self
    }

    pub fn with_react_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.react_timeout = timeout;
        self
    }

    pub fn with_embed_colour(mut self, colour: u32) -> Self {
        self.embed_colour = colour;
        self
    }

    /// Mentions parsed in messages the router and its contexts send. Users only by default.
    pub fn with_default_mentions(mut self, mentions: MentionPolicy) -> Self {
        self.default_mentions = mentions;
        self
    }

    pub fn with_cooldown_capacity(mut self, capacity: usize) -> Self {
        self.cooldowns = CooldownGate::new(capacity);
        self
    }

    /// Remembers the bot's own user. Only the first call has an effect.
    pub fn set_bot_user(&self, bot: UserId) {
        if self.bot.set(bot).is_ok() {
            self.default_prefixer.add_mention(bot);
            self.reactions.set_bot_user(bot);
            log::info!("[ROUTER] Bot user set to {}", bot.0);
        }
    }

    pub fn bot_user(&self) -> Option<UserId> {
        self.bot.get().copied()
    }

    pub fn is_owner(&self, user: UserId) -> bool {
        self.owners.contains(&user)
    }

    pub fn commands(&self) -> &Arc<CommandRegistry> {
        &self.commands
    }

    pub fn reactions(&self) -> &Arc<ReactionRegistry> {
        &self.reactions
    }

    pub fn services(&self) -> Services {
        Services {
            api: self.api.clone(),
            reactions: self.reactions.clone(),
            commands: self.commands.clone(),
            react_timeout: self.react_timeout,
            embed_colour: self.embed_colour,
            default_mentions: self.default_mentions,
        }
    }

    pub async fn register_command(&self, cmd: Command) -> Arc<Command> {
        let cmd = self.commands.register(cmd).await;
        log::debug!("[ROUTER] Registered command '{}' ({})", cmd.name, cmd.id());
        cmd
    }

    /// Subscribes outside of a command body, e.g. for messages sent at startup.
    /// The router's reaction timeout applies unless `options` sets one.
    pub async fn subscribe(
        &self,
        ctx: Arc<Context>,
        message: MessageId,
        emoji: impl Into<EmojiKey>,
        user: UserId,
        mut options: SubscriptionOptions,
        callback: ReactionCallback,
    ) {
        if options.timeout.is_none() {
            options.timeout = self.react_timeout;
        }
        self.reactions
            .subscribe(message, emoji, user, ctx, options, callback)
            .await;
    }

    /// Turns a new message into a command run.
    ///
    /// Context construction errors are returned as is; `NoPrefixMatch` and
    /// `EmptyMessage` just mean the message was not a command.
    pub async fn handle_message(&self, msg: &InboundMessage) -> Result<Dispatch, ContextError> {
        if msg.author.bot {
            return Ok(Dispatch::Ignored);
        }

        let mut ctx = Context::build(
            msg,
            self.prefixer.as_ref(),
            self.provider.as_ref(),
            self.services(),
            self.bot_user(),
        )
        .await?;

        if let Some(blacklist) = &self.blacklist {
            if blacklist(&ctx) {
                log::debug!("[ROUTER] Ignoring blacklisted invocation of '{}' by {}", ctx.command, ctx.author.id.0);
                return Ok(Dispatch::Blacklisted);
            }
        }

        let mut cmd = match self.commands.lookup(&ctx.command).await {
            Some(cmd) => cmd,
            None => return Ok(Dispatch::UnknownCommand(ctx.command)),
        };

        // descend into subcommands, each one consuming the first argument
        while let Some(sub) = ctx.args.first().and_then(|arg| cmd.find_subcommand(arg)) {
            ctx.args.remove(0);
            let raw = skip_first_word(&ctx.raw_args).to_string();
            ctx.raw_args = raw;
            ctx.full_command_path.push(sub.name.to_lowercase());
            cmd = sub;
        }

        if cmd.owner_only && !self.is_owner(ctx.author.id) {
            notify(&ctx, "❌ **Access Denied**\nThis command can only be used by the bot owner.").await;
            return Ok(Dispatch::Denied(DenyReason::OwnerOnly));
        }
        if cmd.guild_only && ctx.message.guild_id.is_none() {
            notify(&ctx, "❌ This command can only be used in a server.").await;
            return Ok(Dispatch::Denied(DenyReason::GuildOnly));
        }

        let cooldown_key = ctx.full_command_path.join(" ");
        if let CooldownStatus::Remaining(left) = self.cooldowns.hit(ctx.author.id, &cooldown_key, cmd.cooldown).await {
            notify(
                &ctx,
                &format!("⏳ This command is on cooldown, try again in {:.1} seconds.", left.as_secs_f64()),
            )
            .await;
            return Ok(Dispatch::OnCooldown(left));
        }

        ctx.cmd = Some(cmd.clone());
        let ctx = Arc::new(ctx);
        let handle = tokio::spawn(async move {
            if let Err(e) = cmd.run(ctx.clone()).await {
                log::error!(
                    "❌ Command '{}' failed for user {} ({}): {}",
                    ctx.full_command_path.join(" "),
                    ctx.author.name,
                    ctx.author.id.0,
                    e
                );
                notify(&ctx, &format!("Error: {}", e)).await;
            }
        });

        Ok(Dispatch::Dispatched(handle))
    }

    pub async fn on_reaction_added(&self, event: &ReactionEvent) -> Option<JoinHandle<()>> {
        self.reactions.on_reaction_added(event).await
    }

    pub async fn on_reaction_removed(&self, event: &ReactionEvent) -> Option<JoinHandle<()>> {
        self.reactions.on_reaction_removed(event).await
    }

    pub async fn on_message_deleted(&self, message: MessageId) -> usize {
        self.reactions.on_message_deleted(message).await
    }

    pub async fn on_messages_deleted(&self, messages: &[MessageId]) -> usize {
        let mut removed = 0;
        for message in messages {
            removed += self.reactions.on_message_deleted(*message).await;
        }
        removed
    }

    pub async fn purge_cooldowns(&self) -> usize {
        self.cooldowns.purge_expired().await
    }

    /// Syncs slash commands into the given guilds, or globally when `guilds` is empty.
    ///
    /// Declarations whose name no longer matches a registered command are deleted.
    pub async fn sync_commands(&self, guilds: &[GuildId]) -> Result<(), ApiError> {
        let declarations: Vec<CommandDeclaration> = self
            .commands
            .slash_commands()
            .await
            .iter()
            .filter_map(|cmd| cmd.declaration())
            .collect();

        let scopes: Vec<CommandScope> = if guilds.is_empty() {
            vec![CommandScope::Global]
        } else {
            guilds.iter().copied().map(CommandScope::Guild).collect()
        };

        for scope in scopes {
            let current = self.api.commands(scope).await?;
            for stale in current.iter().filter(|c| !declarations.iter().any(|d| d.name == c.name)) {
                self.api.delete_command(scope, stale.id).await?;
            }
            for declaration in &declarations {
                self.api.create_command(scope, declaration).await?;
            }
            log::info!("[ROUTER] Synced {} slash commands ({:?})", declarations.len(), scope);
        }

        Ok(())
    }
}

async fn notify(ctx: &Context, content: &str) {
    if let Err(e) = ctx.reply(content).await {
        log::warn!("[ROUTER] Failed to reply in channel {}: {}", ctx.message.channel_id.0, e);
    }
}
