// testing.rs - In-memory platform used by the unit tests
// Records every REST call instead of performing it.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serenity::model::permissions::Permissions;

use crate::context::{Context, Services};
use crate::error::ApiError;
use crate::model::{
    Author, ChannelId, ChannelInfo, CommandId, EmojiKey, GuildId, GuildInfo, InboundMessage, MessageId, Page,
    ReactionEvent, RoleId, RoleInfo, UserId,
};
use crate::platform::{ChatApi, CommandDeclaration, CommandScope, DataProvider, MentionPolicy, RemoteCommand};
use crate::reactions::ReactionRegistry;
use crate::registry::CommandRegistry;

#[derive(Default)]
struct Recorded {
    next_message: u64,
    sent: Vec<(ChannelId, String, Option<Page>, MentionPolicy)>,
    edits: Vec<(MessageId, Option<Page>, MentionPolicy)>,
    deleted: Vec<MessageId>,
    reactions: Vec<(MessageId, EmojiKey)>,
    stripped: Vec<(MessageId, UserId, EmojiKey)>,
    remote: HashMap<CommandScope, Vec<RemoteCommand>>,
    created: Vec<(CommandScope, CommandDeclaration)>,
    deleted_commands: Vec<(CommandScope, CommandId)>,
    failing_channels: HashSet<ChannelId>,
    failing_guilds: HashSet<GuildId>,
}

pub struct MockPlatform {
    recorded: Mutex<Recorded>,
    permissions: Mutex<Permissions>,
}

impl MockPlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(MockPlatform {
            recorded: Mutex::new(Recorded {
                next_message: 1000,
                ..Default::default()
            }),
            permissions: Mutex::new(Permissions::all()),
        })
    }

    /// Fresh registries talking to this platform
    pub fn services(self: &Arc<Self>) -> Services {
        let api: Arc<dyn ChatApi> = self.clone();
        Services {
            reactions: Arc::new(ReactionRegistry::new(api.clone())),
            commands: Arc::new(CommandRegistry::new()),
            api,
            react_timeout: None,
            embed_colour: 0,
            default_mentions: MentionPolicy::users_only(),
        }
    }

    pub fn set_permissions(&self, permissions: Permissions) {
        *self.permissions.lock().unwrap() = permissions;
    }

    pub fn fail_channel(&self, channel: ChannelId) {
        self.recorded.lock().unwrap().failing_channels.insert(channel);
    }

    pub fn fail_guild(&self, guild: GuildId) {
        self.recorded.lock().unwrap().failing_guilds.insert(guild);
    }

    pub fn set_remote_commands(&self, scope: CommandScope, commands: Vec<RemoteCommand>) {
        self.recorded.lock().unwrap().remote.insert(scope, commands);
    }

    pub fn sent(&self) -> Vec<(ChannelId, String, Option<Page>, MentionPolicy)> {
        self.recorded.lock().unwrap().sent.clone()
    }

    pub fn edits(&self) -> Vec<(MessageId, Option<Page>, MentionPolicy)> {
        self.recorded.lock().unwrap().edits.clone()
    }

    pub fn deleted(&self) -> Vec<MessageId> {
        self.recorded.lock().unwrap().deleted.clone()
    }

    pub fn added_reactions(&self) -> Vec<(MessageId, EmojiKey)> {
        self.recorded.lock().unwrap().reactions.clone()
    }

    pub fn stripped(&self) -> Vec<(MessageId, UserId, EmojiKey)> {
        self.recorded.lock().unwrap().stripped.clone()
    }

    pub fn created_commands(&self) -> Vec<(CommandScope, CommandDeclaration)> {
        self.recorded.lock().unwrap().created.clone()
    }

    pub fn deleted_commands(&self) -> Vec<(CommandScope, CommandId)> {
        self.recorded.lock().unwrap().deleted_commands.clone()
    }
}

#[async_trait]
impl ChatApi for MockPlatform {
    async fn send_message(
        &self,
        channel: ChannelId,
        content: &str,
        page: Option<&Page>,
        mentions: MentionPolicy,
    ) -> Result<MessageId, ApiError> {
        let mut recorded = self.recorded.lock().unwrap();
        recorded.next_message += 1;
        recorded.sent.push((channel, content.to_string(), page.cloned(), mentions));
        Ok(MessageId(recorded.next_message))
    }

    async fn edit_message(
        &self,
        _channel: ChannelId,
        message: MessageId,
        _content: Option<&str>,
        page: Option<&Page>,
        mentions: MentionPolicy,
    ) -> Result<(), ApiError> {
        self.recorded.lock().unwrap().edits.push((message, page.cloned(), mentions));
        Ok(())
    }

    async fn delete_message(&self, _channel: ChannelId, message: MessageId) -> Result<(), ApiError> {
        self.recorded.lock().unwrap().deleted.push(message);
        Ok(())
    }

    async fn react(&self, _channel: ChannelId, message: MessageId, emoji: &EmojiKey) -> Result<(), ApiError> {
        self.recorded.lock().unwrap().reactions.push((message, emoji.clone()));
        Ok(())
    }

    async fn delete_user_reaction(
        &self,
        _channel: ChannelId,
        message: MessageId,
        user: UserId,
        emoji: &EmojiKey,
    ) -> Result<(), ApiError> {
        self.recorded.lock().unwrap().stripped.push((message, user, emoji.clone()));
        Ok(())
    }

    async fn bot_permissions(&self, _channel: ChannelId, _guild: GuildId) -> Result<Permissions, ApiError> {
        Ok(*self.permissions.lock().unwrap())
    }

    async fn commands(&self, scope: CommandScope) -> Result<Vec<RemoteCommand>, ApiError> {
        Ok(self.recorded.lock().unwrap().remote.get(&scope).cloned().unwrap_or_default())
    }

    async fn create_command(&self, scope: CommandScope, declaration: &CommandDeclaration) -> Result<(), ApiError> {
        let mut recorded = self.recorded.lock().unwrap();
        recorded.created.push((scope, declaration.clone()));
        Ok(())
    }

    async fn delete_command(&self, scope: CommandScope, id: CommandId) -> Result<(), ApiError> {
        let mut recorded = self.recorded.lock().unwrap();
        if let Some(remote) = recorded.remote.get_mut(&scope) {
            remote.retain(|c| c.id != id);
        }
        recorded.deleted_commands.push((scope, id));
        Ok(())
    }
}

#[async_trait]
impl DataProvider for MockPlatform {
    async fn channel(&self, id: ChannelId) -> Result<ChannelInfo, ApiError> {
        if self.recorded.lock().unwrap().failing_channels.contains(&id) {
            return Err(ApiError::NotFound(format!("channel {}", id.0)));
        }
        Ok(ChannelInfo {
            id,
            name: "general".to_string(),
            guild_id: None,
        })
    }

    async fn guild(&self, id: GuildId) -> Result<GuildInfo, ApiError> {
        if self.recorded.lock().unwrap().failing_guilds.contains(&id) {
            return Err(ApiError::NotFound(format!("guild {}", id.0)));
        }
        Ok(GuildInfo {
            id,
            name: "guild".to_string(),
            roles: Vec::new(),
        })
    }

    async fn roles(&self, id: GuildId) -> Result<Vec<RoleInfo>, ApiError> {
        Ok(vec![RoleInfo {
            id: RoleId(id.0),
            name: "@everyone".to_string(),
            position: 0,
        }])
    }
}

/// Direct message from user 10 ("tester") in channel 1
pub fn message(content: &str) -> InboundMessage {
    InboundMessage {
        id: MessageId(100),
        channel_id: ChannelId(1),
        guild_id: None,
        author: Author {
            id: UserId(10),
            name: "tester".to_string(),
            bot: false,
        },
        member: None,
        content: content.to_string(),
    }
}

/// Context for `content` without going through prefix matching or lookups
pub fn context(services: &Services, content: &str) -> Arc<Context> {
    let msg = message(content);
    let rest = content.strip_prefix("!!").unwrap_or(content).trim();
    let mut words = rest.split_whitespace().map(String::from);
    let command = words.next().unwrap_or_default().to_lowercase();
    let args: Vec<String> = words.collect();

    Arc::new(Context {
        full_command_path: vec![command.clone()],
        command,
        prefix: "!!".to_string(),
        raw_args: args.join(" "),
        args,
        channel: None,
        guild: None,
        author: msg.author.clone(),
        member: None,
        message: msg,
        cmd: None,
        bot: None,
        services: services.clone(),
    })
}

/// Reaction by `user` in channel 1, outside of any guild
pub fn reaction(message: MessageId, user: UserId, emoji: &str) -> ReactionEvent {
    ReactionEvent {
        message_id: message,
        channel_id: ChannelId(1),
        guild_id: None,
        user_id: user,
        emoji: EmojiKey::from(emoji),
    }
}
