// model.rs - Platform-neutral event and message types
// The router works on these instead of raw serenity models so that the
// core never depends on a live gateway connection.

use std::fmt;

use serenity::model::channel::{Message, Reaction};

pub use serenity::model::id::{ChannelId, CommandId, GuildId, MessageId, RoleId, UserId};

/// API string form of an emoji: the character itself for unicode emoji,
/// `name:id` for custom guild emoji.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmojiKey(String);

impl EmojiKey {
    pub fn new(emoji: impl Into<String>) -> Self {
        EmojiKey(emoji.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EmojiKey {
    fn from(emoji: &str) -> Self {
        EmojiKey::new(emoji)
    }
}

impl From<String> for EmojiKey {
    fn from(emoji: String) -> Self {
        EmojiKey(emoji)
    }
}

impl fmt::Display for EmojiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: UserId,
    pub name: String,
    pub bot: bool,
}

/// Guild-specific data of the message author
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberInfo {
    pub nick: Option<String>,
    pub roles: Vec<RoleId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub name: String,
    pub guild_id: Option<GuildId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleInfo {
    pub id: RoleId,
    pub name: String,
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildInfo {
    pub id: GuildId,
    pub name: String,
    pub roles: Vec<RoleInfo>,
}

/// A newly created message as delivered by a shard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub guild_id: Option<GuildId>,
    pub author: Author,
    /// Only set for messages sent in a guild
    pub member: Option<MemberInfo>,
    pub content: String,
}

impl From<&Message> for InboundMessage {
    fn from(msg: &Message) -> Self {
        InboundMessage {
            id: msg.id,
            channel_id: msg.channel_id,
            guild_id: msg.guild_id,
            author: Author {
                id: msg.author.id,
                name: msg.author.name.clone(),
                bot: msg.author.bot,
            },
            member: msg.member.as_ref().map(|m| MemberInfo {
                nick: m.nick.clone(),
                roles: m.roles.clone(),
            }),
            content: msg.content.clone(),
        }
    }
}

/// A reaction being added to or removed from a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionEvent {
    pub message_id: MessageId,
    pub channel_id: ChannelId,
    pub guild_id: Option<GuildId>,
    pub user_id: UserId,
    pub emoji: EmojiKey,
}

impl ReactionEvent {
    /// Converts a gateway reaction; `None` when the reacting user is unknown
    pub fn from_reaction(reaction: &Reaction) -> Option<Self> {
        Some(ReactionEvent {
            message_id: reaction.message_id,
            channel_id: reaction.channel_id,
            guild_id: reaction.guild_id,
            user_id: reaction.user_id?,
            emoji: EmojiKey(reaction.emoji.as_data()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl PageField {
    pub fn new(name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        PageField {
            name: name.into(),
            value: value.into(),
            inline,
        }
    }
}

/// One renderable page, sent as an embed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub title: Option<String>,
    pub description: Option<String>,
    pub colour: Option<u32>,
    pub fields: Vec<PageField>,
    pub footer: Option<String>,
}

impl Page {
    pub fn new(title: impl Into<String>) -> Self {
        Page {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn colour(mut self, colour: u32) -> Self {
        self.colour = Some(colour);
        self
    }

    pub fn field(mut self, field: PageField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }
}
