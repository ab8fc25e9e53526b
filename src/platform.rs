// platform.rs - The seam between the router and the chat platform
// `ChatApi` covers the REST calls the router and paginator make,
// `DataProvider` covers cached lookups used while building contexts.

use async_trait::async_trait;
use serde::{Serialize, Serializer};
use serenity::model::permissions::Permissions;

use crate::error::ApiError;
use crate::model::{ChannelId, ChannelInfo, CommandId, EmojiKey, GuildId, GuildInfo, MessageId, Page, RoleInfo, UserId};

/// Where a slash command declaration lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandScope {
    Global,
    Guild(GuildId),
}

/// Slash command option types, serialized as their API type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    String,
    Integer,
    Boolean,
    User,
    Channel,
    Role,
    Number,
}

impl OptionKind {
    pub fn code(self) -> u8 {
        match self {
            OptionKind::String => 3,
            OptionKind::Integer => 4,
            OptionKind::Boolean => 5,
            OptionKind::User => 6,
            OptionKind::Channel => 7,
            OptionKind::Role => 8,
            OptionKind::Number => 10,
        }
    }
}

impl Serialize for OptionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOption {
    #[serde(rename = "type")]
    pub kind: OptionKind,
    pub name: String,
    pub description: String,
    pub required: bool,
}

impl CommandOption {
    pub fn new(kind: OptionKind, name: impl Into<String>, description: impl Into<String>) -> Self {
        CommandOption {
            kind,
            name: name.into(),
            description: description.into(),
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// The body sent when creating a slash command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandDeclaration {
    pub name: String,
    pub description: String,
    pub options: Vec<CommandOption>,
}

/// Which mention kinds in a message body actually notify anyone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MentionPolicy {
    pub users: bool,
    pub roles: bool,
    pub everyone: bool,
}

impl MentionPolicy {
    pub fn users_only() -> Self {
        MentionPolicy {
            users: true,
            roles: false,
            everyone: false,
        }
    }

    pub fn none() -> Self {
        MentionPolicy {
            users: false,
            roles: false,
            everyone: false,
        }
    }

    pub fn all() -> Self {
        MentionPolicy {
            users: true,
            roles: true,
            everyone: true,
        }
    }
}

impl Default for MentionPolicy {
    fn default() -> Self {
        Self::users_only()
    }
}

/// A slash command as currently declared on the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    pub id: CommandId,
    pub name: String,
}

#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Sends a message with optional text and an optional embed page.
    /// Only the mentions `mentions` allows are parsed.
    async fn send_message(
        &self,
        channel: ChannelId,
        content: &str,
        page: Option<&Page>,
        mentions: MentionPolicy,
    ) -> Result<MessageId, ApiError>;

    async fn edit_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        content: Option<&str>,
        page: Option<&Page>,
        mentions: MentionPolicy,
    ) -> Result<(), ApiError>;

    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<(), ApiError>;

    async fn react(&self, channel: ChannelId, message: MessageId, emoji: &EmojiKey) -> Result<(), ApiError>;

    async fn delete_user_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        user: UserId,
        emoji: &EmojiKey,
    ) -> Result<(), ApiError>;

    /// Permissions the bot itself currently holds in a guild channel
    async fn bot_permissions(&self, channel: ChannelId, guild: GuildId) -> Result<Permissions, ApiError>;

    async fn commands(&self, scope: CommandScope) -> Result<Vec<RemoteCommand>, ApiError>;

    async fn create_command(&self, scope: CommandScope, declaration: &CommandDeclaration) -> Result<(), ApiError>;

    async fn delete_command(&self, scope: CommandScope, id: CommandId) -> Result<(), ApiError>;
}

#[async_trait]
pub trait DataProvider: Send + Sync {
    async fn channel(&self, id: ChannelId) -> Result<ChannelInfo, ApiError>;

    async fn guild(&self, id: GuildId) -> Result<GuildInfo, ApiError>;

    async fn roles(&self, id: GuildId) -> Result<Vec<RoleInfo>, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_serializes_option_type_codes() {
        let declaration = CommandDeclaration {
            name: "echo".to_string(),
            description: "Echo text back".to_string(),
            options: vec![CommandOption::new(OptionKind::String, "message", "Text to echo").required()],
        };

        let json = serde_json::to_value(&declaration).unwrap();
        assert_eq!(json["name"], "echo");
        assert_eq!(json["options"][0]["type"], 3);
        assert_eq!(json["options"][0]["required"], true);
    }

    #[test]
    fn test_default_mentions_only_reach_users() {
        let policy = MentionPolicy::default();
        assert!(policy.users);
        assert!(!policy.roles);
        assert!(!policy.everyone);
    }
}
