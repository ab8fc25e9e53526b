// serenity_backend.rs - ChatApi and DataProvider over serenity's Http and Cache
// Lookups try the cache first and fall back to REST. The cache only exists
// once the client is built, so it is attached afterwards.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use serenity::builder::{CreateAllowedMentions, CreateEmbed, ParseValue};
use serenity::cache::Cache;
use serenity::http::Http;
use serenity::model::channel::{Channel, ReactionType};
use serenity::model::id::EmojiId;
use serenity::model::permissions::Permissions;

use crate::error::ApiError;
use crate::model::{ChannelId, ChannelInfo, CommandId, EmojiKey, GuildId, GuildInfo, MessageId, Page, RoleInfo, UserId};
use crate::platform::{ChatApi, CommandDeclaration, CommandScope, DataProvider, MentionPolicy, RemoteCommand};

pub struct SerenityBackend {
    http: Arc<Http>,
    cache: OnceCell<Arc<Cache>>,
}

impl SerenityBackend {
    pub fn new(http: Arc<Http>) -> Self {
        SerenityBackend {
            http,
            cache: OnceCell::new(),
        }
    }

    /// Only the first cache attached is kept
    pub fn attach_cache(&self, cache: Arc<Cache>) {
        if self.cache.set(cache).is_ok() {
            log::debug!("[BACKEND] Cache attached");
        }
    }
}

/// `name:id` keys are custom emoji, anything else is sent as unicode
pub fn reaction_type(emoji: &EmojiKey) -> ReactionType {
    if let Some((name, id)) = emoji.as_str().rsplit_once(':') {
        if let Ok(id) = id.parse::<u64>() {
            return ReactionType::Custom {
                animated: false,
                id: EmojiId(id),
                name: Some(name.trim_start_matches("a:").to_string()),
            };
        }
    }
    ReactionType::Unicode(emoji.as_str().to_string())
}

pub fn embed(page: &Page) -> CreateEmbed {
    let mut embed = CreateEmbed::default();
    if let Some(title) = &page.title {
        embed.title(title);
    }
    if let Some(description) = &page.description {
        embed.description(description);
    }
    if let Some(colour) = page.colour {
        embed.colour(colour);
    }
    for field in &page.fields {
        embed.field(&field.name, &field.value, field.inline);
    }
    if let Some(footer) = &page.footer {
        embed.footer(|f| f.text(footer));
    }
    embed
}

/// Parse list for `policy`, empty when nothing may ping
pub fn allowed_mentions(am: &mut CreateAllowedMentions, policy: MentionPolicy) -> &mut CreateAllowedMentions {
    am.empty_parse();
    if policy.users {
        am.parse(ParseValue::Users);
    }
    if policy.roles {
        am.parse(ParseValue::Roles);
    }
    if policy.everyone {
        am.parse(ParseValue::Everyone);
    }
    am
}

fn remote(commands: Vec<serenity::model::application::command::Command>) -> Vec<RemoteCommand> {
    commands
        .into_iter()
        .map(|c| RemoteCommand { id: c.id, name: c.name })
        .collect()
}

#[async_trait]
impl ChatApi for SerenityBackend {
    async fn send_message(
        &self,
        channel: ChannelId,
        content: &str,
        page: Option<&Page>,
        mentions: MentionPolicy,
    ) -> Result<MessageId, ApiError> {
        let msg = channel
            .send_message(&self.http, |m| {
                if !content.is_empty() {
                    m.content(content);
                }
                m.allowed_mentions(|am| allowed_mentions(am, mentions));
                if let Some(page) = page {
                    m.set_embed(embed(page));
                }
                m
            })
            .await?;
        Ok(msg.id)
    }

    async fn edit_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        content: Option<&str>,
        page: Option<&Page>,
        mentions: MentionPolicy,
    ) -> Result<(), ApiError> {
        channel
            .edit_message(&self.http, message, |m| {
                if let Some(content) = content {
                    m.content(content);
                }
                m.allowed_mentions(|am| allowed_mentions(am, mentions));
                if let Some(page) = page {
                    m.set_embed(embed(page));
                }
                m
            })
            .await?;
        Ok(())
    }

    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<(), ApiError> {
        channel.delete_message(&self.http, message).await?;
        Ok(())
    }

    async fn react(&self, channel: ChannelId, message: MessageId, emoji: &EmojiKey) -> Result<(), ApiError> {
        channel.create_reaction(&self.http, message, reaction_type(emoji)).await?;
        Ok(())
    }

    async fn delete_user_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        user: UserId,
        emoji: &EmojiKey,
    ) -> Result<(), ApiError> {
        channel
            .delete_reaction(&self.http, message, Some(user), reaction_type(emoji))
            .await?;
        Ok(())
    }

    async fn bot_permissions(&self, channel: ChannelId, _guild: GuildId) -> Result<Permissions, ApiError> {
        let cache = self
            .cache
            .get()
            .ok_or_else(|| ApiError::Unavailable("cache not attached".to_string()))?;
        let guild_channel = cache
            .guild_channel(channel)
            .ok_or_else(|| ApiError::NotFound(format!("channel {} not cached", channel.0)))?;
        Ok(guild_channel.permissions_for_user(cache, cache.current_user_id())?)
    }

    async fn commands(&self, scope: CommandScope) -> Result<Vec<RemoteCommand>, ApiError> {
        let commands = match scope {
            CommandScope::Global => self.http.get_global_application_commands().await?,
            CommandScope::Guild(guild) => self.http.get_guild_application_commands(guild.0).await?,
        };
        Ok(remote(commands))
    }

    async fn create_command(&self, scope: CommandScope, declaration: &CommandDeclaration) -> Result<(), ApiError> {
        let body = serde_json::to_value(declaration)
            .map_err(|e| ApiError::Unavailable(format!("couldn't encode command {}: {}", declaration.name, e)))?;
        match scope {
            CommandScope::Global => self.http.create_global_application_command(&body).await?,
            CommandScope::Guild(guild) => self.http.create_guild_application_command(guild.0, &body).await?,
        };
        Ok(())
    }

    async fn delete_command(&self, scope: CommandScope, id: CommandId) -> Result<(), ApiError> {
        match scope {
            CommandScope::Global => self.http.delete_global_application_command(id.0).await?,
            CommandScope::Guild(guild) => self.http.delete_guild_application_command(guild.0, id.0).await?,
        }
        Ok(())
    }
}

#[async_trait]
impl DataProvider for SerenityBackend {
    async fn channel(&self, id: ChannelId) -> Result<ChannelInfo, ApiError> {
        let cached = self.cache.get().and_then(|cache| cache.channel(id));
        let channel = match cached {
            Some(channel) => channel,
            None => self.http.get_channel(id.0).await?,
        };

        let info = match channel {
            Channel::Guild(c) => ChannelInfo {
                id,
                name: c.name,
                guild_id: Some(c.guild_id),
            },
            Channel::Private(c) => ChannelInfo {
                id,
                name: c.recipient.name,
                guild_id: None,
            },
            Channel::Category(c) => ChannelInfo {
                id,
                name: c.name,
                guild_id: Some(c.guild_id),
            },
            _ => return Err(ApiError::NotFound(format!("unsupported channel type for {}", id.0))),
        };
        Ok(info)
    }

    async fn guild(&self, id: GuildId) -> Result<GuildInfo, ApiError> {
        if let Some(guild) = self.cache.get().and_then(|cache| cache.guild(id)) {
            return Ok(GuildInfo {
                id,
                name: guild.name,
                roles: Vec::new(),
            });
        }

        let guild = self.http.get_guild(id.0).await?;
        Ok(GuildInfo {
            id,
            name: guild.name,
            roles: Vec::new(),
        })
    }

    async fn roles(&self, id: GuildId) -> Result<Vec<RoleInfo>, ApiError> {
        let roles = match self.cache.get().and_then(|cache| cache.guild_roles(id)) {
            Some(roles) => roles.into_values().collect(),
            None => self.http.get_guild_roles(id.0).await?,
        };

        let mut roles: Vec<RoleInfo> = roles
            .into_iter()
            .map(|r| RoleInfo {
                id: r.id,
                name: r.name,
                position: r.position,
            })
            .collect();
        roles.sort_by(|a, b| b.position.cmp(&a.position));
        Ok(roles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PageField;

    #[test]
    fn test_custom_emoji_keys_parse_to_custom_reactions() {
        match reaction_type(&EmojiKey::from("blob:123456")) {
            ReactionType::Custom { id, name, .. } => {
                assert_eq!(id, EmojiId(123456));
                assert_eq!(name.as_deref(), Some("blob"));
            }
            other => panic!("expected custom emoji, got {:?}", other),
        }
        assert!(matches!(reaction_type(&EmojiKey::from("➡️")), ReactionType::Unicode(s) if s == "➡️"));
    }

    #[test]
    fn test_reaction_type_round_trips_through_as_data() {
        let key = EmojiKey::from("party:42");
        assert_eq!(reaction_type(&key).as_data(), "party:42");
    }

    #[test]
    fn test_embed_carries_page_fields() {
        let page = Page::new("Help")
            .description("All commands")
            .colour(0x303136)
            .field(PageField::new("ping", "Pong", false))
            .footer("Page 1/1");

        let embed = embed(&page);
        assert_eq!(embed.0.get("title").and_then(|v| v.as_str()), Some("Help"));
        assert_eq!(embed.0.get("color").and_then(|v| v.as_u64()), Some(0x303136));
        assert_eq!(embed.0.get("fields").and_then(|v| v.as_array()).map(|f| f.len()), Some(1));
    }

    #[test]
    fn test_allowed_mentions_follow_policy() {
        let mut am = CreateAllowedMentions::default();
        allowed_mentions(&mut am, MentionPolicy::users_only());
        assert_eq!(am.0.get("parse"), Some(&serde_json::json!(["users"])));

        let mut am = CreateAllowedMentions::default();
        allowed_mentions(&mut am, MentionPolicy::none());
        assert_eq!(am.0.get("parse"), Some(&serde_json::json!([])));

        let mut am = CreateAllowedMentions::default();
        allowed_mentions(&mut am, MentionPolicy::all());
        assert_eq!(am.0.get("parse"), Some(&serde_json::json!(["users", "roles", "everyone"])));
    }
}
