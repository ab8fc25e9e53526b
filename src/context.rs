// context.rs - Invocation context for a single command run
// Built from an inbound message by `Context::build`. Command bodies receive it
// as `Arc<Context>` and reaction callbacks may keep it alive after the body
// returns.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::command::Command;
use crate::error::{ApiError, ContextError, PaginatorError};
use crate::model::{Author, ChannelInfo, EmojiKey, GuildInfo, InboundMessage, MemberInfo, MessageId, Page, UserId};
use crate::paginator::{self, Paginated};
use crate::platform::{ChatApi, DataProvider, MentionPolicy};
use crate::prefix::Prefixer;
use crate::reactions::{ReactionCallback, ReactionRegistry, SubscriptionOptions};
use crate::registry::CommandRegistry;

/// Shared services a context hands to command bodies and callbacks
#[derive(Clone)]
pub struct Services {
    pub api: Arc<dyn ChatApi>,
    pub reactions: Arc<ReactionRegistry>,
    pub commands: Arc<CommandRegistry>,
    /// Applied to every subscription a context registers
    pub react_timeout: Option<Duration>,
    pub embed_colour: u32,
    /// Mentions allowed in everything sent through the context
    pub default_mentions: MentionPolicy,
}

pub struct Context {
    /// Lowercased name the command was invoked with. For subcommands this is
    /// still the top-level name, see `full_command_path`.
    pub command: String,
    pub prefix: String,
    pub full_command_path: Vec<String>,

    pub args: Vec<String>,
    pub raw_args: String,

    pub message: InboundMessage,
    pub channel: Option<ChannelInfo>,
    pub guild: Option<GuildInfo>,
    pub author: Author,
    /// `None` for direct messages
    pub member: Option<MemberInfo>,

    pub cmd: Option<Arc<Command>>,
    pub bot: Option<UserId>,

    pub services: Services,
}

impl Context {
    /// Builds a context from a new message.
    ///
    /// Fails with `NoPrefixMatch` or `EmptyMessage` when the message is not a
    /// command at all. Channel and guild lookup failures still hand back the
    /// partially built context inside the error.
    pub async fn build(
        msg: &InboundMessage,
        prefixer: &dyn Prefixer,
        provider: &dyn DataProvider,
        services: Services,
        bot: Option<UserId>,
    ) -> Result<Context, ContextError> {
        let prefix_len = prefixer.match_prefix(&msg.content).ok_or(ContextError::NoPrefixMatch)?;
        let (prefix, rest) = match (msg.content.get(..prefix_len), msg.content.get(prefix_len..)) {
            (Some(prefix), Some(rest)) => (prefix, rest.trim()),
            _ => return Err(ContextError::NoPrefixMatch),
        };
        if rest.is_empty() {
            return Err(ContextError::EmptyMessage);
        }

        let tokens = tokenize(rest);
        let (first, args) = match tokens.split_first() {
            Some((first, args)) => (first.clone(), args.to_vec()),
            None => return Err(ContextError::EmptyMessage),
        };
        let raw_args = skip_first_word(rest).trim_end().to_string();
        let command = first.to_lowercase();

        let mut ctx = Context {
            full_command_path: vec![command.clone()],
            command,
            prefix: prefix.to_string(),
            args,
            raw_args,
            message: msg.clone(),
            channel: None,
            guild: None,
            author: msg.author.clone(),
            member: msg.member.clone(),
            cmd: None,
            bot,
            services,
        };

        match provider.channel(msg.channel_id).await {
            Ok(channel) => ctx.channel = Some(channel),
            Err(source) => {
                return Err(ContextError::ChannelResolutionFailed {
                    partial: Box::new(ctx),
                    source,
                })
            }
        }

        if let Some(guild_id) = msg.guild_id {
            let resolved = match provider.guild(guild_id).await {
                Ok(mut guild) => provider.roles(guild_id).await.map(|roles| {
                    guild.roles = roles;
                    guild
                }),
                Err(e) => Err(e),
            };
            match resolved {
                Ok(guild) => ctx.guild = Some(guild),
                Err(source) => {
                    return Err(ContextError::GuildResolutionFailed {
                        partial: Box::new(ctx),
                        source,
                    })
                }
            }
        }

        Ok(ctx)
    }

    /// Nickname in the guild if set, username otherwise
    pub fn display_name(&self) -> &str {
        self.member
            .as_ref()
            .and_then(|m| m.nick.as_deref())
            .filter(|nick| !nick.is_empty())
            .unwrap_or(self.author.name.as_str())
    }

    pub fn api(&self) -> &Arc<dyn ChatApi> {
        &self.services.api
    }

    pub async fn send(&self, content: &str) -> Result<MessageId, ApiError> {
        self.services
            .api
            .send_message(self.message.channel_id, content, None, self.services.default_mentions)
            .await
    }

    /// Sends a page, filling in the router's embed colour when the page has none
    pub async fn send_page(&self, page: &Page) -> Result<MessageId, ApiError> {
        let page = self.coloured(page);
        self.services
            .api
            .send_message(self.message.channel_id, "", Some(&page), self.services.default_mentions)
            .await
    }

    /// Sends `content` prefixed with a mention of the author
    pub async fn reply(&self, content: &str) -> Result<MessageId, ApiError> {
        let content = format!("<@{}> {}", self.author.id.0, content);
        self.send(&content).await
    }

    pub async fn react(&self, message: MessageId, emoji: impl Into<EmojiKey>) -> Result<(), ApiError> {
        self.services
            .api
            .react(self.message.channel_id, message, &emoji.into())
            .await
    }

    /// Runs `callback` when `user` reacts to `message` with `emoji`
    pub async fn subscribe(
        self: &Arc<Self>,
        message: MessageId,
        emoji: impl Into<EmojiKey>,
        user: UserId,
        mut options: SubscriptionOptions,
        callback: ReactionCallback,
    ) {
        if options.timeout.is_none() {
            options.timeout = self.services.react_timeout;
        }
        self.services
            .reactions
            .subscribe(message, emoji, user, self.clone(), options, callback)
            .await;
    }

    /// Sends `pages` with reaction controls to flip through them
    pub async fn paginate(self: &Arc<Self>, pages: Vec<Page>, extended: bool) -> Result<Paginated, PaginatorError> {
        paginator::paginate(self, pages, extended).await
    }

    pub(crate) fn coloured(&self, page: &Page) -> Page {
        let mut page = page.clone();
        page.colour.get_or_insert(self.services.embed_colour);
        page
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("command", &self.command)
            .field("prefix", &self.prefix)
            .field("full_command_path", &self.full_command_path)
            .field("args", &self.args)
            .field("raw_args", &self.raw_args)
            .field("message", &self.message.id)
            .field("channel", &self.channel)
            .field("guild", &self.guild.as_ref().map(|g| g.id))
            .field("author", &self.author)
            .finish()
    }
}

/// Shell-word split, falling back to plain whitespace split on unbalanced quotes
fn tokenize(input: &str) -> Vec<String> {
    shell_words::split(input).unwrap_or_else(|_| input.split_whitespace().map(String::from).collect())
}

/// `input` with its first shell word and the whitespace after it removed.
///
/// Quotes and backslash escapes are honoured, so `"greet" hi` leaves `hi`.
/// An unterminated quote ends the first word at the first whitespace, the
/// same way `tokenize` falls back.
pub(crate) fn skip_first_word(input: &str) -> &str {
    let input = input.trim_start();
    let mut quote = None;
    let mut escaped = false;

    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match quote {
            None if c.is_whitespace() => return input[i..].trim_start(),
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '\\' => escaped = true,
            // single quotes take everything literally
            Some('"') if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            _ => {}
        }
    }

    if quote.is_some() {
        return input.find(char::is_whitespace).map_or("", |i| input[i..].trim_start());
    }
    ""
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChannelId, GuildId};
    use crate::prefix::DefaultPrefixer;
    use crate::testing::{message, MockPlatform};

    async fn build(platform: &Arc<MockPlatform>, content: &str) -> Result<Context, ContextError> {
        let prefixer = DefaultPrefixer::new(["!!"]);
        let msg = message(content);
        Context::build(&msg, &prefixer, platform.as_ref(), platform.services(), None).await
    }

    #[tokio::test]
    async fn test_quoted_arguments_stay_together() {
        let platform = MockPlatform::new();
        let ctx = build(&platform, "!!greet --loud \"hi there\"").await.unwrap();

        assert_eq!(ctx.command, "greet");
        assert_eq!(ctx.prefix, "!!");
        assert_eq!(ctx.args, vec!["--loud", "hi there"]);
        assert_eq!(ctx.raw_args, "--loud \"hi there\"");
        assert_eq!(ctx.full_command_path, vec!["greet"]);
    }

    #[tokio::test]
    async fn test_command_name_is_lowercased() {
        let platform = MockPlatform::new();
        let ctx = build(&platform, "!!GrEeT world").await.unwrap();

        assert_eq!(ctx.command, "greet");
        assert_eq!(ctx.raw_args, "world");
    }

    #[tokio::test]
    async fn test_missing_prefix_builds_nothing() {
        let platform = MockPlatform::new();
        let err = build(&platform, "greet everyone").await.unwrap_err();

        assert!(matches!(err, ContextError::NoPrefixMatch));
        assert!(err.partial().is_none());
    }

    #[tokio::test]
    async fn test_prefix_only_is_empty() {
        let platform = MockPlatform::new();
        let err = build(&platform, "!!   ").await.unwrap_err();
        assert!(matches!(err, ContextError::EmptyMessage));
    }

    #[tokio::test]
    async fn test_quoted_command_name_is_not_left_in_raw_args() {
        let platform = MockPlatform::new();
        let ctx = build(&platform, "!!\"greet\" hi there").await.unwrap();

        assert_eq!(ctx.command, "greet");
        assert_eq!(ctx.args, vec!["hi", "there"]);
        assert_eq!(ctx.raw_args, "hi there");
    }

    #[test]
    fn test_skip_first_word() {
        assert_eq!(skip_first_word("set colour red"), "colour red");
        assert_eq!(skip_first_word("  'a b' c"), "c");
        assert_eq!(skip_first_word("\"a \\\" b\" c  d"), "c  d");
        assert_eq!(skip_first_word("a\\ b c"), "c");
        assert_eq!(skip_first_word("\"open quote here"), "quote here");
        assert_eq!(skip_first_word("alone"), "");
        assert_eq!(skip_first_word(""), "");
    }

    #[tokio::test]
    async fn test_unbalanced_quotes_fall_back_to_whitespace() {
        let platform = MockPlatform::new();
        let ctx = build(&platform, "!!say \"unterminated quote").await.unwrap();

        assert_eq!(ctx.command, "say");
        assert_eq!(ctx.args, vec!["\"unterminated", "quote"]);
    }

    #[tokio::test]
    async fn test_guild_and_roles_are_resolved() {
        let platform = MockPlatform::new();
        let prefixer = DefaultPrefixer::new(["!!"]);
        let mut msg = message("!!roles");
        msg.guild_id = Some(GuildId(7));

        let ctx = Context::build(&msg, &prefixer, platform.as_ref(), platform.services(), None)
            .await
            .unwrap();

        let guild = ctx.guild.as_ref().unwrap();
        assert_eq!(guild.id, GuildId(7));
        assert_eq!(guild.roles.len(), 1);
        assert_eq!(ctx.channel.as_ref().unwrap().id, msg.channel_id);
    }

    #[tokio::test]
    async fn test_channel_failure_returns_partial_context() {
        let platform = MockPlatform::new();
        platform.fail_channel(ChannelId(1));
        let err = build(&platform, "!!greet").await.unwrap_err();

        assert!(matches!(err, ContextError::ChannelResolutionFailed { .. }));
        assert_eq!(err.partial().unwrap().command, "greet");
    }

    #[tokio::test]
    async fn test_guild_failure_returns_partial_context() {
        let platform = MockPlatform::new();
        platform.fail_guild(GuildId(9));
        let prefixer = DefaultPrefixer::new(["!!"]);
        let mut msg = message("!!greet");
        msg.guild_id = Some(GuildId(9));

        let err = Context::build(&msg, &prefixer, platform.as_ref(), platform.services(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ContextError::GuildResolutionFailed { .. }));
        assert!(err.partial().unwrap().channel.is_some());
    }

    #[tokio::test]
    async fn test_display_name_prefers_nickname() {
        let platform = MockPlatform::new();
        let mut ctx = build(&platform, "!!greet").await.unwrap();
        assert_eq!(ctx.display_name(), "tester");

        ctx.member = Some(MemberInfo {
            nick: Some("nick".to_string()),
            roles: Vec::new(),
        });
        assert_eq!(ctx.display_name(), "nick");
    }
}
