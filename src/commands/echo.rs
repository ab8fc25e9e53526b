// echo.rs - Echo Command Module
// Repeats the caller's text back to them.
//
// Key Features:
// - Echoes the raw argument text with its original spacing
// - Provides usage guidance if no text is given
// - Declared as a slash command with one required option
//
// Used by: commands/mod.rs (command registration)

use std::sync::Arc;

use crate::command::{handler, Command};
use crate::context::Context;
use crate::error::CommandResult;
use crate::platform::{CommandOption, OptionKind};

pub fn command() -> Command {
    Command::new("echo", handler(echo))
        .aliases(["say"])
        .summary("Echo back your message")
        .usage("echo <text>")
        .options(vec![
            CommandOption::new(OptionKind::String, "message", "Text to echo back").required(),
        ])
}

/// Main !!echo command handler
/// Mentions in the text only ping what the router's mention policy allows
/// Supports:
///   - !!echo <text>
///   - !!say <text>
async fn echo(ctx: Arc<Context>) -> CommandResult {
    // Without text, reply with usage guidance
    if ctx.raw_args.is_empty() {
        ctx.reply("Please provide text to echo!").await?;
    } else {
        ctx.reply(&ctx.raw_args).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MentionPolicy;
    use crate::testing::{context, MockPlatform};

    #[tokio::test]
    async fn test_echo_repeats_raw_arguments() {
        let platform = MockPlatform::new();
        let ctx = context(&platform.services(), "!!echo hello   world");

        command().run(ctx).await.unwrap();
        assert_eq!(platform.sent()[0].1, "<@10> hello world");
    }

    #[tokio::test]
    async fn test_echo_does_not_ping_everyone() {
        let platform = MockPlatform::new();
        let ctx = context(&platform.services(), "!!echo @everyone look");

        command().run(ctx).await.unwrap();

        let sent = platform.sent();
        assert_eq!(sent[0].1, "<@10> @everyone look");
        let mentions = sent[0].3;
        assert!(mentions.users);
        assert!(!mentions.everyone);
        assert!(!mentions.roles);
        assert_eq!(mentions, MentionPolicy::users_only());
    }

    #[tokio::test]
    async fn test_echo_without_text_explains_usage() {
        let platform = MockPlatform::new();
        let ctx = context(&platform.services(), "!!echo");

        command().run(ctx).await.unwrap();
        assert!(platform.sent()[0].1.contains("Please provide text"));
    }

    #[test]
    fn test_echo_declares_slash_option() {
        let declaration = command().declaration().unwrap();
        assert_eq!(declaration.name, "echo");
        assert_eq!(declaration.options.len(), 1);
        assert!(declaration.options[0].required);
    }
}
