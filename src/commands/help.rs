// help.rs - Help Command Module
// `help` pages through every registered command, `help <command>` shows the
// details of one command or subcommand.

use std::sync::Arc;

use crate::command::{handler, Command};
use crate::context::Context;
use crate::error::CommandResult;
use crate::model::{Page, PageField};
use crate::paginator::field_pages;

const COMMANDS_PER_PAGE: usize = 6;

pub fn command() -> Command {
    Command::new("help", handler(help))
        .aliases(["h", "commands"])
        .summary("Show this help message")
        .description("Lists every command, or shows details for the command given.")
        .usage("help [command] [subcommand]")
}

/// Display help for every command, or for one command path
async fn help(ctx: Arc<Context>) -> CommandResult {
    if ctx.args.is_empty() {
        return list(&ctx).await;
    }

    let mut found = match ctx.services.commands.lookup(&ctx.args[0]).await {
        Some(cmd) => cmd,
        None => {
            ctx.reply(&format!("❓ Unknown command: '{}'.", ctx.args[0])).await?;
            return Ok(());
        }
    };
    let mut path = vec![found.name.clone()];
    for arg in &ctx.args[1..] {
        match found.find_subcommand(arg) {
            Some(sub) => {
                path.push(sub.name.clone());
                found = sub;
            }
            None => break,
        }
    }

    ctx.send_page(&details(&ctx.prefix, &path.join(" "), &found)).await?;
    Ok(())
}

async fn list(ctx: &Arc<Context>) -> CommandResult {
    let fields = ctx
        .services
        .commands
        .list()
        .await
        .iter()
        .filter(|cmd| !cmd.owner_only)
        .map(|cmd| PageField::new(format!("{}{}", ctx.prefix, cmd.name), summary(cmd), false))
        .collect();

    let pages = field_pages(
        "🤖 Command Help",
        &format!("Use `{}help <command>` for more information on a command.", ctx.prefix),
        ctx.services.embed_colour,
        fields,
        COMMANDS_PER_PAGE,
    );
    ctx.paginate(pages, true).await?;
    Ok(())
}

fn summary(cmd: &Command) -> String {
    if cmd.summary.is_empty() {
        "No description".to_string()
    } else {
        cmd.summary.clone()
    }
}

fn details(prefix: &str, path: &str, cmd: &Command) -> Page {
    let description = if cmd.description.is_empty() { summary(cmd) } else { cmd.description.clone() };
    let mut page = Page::new(format!("{}{}", prefix, path)).description(description);

    if !cmd.usage.is_empty() {
        page = page.field(PageField::new("Usage", format!("`{}{}`", prefix, cmd.usage), false));
    }
    if !cmd.aliases.is_empty() {
        page = page.field(PageField::new("Aliases", cmd.aliases.join(", "), true));
    }
    if !cmd.cooldown.is_zero() {
        page = page.field(PageField::new("Cooldown", format!("{}s", cmd.cooldown.as_secs_f64()), true));
    }
    if !cmd.subcommands.is_empty() {
        let subs: Vec<_> = cmd.subcommands.iter().map(|s| format!("`{}`", s.name)).collect();
        page = page.field(PageField::new("Subcommands", subs.join(" "), false));
    }
    if cmd.owner_only {
        page = page.footer("Only usable by the bot owner");
    } else if cmd.guild_only {
        page = page.footer("Only usable in servers");
    }
    page
}
