// command.rs - Command definitions
// A command is plain data plus an async handler. Commands are built with the
// chained setters below and handed to the registry, which stamps their id.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use uuid::Uuid;

use crate::context::Context;
use crate::error::CommandResult;
use crate::platform::{CommandDeclaration, CommandOption};

/// Async command body
pub type CommandHandler = Arc<dyn Fn(Arc<Context>) -> BoxFuture<'static, CommandResult> + Send + Sync>;

/// Wraps an async function so it can be used as a command body
pub fn handler<F, Fut>(f: F) -> CommandHandler
where
    F: Fn(Arc<Context>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CommandResult> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

pub struct Command {
    pub name: String,
    pub aliases: Vec<String>,
    pub summary: String,
    pub description: String,
    pub usage: String,

    /// Minimum time between two invocations by the same user, zero for none
    pub cooldown: Duration,
    pub owner_only: bool,
    pub guild_only: bool,

    /// Slash options; `Some` marks the command for slash sync
    pub options: Option<Vec<CommandOption>>,
    pub subcommands: Vec<Arc<Command>>,

    pub(crate) id: Uuid,
    pub(crate) handler: CommandHandler,
}

impl Command {
    pub fn new(name: impl Into<String>, handler: CommandHandler) -> Self {
        Command {
            name: name.into(),
            aliases: Vec::new(),
            summary: String::new(),
            description: String::new(),
            usage: String::new(),
            cooldown: Duration::ZERO,
            owner_only: false,
            guild_only: false,
            options: None,
            subcommands: Vec::new(),
            id: Uuid::nil(),
            handler,
        }
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn owner_only(mut self) -> Self {
        self.owner_only = true;
        self
    }

    pub fn guild_only(mut self) -> Self {
        self.guild_only = true;
        self
    }

    pub fn options(mut self, options: Vec<CommandOption>) -> Self {
        self.options = Some(options);
        self
    }

    pub fn subcommand(mut self, mut sub: Command) -> Self {
        sub.id = Uuid::new_v4();
        self.subcommands.push(Arc::new(sub));
        self
    }

    /// Process-unique id; nil until the command is registered
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Whether `name` (already lowercased) is this command's name or an alias
    pub fn answers_to(&self, name: &str) -> bool {
        self.name.to_lowercase() == name || self.aliases.iter().any(|a| a.to_lowercase() == name)
    }

    pub fn find_subcommand(&self, name: &str) -> Option<Arc<Command>> {
        let name = name.to_lowercase();
        self.subcommands.iter().find(|s| s.answers_to(&name)).cloned()
    }

    pub(crate) fn run(&self, ctx: Arc<Context>) -> BoxFuture<'static, CommandResult> {
        (self.handler)(ctx)
    }

    /// Slash declaration, if this command has an option schema
    pub fn declaration(&self) -> Option<CommandDeclaration> {
        let options = self.options.as_ref()?;
        Some(CommandDeclaration {
            name: self.name.to_lowercase(),
            description: self.summary.clone(),
            options: options.clone(),
        })
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("id", &self.id)
            .field("cooldown", &self.cooldown)
            .field("owner_only", &self.owner_only)
            .field("guild_only", &self.guild_only)
            .field("subcommands", &self.subcommands.len())
            .finish()
    }
}
