// lib.rs - reaction_router
// Prefix command routing with reaction subscriptions and paged embeds on top
// of serenity. `Router` is the entry point; `Handler` plugs it into a client.

pub mod command;
pub mod commands;
pub mod config;
pub mod context;
pub mod cooldown;
pub mod error;
pub mod handler;
pub mod model;
pub mod paginator;
pub mod platform;
pub mod prefix;
pub mod reactions;
pub mod registry;
pub mod router;
pub mod serenity_backend;

#[cfg(test)]
mod testing;

use serenity::prelude::GatewayIntents;

pub use command::{handler as command_handler, Command};
pub use config::BotConfig;
pub use context::{Context, Services};
pub use error::{ApiError, CommandError, CommandResult, ConfigError, ContextError, PaginatorError};
pub use handler::Handler;
pub use model::{EmojiKey, InboundMessage, Page, PageField, ReactionEvent};
pub use paginator::{field_pages, Paginated};
pub use reactions::{callback, ReactionCallback, SubscriptionOptions};
pub use router::{Dispatch, DenyReason, Router};
pub use serenity_backend::SerenityBackend;

/// Gateway intents the router needs to see messages and reactions in guilds and DMs
pub fn required_intents() -> GatewayIntents {
    GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_MESSAGE_REACTIONS
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::DIRECT_MESSAGE_REACTIONS
        | GatewayIntents::MESSAGE_CONTENT
}

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intents_cover_reactions_and_content() {
        let intents = required_intents();
        assert!(intents.contains(GatewayIntents::GUILD_MESSAGE_REACTIONS));
        assert!(intents.contains(GatewayIntents::MESSAGE_CONTENT));
        assert!(!intents.contains(GatewayIntents::GUILD_PRESENCES));
    }
}
