// ping.rs - Ping Command Module
// Replies immediately, then edits the reply with the measured round trip.
//
// Key Features:
// - Measures how long a reply takes to reach the channel
// - Gives immediate feedback before the measurement is known
//
// Used by: commands/mod.rs (command registration)

// ============================================================================
// IMPORTS
// ============================================================================

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::command::{handler, Command};
use crate::context::Context;
use crate::error::CommandResult;

// ============================================================================
// COMMAND IMPLEMENTATION
// ============================================================================

pub fn command() -> Command {
    Command::new("ping", handler(ping))
        .summary("Test bot connectivity")
        .description("Measures how long the bot takes to get a message to the channel.")
        .usage("ping")
        .cooldown(Duration::from_secs(3))
}

/// Main !!ping command handler
/// Sends a placeholder reply, then edits in the delay in milliseconds
/// Supports:
///   - !!ping
async fn ping(ctx: Arc<Context>) -> CommandResult {
    let start_time = Instant::now();
    let response = ctx.reply("Pong! Calculating delay...").await?;
    let elapsed = start_time.elapsed();

    let updated_content = format!("Pong! Response time: {}ms", elapsed.as_millis());
    if let Err(e) = ctx
        .api()
        .edit_message(
            ctx.message.channel_id,
            response,
            Some(&updated_content),
            None,
            ctx.services.default_mentions,
        )
        .await
    {
        // the first reply already went out
        log::warn!("[PING] Failed to update ping message with delay: {}", e);
    }

    Ok(())
}
