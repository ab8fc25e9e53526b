// commands/mod.rs - Command Module Registry
// Declares the bundled command modules and registers them with a router,
// so main.rs only needs a single call.

pub mod echo; // Echo text back, also declared as a slash command
pub mod help; // Paginated command list and per-command details
pub mod ping; // Round-trip latency check

use crate::router::Router;

/// Registers ping, echo and help. Registering a command with the same name
/// afterwards replaces the built-in one.
pub async fn register_all(router: &Router) {
    router.register_command(ping::command()).await;
    router.register_command(echo::command()).await;
    router.register_command(help::command()).await;
}
