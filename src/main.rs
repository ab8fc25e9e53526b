// main.rs - Bot entry point
// Loads botconfig.txt, wires the router into a serenity client and runs until
// Ctrl+C.

use std::sync::Arc;
use std::time::Duration;

use serenity::client::Client;
use serenity::http::Http;
use tokio::signal;

use reaction_router::{commands, required_intents, BotConfig, Handler, Router, SerenityBackend};

const COOLDOWN_SWEEP: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() {
    let config = match BotConfig::load() {
        Ok((config, path)) => {
            println!("✅ Configuration loaded from {}", path);
            config
        }
        Err(error) => {
            eprintln!("❌ Failed to load botconfig.txt: {}", error);
            eprintln!("Create a botconfig.txt file in the project root with: DISCORD_TOKEN=your_token_here and PREFIX=^");
            return;
        }
    };

    // Initialize logger - must be done before any logging calls
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_filter.as_str()))
        .format_timestamp_secs()
        .init();
    log::info!("🚀 reaction_router {} starting up", reaction_router::version());

    let http = Arc::new(Http::new(&config.token));
    let backend = Arc::new(SerenityBackend::new(http));
    let router = Arc::new(Router::from_config(&config, backend.clone(), backend.clone()));
    commands::register_all(&router).await;
    println!("🤖 Starting bot with prefix: '{}'", config.prefixes.join("', '"));

    let sync_guilds = config.sync_commands.then(|| config.slash_guilds.clone());
    let handler = Handler::new(router.clone(), backend.clone(), sync_guilds);

    let mut client = match Client::builder(&config.token, required_intents())
        .event_handler(handler)
        .await
    {
        Ok(client) => client,
        Err(e) => {
            log::error!("❌ Error creating Discord client: {:?}", e);
            eprintln!("❌ Error creating Discord client: {:?}", e);
            eprintln!("Check your token in botconfig.txt file");
            return;
        }
    };
    backend.attach_cache(client.cache_and_http.cache.clone());

    let sweeper = {
        let router = router.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(COOLDOWN_SWEEP);
            loop {
                interval.tick().await;
                let purged = router.purge_cooldowns().await;
                if purged > 0 {
                    log::debug!("[MAIN] Purged {} expired cooldowns", purged);
                }
            }
        })
    };

    println!("🚀 Bot is running...");
    println!("💡 Press Ctrl+C to stop");
    tokio::select! {
        _ = signal::ctrl_c() => {
            println!("\n⏹️ Stopping bot gracefully...");
        }
        result = client.start() => {
            if let Err(why) = result {
                log::error!("❌ Client error: {:?}", why);
                eprintln!("❌ Client error: {:?}", why);
            }
        }
    }

    sweeper.abort();
    client.shard_manager.lock().await.shutdown_all().await;
    println!("✅ Bot stopped");
}
