// config.rs - botconfig.txt loading
// KEY=VALUE lines, '#' comments, searched in a few locations relative to the
// working directory so the bot can be started from the repo root or src/.

use std::collections::HashMap;
use std::fs;
use std::time::Duration;

use crate::cooldown;
use crate::error::ConfigError;
use crate::model::{GuildId, UserId};

pub const CONFIG_PATHS: [&str; 4] = ["botconfig.txt", "../botconfig.txt", "../../botconfig.txt", "src/botconfig.txt"];

const PLACEHOLDER_TOKEN: &str = "YOUR_BOT_TOKEN_HERE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    pub token: String,
    pub prefixes: Vec<String>,
    pub owners: Vec<UserId>,
    pub react_timeout: Duration,
    pub embed_colour: u32,
    /// Guilds to sync slash commands into; empty syncs globally
    pub slash_guilds: Vec<GuildId>,
    pub sync_commands: bool,
    pub cooldown_capacity: usize,
    pub log_filter: String,
}

impl BotConfig {
    /// Loads the first botconfig.txt found in `CONFIG_PATHS`, returning it with the path used
    pub fn load() -> Result<(Self, &'static str), ConfigError> {
        for path in CONFIG_PATHS {
            match fs::read_to_string(path) {
                Ok(content) => return Ok((Self::parse(&content)?, path)),
                // try next path
                Err(_) => continue,
            }
        }
        Err(ConfigError::NotFound)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        // Remove BOM if present
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut values = HashMap::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                values.insert(key.trim().to_string(), value.trim().to_string());
            }
        }

        let token = match values.get("DISCORD_TOKEN") {
            Some(token) if token == PLACEHOLDER_TOKEN => return Err(ConfigError::PlaceholderToken),
            Some(token) if !token.is_empty() => token.clone(),
            _ => return Err(ConfigError::MissingToken),
        };

        let prefixes = match values.get("PREFIX") {
            Some(raw) => list(raw).map(String::from).collect(),
            None => vec!["^".to_string()],
        };

        let owners = ids(&values, "BOT_OWNER_ID")?.into_iter().map(UserId).collect();
        let slash_guilds = ids(&values, "SLASH_GUILDS")?.into_iter().map(GuildId).collect();

        let react_timeout = Duration::from_secs(number(&values, "REACT_TIMEOUT_SECS", 900)?);
        let cooldown_capacity = number(&values, "COOLDOWN_CAPACITY", cooldown::DEFAULT_CAPACITY as u64)? as usize;

        let embed_colour = match values.get("EMBED_COLOUR") {
            Some(raw) => u32::from_str_radix(raw.trim_start_matches('#').trim_start_matches("0x"), 16)
                .map_err(|_| invalid("EMBED_COLOUR", raw))?,
            None => 0x303136,
        };

        let sync_commands = match values.get("SYNC_COMMANDS").map(|v| v.to_lowercase()) {
            None => false,
            Some(v) if v == "true" || v == "1" || v == "yes" => true,
            Some(v) if v == "false" || v == "0" || v == "no" => false,
            Some(v) => return Err(invalid("SYNC_COMMANDS", &v)),
        };

        let log_filter = values.get("RUST_LOG").cloned().unwrap_or_else(|| "info".to_string());

        Ok(BotConfig {
            token,
            prefixes,
            owners,
            react_timeout,
            embed_colour,
            slash_guilds,
            sync_commands,
            cooldown_capacity,
            log_filter,
        })
    }
}

fn list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn ids(values: &HashMap<String, String>, key: &str) -> Result<Vec<u64>, ConfigError> {
    match values.get(key) {
        Some(raw) => list(raw)
            .map(|id| id.parse::<u64>().map_err(|_| invalid(key, id)))
            .collect(),
        None => Ok(Vec::new()),
    }
}

fn number(values: &HashMap<String, String>, key: &str, default: u64) -> Result<u64, ConfigError> {
    match values.get(key) {
        Some(raw) => raw.parse().map_err(|_| invalid(key, raw)),
        None => Ok(default),
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
