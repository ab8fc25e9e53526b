// registry.rs - Command registry
// Maps every lowercased name and alias to its command. A later registration
// that reuses a name or alias takes that key over from the earlier command.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::command::Command;

#[derive(Default)]
pub struct CommandRegistry {
    commands: RwLock<HashMap<String, Arc<Command>>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command under its name and all aliases and returns the shared handle
    pub async fn register(&self, mut cmd: Command) -> Arc<Command> {
        cmd.id = Uuid::new_v4();
        let cmd = Arc::new(cmd);

        let mut commands = self.commands.write().await;
        let keys = std::iter::once(&cmd.name).chain(cmd.aliases.iter());
        for key in keys {
            let key = key.to_lowercase();
            if let Some(previous) = commands.insert(key.clone(), cmd.clone()) {
                if previous.id != cmd.id {
                    log::debug!(
                        "[REGISTRY] '{}' now resolves to '{}' instead of '{}'",
                        key,
                        cmd.name,
                        previous.name
                    );
                }
            }
        }

        cmd
    }

    /// Case-insensitive lookup by name or alias
    pub async fn lookup(&self, name: &str) -> Option<Arc<Command>> {
        self.commands.read().await.get(&name.to_lowercase()).cloned()
    }

    /// Every distinct command still reachable under at least one key, sorted by name
    pub async fn list(&self) -> Vec<Arc<Command>> {
        let commands = self.commands.read().await;
        let mut seen = HashMap::new();
        for cmd in commands.values() {
            seen.entry(cmd.id).or_insert_with(|| cmd.clone());
        }

        let mut list: Vec<_> = seen.into_values().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    /// Distinct commands that carry a slash option schema
    pub async fn slash_commands(&self) -> Vec<Arc<Command>> {
        self.list()
            .await
            .into_iter()
            .filter(|cmd| cmd.options.is_some())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::handler;
    use crate::platform::{CommandOption, OptionKind};

    fn noop(name: &str) -> Command {
        Command::new(name, handler(|_ctx| async { Ok(()) }))
    }

    #[tokio::test]
    async fn test_lookup_is_case_insensitive() {
        let registry = CommandRegistry::new();
        registry.register(noop("Greet").aliases(["Hi"])).await;

        assert_eq!(registry.lookup("greet").await.unwrap().name, "Greet");
        assert_eq!(registry.lookup("GREET").await.unwrap().name, "Greet");
        assert_eq!(registry.lookup("hI").await.unwrap().name, "Greet");
        assert!(registry.lookup("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_alias_collision_resolves_to_last_registered() {
        let registry = CommandRegistry::new();
        let first = registry.register(noop("first").aliases(["shared"])).await;
        let second = registry.register(noop("second").aliases(["shared"])).await;

        let found = registry.lookup("shared").await.unwrap();
        assert_eq!(found.id(), second.id());
        assert_ne!(found.id(), first.id());
        // the first command keeps its own name
        assert_eq!(registry.lookup("first").await.unwrap().id(), first.id());
    }

    #[tokio::test]
    async fn test_register_assigns_unique_ids() {
        let registry = CommandRegistry::new();
        let a = registry.register(noop("a")).await;
        let b = registry.register(noop("b")).await;

        assert!(!a.id().is_nil());
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn test_list_deduplicates_aliases() {
        let registry = CommandRegistry::new();
        registry.register(noop("ping").aliases(["p", "pong"])).await;
        registry
            .register(noop("echo").options(vec![CommandOption::new(OptionKind::String, "message", "text")]))
            .await;

        let names: Vec<_> = registry.list().await.iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["echo", "ping"]);

        let slash = registry.slash_commands().await;
        assert_eq!(slash.len(), 1);
        assert_eq!(slash[0].name, "echo");
    }
}
