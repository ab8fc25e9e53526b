// prefix.rs - Deciding whether a message is addressed to the bot

use once_cell::sync::OnceCell;

use crate::model::UserId;

/// Returns the byte length of the prefix a message starts with, if any
pub trait Prefixer: Send + Sync {
    fn match_prefix(&self, content: &str) -> Option<usize>;
}

impl<F> Prefixer for F
where
    F: Fn(&str) -> Option<usize> + Send + Sync,
{
    fn match_prefix(&self, content: &str) -> Option<usize> {
        self(content)
    }
}

/// Case-insensitive literal prefixes, checked in configured order.
///
/// The first prefix that matches wins, even if a later one is longer.
/// Mention prefixes are appended once the bot user is known.
pub struct DefaultPrefixer {
    prefixes: Vec<String>,
    mentions: OnceCell<[String; 2]>,
}

impl DefaultPrefixer {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DefaultPrefixer {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
            mentions: OnceCell::new(),
        }
    }

    /// Accept `<@id>` and `<@!id>` as prefixes from now on
    pub fn add_mention(&self, bot: UserId) {
        let _ = self
            .mentions
            .set([format!("<@{}>", bot.0), format!("<@!{}>", bot.0)]);
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.prefixes
            .iter()
            .chain(self.mentions.get().into_iter().flatten())
            .map(String::as_str)
    }
}

impl Prefixer for DefaultPrefixer {
    fn match_prefix(&self, content: &str) -> Option<usize> {
        self.prefixes()
            .filter(|p| !p.is_empty())
            .find(|p| {
                content
                    .get(..p.len())
                    .map_or(false, |head| head.to_lowercase() == p.to_lowercase())
            })
            .map(str::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_case_insensitively() {
        let prefixer = DefaultPrefixer::new(["bot!"]);
        assert_eq!(prefixer.match_prefix("BOT!ping"), Some(4));
        assert_eq!(prefixer.match_prefix("bot!ping"), Some(4));
        assert_eq!(prefixer.match_prefix("ping"), None);
    }

    #[test]
    fn test_first_configured_prefix_wins() {
        let prefixer = DefaultPrefixer::new(["!", "!!"]);
        assert_eq!(prefixer.match_prefix("!!ping"), Some(1));
    }

    #[test]
    fn test_mention_prefixes_after_bot_known() {
        let prefixer = DefaultPrefixer::new(["^"]);
        assert_eq!(prefixer.match_prefix("<@42> ping"), None);

        prefixer.add_mention(UserId(42));
        assert_eq!(prefixer.match_prefix("<@42> ping"), Some(5));
        assert_eq!(prefixer.match_prefix("<@!42> ping"), Some(6));
    }

    #[test]
    fn test_does_not_split_multibyte_characters() {
        let prefixer = DefaultPrefixer::new(["ab"]);
        assert_eq!(prefixer.match_prefix("ä"), None);
    }

    #[test]
    fn test_closures_are_prefixers() {
        let prefixer = |content: &str| content.starts_with('$').then_some(1);
        assert_eq!(prefixer.match_prefix("$ping"), Some(1));
        assert_eq!(prefixer.match_prefix("ping"), None);
    }
}
