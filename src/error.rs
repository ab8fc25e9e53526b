// error.rs - Error types for the router
// Every fallible boundary of the crate has its own enum so callers can tell
// construction failures apart from REST failures.

use thiserror::Error;

use crate::context::Context;

/// Result type returned by command bodies
pub type CommandResult = Result<(), CommandError>;

/// Boxed error a command body may return
pub type CommandError = Box<dyn std::error::Error + Send + Sync>;

/// Failures talking to the chat platform
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("discord api error: {0}")]
    Serenity(#[from] serenity::Error),

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("not found: {0}")]
    NotFound(String),
}

/// Failures building an invocation context from a message
///
/// The resolution variants carry the partially built context so the caller
/// can still inspect who sent what.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("context: message did not start with a known prefix")]
    NoPrefixMatch,

    #[error("context: message was empty")]
    EmptyMessage,

    #[error("context: couldn't get channel: {source}")]
    ChannelResolutionFailed {
        partial: Box<Context>,
        #[source]
        source: ApiError,
    },

    #[error("context: couldn't get guild: {source}")]
    GuildResolutionFailed {
        partial: Box<Context>,
        #[source]
        source: ApiError,
    },
}

impl ContextError {
    /// The partially built context, for the resolution failures
    pub fn partial(&self) -> Option<&Context> {
        match self {
            ContextError::ChannelResolutionFailed { partial, .. }
            | ContextError::GuildResolutionFailed { partial, .. } => Some(partial),
            _ => None,
        }
    }

    /// Whether this error only means "not a command", rather than a lookup failure
    pub fn is_not_a_command(&self) -> bool {
        matches!(self, ContextError::NoPrefixMatch | ContextError::EmptyMessage)
    }
}

#[derive(Debug, Error)]
pub enum PaginatorError {
    #[error("paginator: no pages")]
    NoPages,

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no botconfig.txt file found in any expected location (., .., ../.., src/)")]
    NotFound,

    #[error("DISCORD_TOKEN not found in botconfig.txt")]
    MissingToken,

    #[error("DISCORD_TOKEN in botconfig.txt is set to a placeholder value")]
    PlaceholderToken,

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}
