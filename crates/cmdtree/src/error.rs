//! Error types for matching, dispatch and declaration.
//!
//! Errors fall into two families:
//!
//! - [`CommandError`]: raised while executing a line. Structural errors
//!   (too few/too many arguments, unreadable values) and authorization errors
//!   are ordinary user-input outcomes; the host renders text from them.
//! - [`DeclarationError`]: raised while building parameter groups or
//!   registering commands. These are authoring bugs and abort registration.

use thiserror::Error;

use crate::hooks::HookError;

/// A reader could not convert command line text into a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {expected} '{input}': {message}")]
pub struct ReadError {
    /// The text handed to the reader
    pub input: String,
    /// Human-readable name of the expected value type
    pub expected: String,
    /// What went wrong
    pub message: String,
}

impl ReadError {
    /// Creates a new read error.
    pub fn new(
        input: impl Into<String>,
        expected: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            input: input.into(),
            expected: expected.into(),
            message: message.into(),
        }
    }
}

/// An access filter rejected a command or parameter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("permission denied: {message}")]
pub struct FilterError {
    pub message: String,
}

impl FilterError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors surfaced by [`Dispatcher::execute`](crate::Dispatcher::execute).
#[derive(Debug, Error)]
pub enum CommandError {
    /// A required parameter had no tokens left to match.
    #[error("not enough arguments: missing <{missing}>")]
    TooFewArguments { missing: String },

    /// Tokens were left over that no parameter accepted.
    #[error("too many arguments: unexpected '{unexpected}'")]
    TooManyArguments { unexpected: String },

    /// A value could not be read.
    #[error(transparent)]
    Parse(#[from] ReadError),

    /// An access filter rejected the command or one of its parameters.
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// No command is registered under the given name.
    #[error("unknown command '{name}'")]
    CommandNotFound { name: String },

    /// A pre- or post-dispatch hook aborted execution.
    #[error(transparent)]
    Hook(#[from] HookError),

    /// The command handler itself failed.
    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}

impl CommandError {
    /// Returns true if the matching loop may recover by trying another
    /// candidate parameter.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CommandError::Parse(_))
    }

    /// Returns true for errors caused by the shape of the command line.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            CommandError::TooFewArguments { .. }
                | CommandError::TooManyArguments { .. }
                | CommandError::Parse(_)
        )
    }

    /// Returns true if an access filter rejected the command.
    pub fn is_permission(&self) -> bool {
        matches!(self, CommandError::Filter(_))
    }
}

/// Invalid command or parameter declarations, detected at build time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    #[error("parameters '{first}' and '{second}' both consume all remaining tokens")]
    MultipleInfinite { first: String, second: String },

    #[error("parameter '{0}' consumes all remaining tokens but is not the last positional")]
    InfiniteNotLast(String),

    #[error("flag '{0}' declares neither a short nor a long name")]
    FlagWithoutName(String),

    #[error("named parameter '{0}' declares no names")]
    NamedWithoutName(String),

    #[error("parameter '{0}' declares an empty set of accepted values")]
    EmptyChoices(String),

    #[error("parameter '{0}' accepts one of a fixed set of words and must consume exactly one token")]
    FixedValueGreed(String),

    #[error("duplicate parameter name '{0}'")]
    DuplicateParameter(String),

    #[error("command name must not be empty or contain whitespace: '{0}'")]
    InvalidCommandName(String),

    #[error("no command registered at '{0}'")]
    UnknownParent(String),
}
