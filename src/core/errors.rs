//! Command Errors
//!
//! The unified error type returned by processors and the engines.
//! Errors are classified: usage errors cause the engine to print the
//! command's usage text below the error message.

use std::fmt;
use thiserror::Error;

/// A token list rendered the way the shell wrapper shows it: `[a b c]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenList(pub Vec<String>);

impl fmt::Display for TokenList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(" "))
    }
}

impl From<Vec<String>> for TokenList {
    fn from(v: Vec<String>) -> Self {
        TokenList(v)
    }
}

/// Unified error enum for graph execution, completion, and usage walks.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CmdError {
    /// A positional argument or flag did not receive its minimum token count.
    #[error("Argument \"{name}\" requires at least {required} argument, got {got}")]
    NotEnoughArgs {
        name: String,
        required: usize,
        got: usize,
    },

    /// Input tokens were left over after the graph walk finished.
    #[error("Unprocessed extra args: {0}")]
    ExtraArgs(TokenList),

    /// A branch node saw a keyword that matches no branch and has no default.
    #[error("Branching argument must be one of {0}")]
    Branching(TokenList),

    /// A validator rejected an argument value.
    #[error("validation for \"{name}\" failed: {reason}")]
    ValidationFailed { name: String, reason: String },

    /// The type operator could not parse a token into the argument's type.
    #[error("failed to parse argument \"{name}\": {message}")]
    Conversion { name: String, message: String },

    /// A transformer rejected or mangled an argument value.
    #[error("{0}")]
    Transformer(String),

    /// Strict complexecute did not resolve to exactly one suggestion.
    #[error("Complexecute requires exactly one suggestion to be returned for \"{token}\", got {got}: {suggestions}")]
    Complexecute {
        token: String,
        got: usize,
        suggestions: TokenList,
    },

    /// A flag appeared twice in one invocation.
    #[error("flag \"{0}\" already set")]
    DuplicateFlag(String),

    /// A multi-flag token contained runes that are not all known boolean flags.
    #[error("unknown flags in multi-flag token \"{token}\": {unknown}")]
    MultiFlag { token: String, unknown: TokenList },

    /// A child process exited non-zero or could not be spawned.
    #[error("failed to execute shell command: {0}")]
    ShellCommand(String),

    /// Anything else a processor needs to report.
    #[error("{0}")]
    Custom(String),
}

impl CmdError {
    /// Whether the engine should print the command's usage below this error.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            CmdError::NotEnoughArgs { .. } | CmdError::ExtraArgs(_) | CmdError::Branching(_)
        )
    }

    pub fn custom(msg: impl Into<String>) -> Self {
        CmdError::Custom(msg.into())
    }
}

// ============================================================================
// Tests
// ============================================================================
