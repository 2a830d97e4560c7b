//! Error types for the search engine.

use thiserror::Error;

/// Errors surfaced by the searchers, the comparison runner and configuration loading.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum MctsError {
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// A search was requested from a state that is already terminal.
    #[error("search started from a terminal state")]
    TerminalState,

    /// The root state is not terminal but offers no legal action.
    #[error("no legal actions available")]
    NoLegalActions,

    #[error("recommended action {action} is not legal in the current state")]
    IllegalAction { action: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MctsError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        MctsError::InvalidConfiguration {
            message: message.into(),
        }
    }
}

/// Failures of an abstraction rebuild.
///
/// These never escape a search: the engine logs them and keeps the identity
/// resolution for the batch window.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AbstractionError {
    #[error("refinement produced no classes")]
    EmptyPartition,

    #[error("refinement did not converge within {rounds} rounds")]
    RoundCapExceeded { rounds: usize },
}

pub type Result<T> = std::result::Result<T, MctsError>;
