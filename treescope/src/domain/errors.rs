//! Structured error types for treescope
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! None of these escape the public query and commit boundaries: callers log
//! them and degrade to an empty result.

use super::types::{NodeId, RequestId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("Empty selector")]
    Empty,

    #[error("Unterminated string starting at position {0}")]
    UnterminatedString(usize),

    #[error("Unexpected character '{found}' at position {pos}")]
    UnexpectedChar { found: char, pos: usize },

    #[error("Unexpected end of selector at position {0}")]
    UnexpectedEnd(usize),

    #[error("Unknown pseudo-class ':{name}' at position {pos}")]
    UnknownPseudo { name: String, pos: usize },

    #[error("Invalid index '{value}' at position {pos}")]
    InvalidIndex { value: String, pos: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackError {
    #[error("{0} not found in tree")]
    MissingNode(NodeId),

    #[error("Alternate {alternate} of {node} not found in tree")]
    MissingAlternate { node: NodeId, alternate: NodeId },

    #[error("Tracking panicked while processing a commit: {0}")]
    Panicked(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PendingError {
    #[error("Request {0} timed out after {1:?}")]
    TimedOut(RequestId, std::time::Duration),

    #[error("Request {0} was dropped before it completed")]
    Dropped(RequestId),

    #[error("Backend refused request {0}")]
    Refused(RequestId),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFailed(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Invalid(#[from] serde_json::Error),
}
