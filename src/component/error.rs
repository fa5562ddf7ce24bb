//! Component- and transport-level errors (§7).

use thiserror::Error;

use crate::hook::{ChainError, HandlerError};

/// Errors surfaced by a `Component`: build-time misuse, transport failure,
/// or a handler exception bubbled up from the hook chain (§7).
#[derive(Debug, Error, Clone)]
pub enum ComponentError {
    /// Calling a method the transport's `TransportCharacteristics` does not
    /// support, sending before `start`, or a duplicate registration.
    #[error("{0}")]
    Misuse(String),

    /// Connection refused, disconnect mid-request, and similar transport
    /// failures.
    #[error("transport failure: {0}")]
    Transport(String),

    /// A handler in a fired hook's chain raised an exception (not the drop
    /// sentinel). Also recorded on the component's `unhandled_errors`.
    #[error("unhandled error in hook handler: {0}")]
    Handler(#[from] HandlerError),

    /// An `assert` handler's predicate returned `false`.
    #[error("{0}")]
    AssertionFailed(String),
}

impl ComponentError {
    pub fn misuse(message: impl Into<String>) -> Self {
        Self::Misuse(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }
}

impl From<ChainError> for ComponentError {
    fn from(value: ChainError) -> Self {
        match value {
            ChainError::AssertionFailed { description, value } => {
                ComponentError::AssertionFailed(match description {
                    Some(description) => format!("{description}: {value}"),
                    None => format!("assertion failed: {value}"),
                })
            }
            ChainError::HandlerException(e) => ComponentError::Handler(e),
        }
    }
}
