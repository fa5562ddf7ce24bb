//! Crate-level error type (§7), for callers who want one `Result` alias
//! across component, hook, and codec failures instead of matching on each
//! module's own error enum.

use thiserror::Error;

use crate::component::ComponentError;
use crate::hook::{ChainError, HandlerError};
use crate::message::CodecError;

#[derive(Debug, Error)]
pub enum TesturioError {
    #[error(transparent)]
    Component(#[from] ComponentError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Handler(#[from] HandlerError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

pub type Result<T> = std::result::Result<T, TesturioError>;
