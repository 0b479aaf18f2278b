//! Error types for the method model.

use crate::Addr;
use thiserror::Error;

/// Shorthand for results produced by the method model.
pub type DexResult<T> = Result<T, DexError>;

/// Everything that can go wrong inside the method model.
#[derive(Debug, Error)]
pub enum DexError {
    #[error("internal error: {0}")]
    Internal(String),

    /// A string that does not follow the type descriptor grammar.
    #[error("not a valid type descriptor: {0:?}")]
    BadDescriptor(String),

    /// A type was used in a position its shape does not allow
    /// (e.g. `void` as a value type, a primitive as a class name).
    #[error("invalid type")]
    InvalidType,

    #[error("no instruction at code address {0:#x}")]
    InstructionNotFound(Addr),
}
