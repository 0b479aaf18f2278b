//! Error types for the analyses.

use dv_dex::errors::DexError;
use dv_dex::Addr;
use thiserror::Error;

pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("internal error: {0}")]
    Internal(String),

    #[error("dex error: {0}")]
    Dex(#[from] DexError),

    #[error("class not found: {0}")]
    ClassNotFound(String),

    #[error("the method has no code")]
    NoCode,

    #[error(transparent)]
    Verify(#[from] VerifyError),
}

/// A bytecode validation failure: the method is structurally well-formed but
/// semantically invalid under the Dalvik type system.
#[derive(Debug, Error)]
#[error("invalid bytecode at {addr:#06x}: {message}")]
pub struct VerifyError {
    pub addr: usize,
    pub message: String,
}

impl VerifyError {
    #[must_use]
    pub fn new(addr: Addr, message: impl Into<String>) -> Self {
        Self {
            addr: addr.0,
            message: message.into(),
        }
    }
}
