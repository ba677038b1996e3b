//! Session-layer errors.
//!
//! Network failures propagate up so the caller can apply its own retry
//! policy; the session layer never retries on its own. Callback
//! delivery failures are deliberately absent here: a failed POST after
//! a successful broadcast is logged, not raised.

use pangea_esr::EsrError;
use pangea_types::ChainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("network error: {0}")]
    Network(String),

    #[error("unrecognized wallet uri: {0}")]
    UnrecognizedUri(String),

    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    #[error("relay error: {0}")]
    Relay(String),

    #[error("session not initialized")]
    NotInitialized,

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Esr(#[from] EsrError),

    #[error("store error: {0}")]
    Store(String),
}

impl From<pangea_store::StoreError> for SessionError {
    fn from(e: pangea_store::StoreError) -> Self {
        SessionError::Store(e.to_string())
    }
}
