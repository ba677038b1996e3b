//! Signing-request errors.

use pangea_types::ChainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EsrError {
    #[error("not a signing request uri: {0}")]
    InvalidScheme(String),

    #[error("invalid base64url payload: {0}")]
    Base64(String),

    #[error("unsupported signing request version {0}")]
    UnsupportedVersion(u8),

    #[error("failed to inflate request body: {0}")]
    Compression(String),

    #[error("malformed signing request: {0}")]
    Malformed(String),

    #[error("unknown chain alias {0}")]
    UnknownChainAlias(u8),

    #[error("Identity request not supported yet")]
    IdentityUnsupported,

    #[error("no ABI available for contract {0}")]
    MissingAbi(String),

    #[error(transparent)]
    Chain(#[from] ChainError),
}
