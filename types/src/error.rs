//! Common error type shared across crates.

use thiserror::Error;

/// Errors raised by chain lookups, codecs, signing, and network calls.
///
/// The enum is closed on purpose: callers match on variants instead of
/// inspecting message strings.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("network error: {0}")]
    Network(String),

    #[error("unsupported chain: {0}")]
    UnsupportedChain(String),

    #[error("transaction authorization failed: {0}")]
    AuthorizationFailure(String),

    #[error("no key found for {account} on {chain}")]
    KeyNotFound { account: String, chain: String },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("native token not set for chain {0}")]
    NativeTokenNotSet(String),

    #[error("account not found for chain {0}")]
    AccountNotFound(String),

    #[error("token mismatch: expected {expected}, found {found}")]
    TokenMismatch { expected: String, found: String },

    #[error("chain id mismatch: expected {expected}, found {found}")]
    ChainIdMismatch { expected: String, found: String },

    #[error("transaction has multiple operations; inspect operations individually")]
    MultipleOperations,

    #[error("invalid account name: {0}")]
    InvalidName(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("transaction expired")]
    Expired,
}
