use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("keystore cipher error: {0}")]
    Crypto(String),

    #[error("store is corrupted: {0}")]
    Corruption(String),
}
