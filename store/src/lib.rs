//! Storage backends for the Pangea wallet.
//!
//! Narrow trait seams over whatever the host app persists with:
//! [`KeyStore`] for signing keys and [`AssetStore`] for cached balance
//! rows. In-memory implementations back tests and ephemeral sessions;
//! [`FileKeyStore`] keeps keys encrypted at rest behind a wallet
//! password.

pub mod assets;
pub mod error;
pub mod file;
pub mod keys;

pub use assets::{AssetStore, MemoryAssetStore, StoredAsset};
pub use error::StoreError;
pub use file::FileKeyStore;
pub use keys::{KeyStore, MemoryKeyStore};
