//! Cryptographic primitives for the Pangea wallet.
//!
//! - **secp256k1** (k256) for signing on both chain families
//! - **Keccak-256** for Ethereum addresses and transaction digests
//! - **SHA-256** for Antelope signing digests and seed-based key derivation
//! - Antelope `PUB_K1_` / `SIG_K1_` text encodings with RIPEMD-160 checksums

pub mod antelope;
pub mod ethereum;
pub mod hash;
pub mod keys;

pub use antelope::{
    public_key_from_string, public_key_to_string, sign_canonical, AntelopeSignature,
};
pub use ethereum::{ethereum_address, recover_public_key, sign_prehash, RecoverableSignature};
pub use hash::{keccak256, sha256, sha256_multi};
pub use keys::{generate_private_key, private_key_from_seed, PrivateKey, PublicKey};
