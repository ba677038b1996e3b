//! Argon2id encrypted key file.
//!
//! Every stored key is encrypted with a key derived from the wallet
//! password:
//! 1. Argon2id derives a 32-byte encryption key from password + salt
//! 2. AES-256-GCM encrypts the 32-byte private scalar under a random
//!    nonce
//! 3. Entries are stored in one JSON file alongside every parameter
//!    needed to decrypt them later
//!
//! Salt and nonce are fresh per entry, so two identical keys never
//! produce the same ciphertext.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

use pangea_chain::ChainPrivateKey;
use pangea_types::ChainFamily;

use crate::error::StoreError;
use crate::keys::KeyStore;

/// Argon2id parameters: 64 MB memory, 3 iterations, 1 lane.
const ARGON2_MEMORY_KIB: u32 = 65536;
const ARGON2_ITERATIONS: u32 = 3;
const ARGON2_PARALLELISM: u32 = 1;
const ARGON2_OUTPUT_LEN: usize = 32;

const SALT_LEN: usize = 32;
/// AES-GCM nonce length (96 bits).
const NONCE_LEN: usize = 12;

const KEYSTORE_VERSION: u32 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
struct KeystoreFile {
    version: u32,
    keys: BTreeMap<String, KeystoreEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct KeystoreEntry {
    family: ChainFamily,
    crypto: KeystoreCrypto,
}

/// All parameters needed to decrypt an entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct KeystoreCrypto {
    cipher: String,
    kdf: String,
    kdf_params: KdfParams,
    /// Hex-encoded salt.
    salt: String,
    /// Hex-encoded nonce.
    nonce: String,
    /// Hex-encoded ciphertext.
    ciphertext: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct KdfParams {
    memory: u32,
    iterations: u32,
    parallelism: u32,
}

/// A password-protected [`KeyStore`] backed by a single JSON file.
pub struct FileKeyStore {
    path: PathBuf,
    /// Wiped on drop along with the keys derived from it.
    password: Zeroizing<String>,
    entries: RwLock<BTreeMap<String, KeystoreEntry>>,
}

impl FileKeyStore {
    /// Open the keystore at `path`, creating an empty one if the file
    /// does not exist yet.
    ///
    /// A wrong password is not detected here: entries are only
    /// decrypted on [`find_by_name`](KeyStore::find_by_name), which
    /// fails with [`StoreError::Crypto`] then.
    pub fn open(path: impl Into<PathBuf>, password: &str) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = if path.exists() {
            let json = fs::read_to_string(&path)
                .map_err(|e| StoreError::Backend(format!("failed to read keystore: {e}")))?;
            let file: KeystoreFile = serde_json::from_str(&json)
                .map_err(|e| StoreError::Serialization(format!("invalid keystore JSON: {e}")))?;
            if file.version != KEYSTORE_VERSION {
                return Err(StoreError::Corruption(format!(
                    "unsupported keystore version {}",
                    file.version
                )));
            }
            file.keys
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            password: Zeroizing::new(password.to_string()),
            entries: RwLock::new(entries),
        })
    }

    /// Write-then-rename, so a crash mid-save leaves the old file
    /// intact.
    fn save(&self, entries: &BTreeMap<String, KeystoreEntry>) -> Result<(), StoreError> {
        let file = KeystoreFile {
            version: KEYSTORE_VERSION,
            keys: entries.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)
            .map_err(|e| StoreError::Backend(format!("failed to write keystore: {e}")))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| StoreError::Backend(format!("failed to replace keystore: {e}")))?;
        Ok(())
    }

    fn encrypt_entry(&self, key: &ChainPrivateKey) -> Result<KeystoreEntry, StoreError> {
        let mut rng = rand::rng();
        let mut salt = [0u8; SALT_LEN];
        rng.fill_bytes(&mut salt);
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rng.fill_bytes(&mut nonce_bytes);

        let kdf_params = KdfParams {
            memory: ARGON2_MEMORY_KIB,
            iterations: ARGON2_ITERATIONS,
            parallelism: ARGON2_PARALLELISM,
        };
        let mut derived = derive_key(&self.password, &salt, &kdf_params)?;
        let cipher = Aes256Gcm::new_from_slice(&derived)
            .map_err(|e| StoreError::Crypto(format!("AES key init failed: {e}")))?;
        derived.zeroize();

        let mut material = key.to_bytes();
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), material.as_ref())
            .map_err(|e| StoreError::Crypto(format!("encryption failed: {e}")))?;
        material.zeroize();

        Ok(KeystoreEntry {
            family: key.family(),
            crypto: KeystoreCrypto {
                cipher: "aes-256-gcm".to_string(),
                kdf: "argon2id".to_string(),
                kdf_params,
                salt: hex::encode(salt),
                nonce: hex::encode(nonce_bytes),
                ciphertext: hex::encode(&ciphertext),
            },
        })
    }

    fn decrypt_entry(&self, entry: &KeystoreEntry) -> Result<ChainPrivateKey, StoreError> {
        let crypto = &entry.crypto;
        if crypto.cipher != "aes-256-gcm" {
            return Err(StoreError::Corruption(format!(
                "unsupported cipher {}",
                crypto.cipher
            )));
        }
        if crypto.kdf != "argon2id" {
            return Err(StoreError::Corruption(format!(
                "unsupported kdf {}",
                crypto.kdf
            )));
        }
        let salt = hex::decode(&crypto.salt)
            .map_err(|e| StoreError::Corruption(format!("invalid salt hex: {e}")))?;
        let nonce_bytes = hex::decode(&crypto.nonce)
            .map_err(|e| StoreError::Corruption(format!("invalid nonce hex: {e}")))?;
        if nonce_bytes.len() != NONCE_LEN {
            return Err(StoreError::Corruption(format!(
                "invalid nonce length {}",
                nonce_bytes.len()
            )));
        }
        let ciphertext = hex::decode(&crypto.ciphertext)
            .map_err(|e| StoreError::Corruption(format!("invalid ciphertext hex: {e}")))?;

        let mut derived = derive_key(&self.password, &salt, &crypto.kdf_params)?;
        let cipher = Aes256Gcm::new_from_slice(&derived)
            .map_err(|e| StoreError::Crypto(format!("AES key init failed: {e}")))?;
        derived.zeroize();

        let mut plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
            .map_err(|_| {
                StoreError::Crypto("decryption failed: wrong password or corrupted entry".to_string())
            })?;
        if plaintext.len() != 32 {
            let len = plaintext.len();
            plaintext.zeroize();
            return Err(StoreError::Corruption(format!(
                "decrypted key has {len} bytes, expected 32"
            )));
        }
        let mut material = [0u8; 32];
        material.copy_from_slice(&plaintext);
        plaintext.zeroize();

        let key = ChainPrivateKey::from_bytes(entry.family, &material)
            .map_err(|e| StoreError::Corruption(e.to_string()));
        material.zeroize();
        key
    }
}

impl KeyStore for FileKeyStore {
    fn find_by_name(&self, name: &str) -> Result<Option<ChainPrivateKey>, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::Backend("keystore lock poisoned".to_string()))?;
        match entries.get(name) {
            Some(entry) => Ok(Some(self.decrypt_entry(entry)?)),
            None => Ok(None),
        }
    }

    fn emplace(&self, name: &str, key: ChainPrivateKey) -> Result<(), StoreError> {
        let entry = self.encrypt_entry(&key)?;
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StoreError::Backend("keystore lock poisoned".to_string()))?;
        entries.insert(name.to_string(), entry);
        self.save(&entries)?;
        tracing::debug!(slot = name, "stored encrypted key");
        Ok(())
    }

    fn names(&self) -> Result<Vec<String>, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::Backend("keystore lock poisoned".to_string()))?;
        Ok(entries.keys().cloned().collect())
    }

    fn delete_all(&self) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StoreError::Backend("keystore lock poisoned".to_string()))?;
        entries.clear();
        self.save(&entries)?;
        tracing::info!("keystore wiped");
        Ok(())
    }
}

fn derive_key(password: &str, salt: &[u8], params: &KdfParams) -> Result<[u8; 32], StoreError> {
    let params = Params::new(
        params.memory,
        params.iterations,
        params.parallelism,
        Some(ARGON2_OUTPUT_LEN),
    )
    .map_err(|e| StoreError::Crypto(format!("Argon2 params error: {e}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let mut output = [0u8; 32];
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut output)
        .map_err(|e| StoreError::Crypto(format!("Argon2 hashing failed: {e}")))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pangea_types::ChainId;
    use std::path::Path;

    fn antelope_key() -> ChainPrivateKey {
        let chain_id = ChainId::Antelope(
            "8a34ec7df1b8cd06ff4a8abbaa7cc50300823350cadc59ab296cb00d104d2b8f"
                .parse()
                .unwrap(),
        );
        ChainPrivateKey::from_seed("file store tests", &chain_id)
    }

    fn ethereum_key() -> ChainPrivateKey {
        ChainPrivateKey::from_seed("file store tests", &ChainId::Ethereum(11155111))
    }

    fn store_path(dir: &Path) -> PathBuf {
        dir.join("keys.json")
    }

    #[test]
    fn keys_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(dir.path());

        let store = FileKeyStore::open(&path, "hunter2").unwrap();
        store.emplace("pangea-testnet", antelope_key()).unwrap();
        store.emplace("sepolia", ethereum_key()).unwrap();
        drop(store);

        let store = FileKeyStore::open(&path, "hunter2").unwrap();
        assert_eq!(store.names().unwrap(), ["pangea-testnet", "sepolia"]);

        let key = store.find_by_name("pangea-testnet").unwrap().unwrap();
        assert_eq!(key.family(), ChainFamily::Antelope);
        assert_eq!(key.to_bytes(), antelope_key().to_bytes());

        let key = store.find_by_name("sepolia").unwrap().unwrap();
        assert_eq!(key.family(), ChainFamily::Ethereum);
    }

    #[test]
    fn wrong_password_fails_closed() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(dir.path());

        let store = FileKeyStore::open(&path, "correct-password").unwrap();
        store.emplace("sepolia", ethereum_key()).unwrap();
        drop(store);

        let store = FileKeyStore::open(&path, "wrong-password").unwrap();
        let err = store.find_by_name("sepolia").unwrap_err();
        assert!(matches!(err, StoreError::Crypto(_)));
    }

    #[test]
    fn identical_keys_get_distinct_ciphertexts() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyStore::open(store_path(dir.path()), "pw").unwrap();
        let a = store.encrypt_entry(&ethereum_key()).unwrap();
        let b = store.encrypt_entry(&ethereum_key()).unwrap();
        assert_ne!(a.crypto.salt, b.crypto.salt);
        assert_ne!(a.crypto.nonce, b.crypto.nonce);
        assert_ne!(a.crypto.ciphertext, b.crypto.ciphertext);
    }

    #[test]
    fn delete_all_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(dir.path());

        let store = FileKeyStore::open(&path, "pw").unwrap();
        store.emplace("sepolia", ethereum_key()).unwrap();
        store.delete_all().unwrap();
        drop(store);

        let store = FileKeyStore::open(&path, "pw").unwrap();
        assert!(store.names().unwrap().is_empty());
        assert!(store.find_by_name("sepolia").unwrap().is_none());
    }

    #[test]
    fn file_records_cipher_and_kdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(dir.path());
        let store = FileKeyStore::open(&path, "pw").unwrap();
        store.emplace("sepolia", ethereum_key()).unwrap();

        let json = fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"aes-256-gcm\""));
        assert!(json.contains("\"argon2id\""));
        assert!(json.contains("\"ethereum\""));
        // Raw key material must never appear.
        let raw = hex::encode(ethereum_key().to_bytes());
        assert!(!json.contains(&raw));
    }

    #[test]
    fn tampered_entries_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(dir.path());
        let store = FileKeyStore::open(&path, "pw").unwrap();
        store.emplace("sepolia", ethereum_key()).unwrap();
        drop(store);

        let json = fs::read_to_string(&path).unwrap();
        let mut file: serde_json::Value = serde_json::from_str(&json).unwrap();
        file["keys"]["sepolia"]["crypto"]["salt"] = "zzz".into();
        fs::write(&path, serde_json::to_string(&file).unwrap()).unwrap();

        let store = FileKeyStore::open(&path, "pw").unwrap();
        let err = store.find_by_name("sepolia").unwrap_err();
        assert!(matches!(err, StoreError::Corruption(_)));
    }
}
