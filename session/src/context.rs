//! Shared session dependencies.
//!
//! Both session types receive one [`SessionContext`] carrying the chain
//! registry and the wallet's storage and transport seams. Everything is
//! passed in explicitly; the session layer holds no globals.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use pangea_chain::{Chain, ChainPrivateKey, ChainRegistry, TransactionBroadcaster};
use pangea_store::KeyStore;
use pangea_types::ChainId;

use crate::error::SessionError;

/// Answers "is the device online right now?".
///
/// Session initialization probes connectivity before constructing relay
/// state, so a dead network surfaces as an error instead of a hang.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_online(&self) -> bool;
}

/// Probe that HEADs a well-known URL with a short timeout.
pub struct HttpProbe {
    http_client: reqwest::Client,
    url: String,
}

impl HttpProbe {
    pub fn new(url: &str) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .connect_timeout(Duration::from_secs(3))
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl ConnectivityProbe for HttpProbe {
    async fn is_online(&self) -> bool {
        self.http_client.head(&self.url).send().await.is_ok()
    }
}

/// Delivers signing-request callbacks as JSON POSTs.
///
/// Returns the HTTP status so callers can log non-2xx deliveries; a
/// delivery failure after a successful broadcast is never an error.
#[async_trait]
pub trait CallbackClient: Send + Sync {
    async fn post_json(&self, url: &str, body: &Value) -> Result<u16, SessionError>;
}

pub struct HttpCallbackClient {
    http_client: reqwest::Client,
}

impl HttpCallbackClient {
    pub fn new() -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();
        Self { http_client }
    }
}

impl Default for HttpCallbackClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CallbackClient for HttpCallbackClient {
    async fn post_json(&self, url: &str, body: &Value) -> Result<u16, SessionError> {
        let response = self
            .http_client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| SessionError::Network(e.to_string()))?;
        Ok(response.status().as_u16())
    }
}

/// The wallet's on-chain account name per chain.
///
/// Ethereum addresses fall out of the stored key, but an Antelope
/// account name has no derivable relationship to its key; the host app
/// registers it here after account creation or login.
#[derive(Default)]
pub struct AccountDirectory {
    names: RwLock<HashMap<ChainId, String>>,
}

impl AccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, chain_id: ChainId, name: &str) {
        if let Ok(mut names) = self.names.write() {
            names.insert(chain_id, name.to_string());
        }
    }

    pub fn find(&self, chain_id: &ChainId) -> Option<String> {
        self.names.read().ok()?.get(chain_id).cloned()
    }

    pub fn clear(&self) {
        if let Ok(mut names) = self.names.write() {
            names.clear();
        }
    }
}

/// Everything a session needs, passed by reference.
#[derive(Clone)]
pub struct SessionContext {
    registry: Arc<ChainRegistry>,
    keys: Arc<dyn KeyStore>,
    accounts: Arc<AccountDirectory>,
    broadcaster: Arc<dyn TransactionBroadcaster>,
    probe: Arc<dyn ConnectivityProbe>,
    callbacks: Arc<dyn CallbackClient>,
}

impl SessionContext {
    pub fn new(
        registry: Arc<ChainRegistry>,
        keys: Arc<dyn KeyStore>,
        accounts: Arc<AccountDirectory>,
        broadcaster: Arc<dyn TransactionBroadcaster>,
        probe: Arc<dyn ConnectivityProbe>,
        callbacks: Arc<dyn CallbackClient>,
    ) -> Self {
        Self {
            registry,
            keys,
            accounts,
            broadcaster,
            probe,
            callbacks,
        }
    }

    pub fn registry(&self) -> &Arc<ChainRegistry> {
        &self.registry
    }

    pub fn accounts(&self) -> &Arc<AccountDirectory> {
        &self.accounts
    }

    pub fn broadcaster(&self) -> &Arc<dyn TransactionBroadcaster> {
        &self.broadcaster
    }

    pub fn probe(&self) -> &Arc<dyn ConnectivityProbe> {
        &self.probe
    }

    pub fn callbacks(&self) -> &Arc<dyn CallbackClient> {
        &self.callbacks
    }

    /// Fetch the signing key for `chain` from the store.
    ///
    /// Keys are read per signing operation and never cached in session
    /// state; `None` means the key generation flow should run.
    pub fn find_key(&self, chain: &Chain) -> Result<Option<ChainPrivateKey>, SessionError> {
        Ok(self.keys.find_by_name(&chain.key_name())?)
    }
}
