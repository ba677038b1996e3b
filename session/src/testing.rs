//! Recording doubles shared by the session tests.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use pangea_chain::{
    Asset, ChainPrivateKey, ChainTransaction, TransactionBroadcaster, TransactionReceipt,
};
use pangea_types::ChainError;

use crate::context::CallbackClient;
use crate::error::SessionError;

/// Broadcaster that signs nothing and records every call.
#[derive(Default)]
pub(crate) struct RecordingBroadcaster {
    raws: Mutex<Vec<Value>>,
}

impl RecordingBroadcaster {
    pub(crate) fn count(&self) -> usize {
        self.raws.lock().unwrap().len()
    }

    /// The raw response of the most recent broadcast.
    pub(crate) fn last_raw(&self) -> Value {
        self.raws.lock().unwrap().last().cloned().unwrap_or(Value::Null)
    }
}

#[async_trait]
impl TransactionBroadcaster for RecordingBroadcaster {
    async fn broadcast(
        &self,
        transaction: &ChainTransaction,
        _key: &ChainPrivateKey,
    ) -> Result<TransactionReceipt, ChainError> {
        let chain = transaction.chain();
        let fee = Asset::zero(chain.native_token()?);
        let (id, raw, signatures) = match transaction {
            ChainTransaction::Ethereum(_) => {
                let id = "0xbroadcast1".to_string();
                (id.clone(), Value::String(id), Vec::new())
            }
            ChainTransaction::Antelope(_) => {
                let id = "ab".repeat(32);
                (
                    id.clone(),
                    json!({ "transaction_id": id, "processed": { "block_num": 777 } }),
                    vec!["SIG_K1_broadcast".to_string()],
                )
            }
        };
        self.raws.lock().unwrap().push(raw.clone());
        Ok(TransactionReceipt::new(chain, id, fee, raw).with_signatures(signatures))
    }
}

/// Callback client that records every POST and answers a fixed status.
pub(crate) struct RecordingCallbacks {
    posts: Mutex<Vec<(String, Value)>>,
    status: u16,
}

impl Default for RecordingCallbacks {
    fn default() -> Self {
        Self::with_status(200)
    }
}

impl RecordingCallbacks {
    pub(crate) fn with_status(status: u16) -> Self {
        Self {
            posts: Mutex::new(Vec::new()),
            status,
        }
    }

    pub(crate) fn posts(&self) -> Vec<(String, Value)> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CallbackClient for RecordingCallbacks {
    async fn post_json(&self, url: &str, body: &Value) -> Result<u16, SessionError> {
        self.posts.lock().unwrap().push((url.to_string(), body.clone()));
        Ok(self.status)
    }
}
