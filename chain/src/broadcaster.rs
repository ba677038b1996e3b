//! Broadcast seam between session handling and the chains.
//!
//! Sessions hand an approved transaction and its key to a
//! [`TransactionBroadcaster`] instead of talking to a chain client
//! directly, so tests can swap in a recording double.

use async_trait::async_trait;

use pangea_types::ChainError;

use crate::key::ChainPrivateKey;
use crate::receipt::TransactionReceipt;
use crate::transaction::ChainTransaction;

#[async_trait]
pub trait TransactionBroadcaster: Send + Sync {
    /// Sign `transaction` with `key` and submit it to its chain.
    async fn broadcast(
        &self,
        transaction: &ChainTransaction,
        key: &ChainPrivateKey,
    ) -> Result<TransactionReceipt, ChainError>;
}

/// The production broadcaster: sign and push over the chain's RPC.
pub struct RpcBroadcaster;

#[async_trait]
impl TransactionBroadcaster for RpcBroadcaster {
    async fn broadcast(
        &self,
        transaction: &ChainTransaction,
        key: &ChainPrivateKey,
    ) -> Result<TransactionReceipt, ChainError> {
        transaction.send(key).await
    }
}
