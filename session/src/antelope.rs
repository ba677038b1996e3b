//! Antelope signing-request session.
//!
//! The transport here is the request blob itself: a compressed,
//! ABI-typed `esr:` URI scanned or deep-linked into the wallet. The
//! session decodes it without chain context to discover the target
//! chain, then resolves it against that chain's ABIs and live head
//! state into a signable transaction, and finally reports the outcome
//! to the requesting origin over plain HTTP — full callback URL with
//! signature data on approval, bare origin with a fixed body on
//! rejection.

use chrono::{Duration, Utc};
use serde_json::Value;
use std::collections::HashMap;

use pangea_chain::{
    ActionData, AntelopeAction, AntelopeTransaction, Chain, ChainTransaction, TransactionReceipt,
};
use pangea_esr::{callback_origin, rejection_payload, CallbackPayload, SigningRequest};
use pangea_types::{
    Abi, AntelopeChainId, AntelopeName, ChainError, ChainId, PermissionLevel, TransactionHeader,
};

use crate::context::SessionContext;
use crate::error::SessionError;

/// What handling a scanned signing request produced.
pub enum ScanOutcome {
    /// A resolved transaction awaiting user consent.
    Transaction(AntelopeTransactionRequest),
    /// The target chain's key is missing. Not an error: the host app
    /// runs key generation, then replays `request` via
    /// [`AntelopeSession::resume`].
    KeyGenerationRequired {
        request: SigningRequest,
        chain_id: AntelopeChainId,
    },
}

impl std::fmt::Debug for ScanOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanOutcome::Transaction(request) => f
                .debug_tuple("Transaction")
                .field(&request.signer().to_string())
                .finish(),
            ScanOutcome::KeyGenerationRequired { chain_id, .. } => f
                .debug_struct("KeyGenerationRequired")
                .field("chain_id", &chain_id.to_string())
                .finish_non_exhaustive(),
        }
    }
}

/// The Antelope signing-request session.
///
/// Stateless between requests: each scan resolves independently, and
/// two scans of the same request would each resolve and sign on their
/// own.
pub struct AntelopeSession {
    context: SessionContext,
}

impl AntelopeSession {
    pub fn new(context: SessionContext) -> Self {
        Self { context }
    }

    pub async fn on_qr_scan(&self, uri: &str) -> Result<ScanOutcome, SessionError> {
        self.handle(uri).await
    }

    pub async fn on_link(&self, uri: &str) -> Result<ScanOutcome, SessionError> {
        self.handle(uri).await
    }

    async fn handle(&self, uri: &str) -> Result<ScanOutcome, SessionError> {
        let request = SigningRequest::decode(uri)?;
        self.resume(request).await
    }

    /// Process a decoded request, fresh or replayed after key
    /// generation.
    pub async fn resume(&self, request: SigningRequest) -> Result<ScanOutcome, SessionError> {
        if request.is_identity() {
            return Err(pangea_esr::EsrError::IdentityUnsupported.into());
        }

        let chain_id = request.chain_id()?;
        let chain = self.context.registry().antelope_chain(&chain_id)?;

        if self
            .context
            .find_key(&Chain::Antelope(chain.clone()))?
            .is_none()
        {
            tracing::info!(
                chain = chain.name(),
                "signing request needs key generation; retaining for replay"
            );
            return Ok(ScanOutcome::KeyGenerationRequired { request, chain_id });
        }

        let account = self
            .context
            .accounts()
            .find(&ChainId::Antelope(chain_id))
            .ok_or_else(|| ChainError::AccountNotFound(chain.name().to_string()))?;
        let signer = PermissionLevel::active(account.parse()?);

        // Fetch every referenced contract ABI, then the chain head for
        // the transaction header, before resolving placeholders.
        let mut abis: HashMap<AntelopeName, Abi> = HashMap::new();
        for contract in request.contract_accounts() {
            let abi = chain.client().get_abi(&contract).await?;
            abis.insert(contract, abi);
        }
        let info = chain.client().get_info().await?;
        let expiration = Utc::now() + Duration::seconds(chain.expire_secs() as i64);
        let header = TransactionHeader::new(expiration, &info.last_irreversible_block_id)?;
        let resolved = request.resolve(&abis, signer.clone(), header)?;

        let actions = resolved
            .transaction()
            .actions
            .iter()
            .map(|action| AntelopeAction {
                account: action.account,
                name: action.name,
                authorization: action.authorization.clone(),
                data: ActionData::Packed(action.data.clone()),
            })
            .collect();
        let transaction = AntelopeTransaction::new(chain.clone(), actions).with_abis(abis);

        Ok(ScanOutcome::Transaction(AntelopeTransactionRequest {
            context: self.context.clone(),
            request,
            transaction: ChainTransaction::Antelope(transaction),
            signer,
        }))
    }
}

/// A resolved signing request awaiting user consent.
///
/// Consuming `self` in [`approve`](Self::approve) and
/// [`reject`](Self::reject) makes the two terminal calls mutually
/// exclusive and single-use.
pub struct AntelopeTransactionRequest {
    context: SessionContext,
    request: SigningRequest,
    transaction: ChainTransaction,
    signer: PermissionLevel,
}

impl AntelopeTransactionRequest {
    pub fn transaction(&self) -> &ChainTransaction {
        &self.transaction
    }

    pub fn signer(&self) -> &PermissionLevel {
        &self.signer
    }

    pub fn callback(&self) -> Option<&str> {
        self.request.callback()
    }

    /// Sign and broadcast, then deliver the callback when one was
    /// requested.
    ///
    /// Callback delivery failures are logged, never raised: the
    /// transaction already succeeded on-chain, and a lost POST must not
    /// mask that.
    pub async fn approve(self) -> Result<TransactionReceipt, SessionError> {
        let chain = self.transaction.chain();
        let key = self
            .context
            .find_key(&chain)?
            .ok_or_else(|| ChainError::KeyNotFound {
                account: self.signer.actor.to_string(),
                chain: chain.name().to_string(),
            })?;
        let receipt = self
            .context
            .broadcaster()
            .broadcast(&self.transaction, &key)
            .await?;

        if let Some(callback) = self.request.callback() {
            let mut payload = CallbackPayload::new(
                receipt.first_signature().unwrap_or_default(),
                &self.signer,
                receipt.id(),
            )
            .with_uid_from(callback);
            if let Some(block_num) = block_num_of(receipt.raw()) {
                payload = payload.with_block_num(block_num);
            }
            match serde_json::to_value(&payload) {
                Ok(body) => deliver(&self.context, callback, &body).await,
                Err(e) => tracing::warn!(error = %e, "callback payload failed to serialize"),
            }
        }
        Ok(receipt)
    }

    /// Notify the requesting origin that the user declined.
    ///
    /// The fixed rejection body goes to the callback's *origin*, not
    /// the full callback URL: rejection carries no transaction artifact.
    pub async fn reject(self) -> Result<(), SessionError> {
        if let Some(callback) = self.request.callback() {
            let origin = callback_origin(callback)?;
            deliver(&self.context, &origin, &rejection_payload()).await;
        }
        Ok(())
    }
}

/// POST `body` to `url`, demoting every failure to a warning.
async fn deliver(context: &SessionContext, url: &str, body: &Value) {
    match context.callbacks().post_json(url, body).await {
        Ok(status) if (200..300).contains(&status) => {
            tracing::debug!(url, status, "callback delivered");
        }
        Ok(status) => {
            tracing::warn!(url, status, "callback endpoint answered non-2xx");
        }
        Err(e) => {
            tracing::warn!(url, error = %e, "callback delivery failed");
        }
    }
}

fn block_num_of(raw: &Value) -> Option<u64> {
    raw.get("processed")?.get("block_num")?.as_u64()
}
