//! WalletConnect session state machine.
//!
//! The relay itself is an external collaborator behind
//! [`RelayTransport`]; this module owns the protocol decisions: which
//! proposals get rejected outright, when the key-generation flow takes
//! over, and the exactly-once approve/reject responses. Entry points
//! are transport-agnostic — a QR scan and a deep link funnel into the
//! same pairing call, and proposal/request/delete events arrive however
//! the relay implementation surfaces them.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use pangea_chain::{
    Chain, ChainTransaction, EthereumTransaction, EthereumTransactionRequest, TransactionReceipt,
};
use pangea_types::{ChainError, ChainId};

use crate::context::SessionContext;
use crate::error::SessionError;

/// WalletConnect sign-protocol error codes.
pub const USER_REJECTED_CODE: i64 = 5000;
pub const UNSUPPORTED_CHAINS_CODE: i64 = 5100;
pub const UNSUPPORTED_METHODS_CODE: i64 = 5101;

/// The one RPC method the wallet executes today.
pub const ETH_SEND_TRANSACTION: &str = "eth_sendTransaction";

/// A structured rejection reason sent to the remote peer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayErrorReason {
    pub code: i64,
    pub message: String,
}

impl RelayErrorReason {
    pub fn user_rejected() -> Self {
        Self {
            code: USER_REJECTED_CODE,
            message: "User rejected.".to_string(),
        }
    }

    pub fn unsupported_chains() -> Self {
        Self {
            code: UNSUPPORTED_CHAINS_CODE,
            message: "Unsupported chains.".to_string(),
        }
    }

    pub fn unsupported_methods(method: &str) -> Self {
        Self {
            code: UNSUPPORTED_METHODS_CODE,
            message: format!("Unsupported method: {method}"),
        }
    }
}

/// A JSON-RPC response relayed back over the session topic.
#[derive(Clone, Debug, PartialEq)]
pub enum RpcResponse {
    Result(Value),
    Error(RelayErrorReason),
}

/// Metadata the proposing dapp sends about itself.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerMetadata {
    pub name: String,
    pub description: String,
    pub url: String,
    #[serde(default)]
    pub icons: Vec<String>,
}

/// One namespace entry of a session proposal: CAIP-2 chain ids plus the
/// methods and events the dapp wants.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedNamespace {
    #[serde(default)]
    pub chains: Vec<String>,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub events: Vec<String>,
}

/// A namespace entry of an approved session: one bound account string
/// per requested chain, `<namespace>:<chainId>:<address>`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovedNamespace {
    pub accounts: Vec<String>,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub events: Vec<String>,
}

/// An inbound `session_proposal` event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProposal {
    pub id: u64,
    pub pairing_topic: String,
    pub proposer: PeerMetadata,
    pub required_namespaces: BTreeMap<String, ProposedNamespace>,
    /// Origin the relay attested for the proposer, when verification
    /// succeeded.
    #[serde(default)]
    pub verified_origin: Option<String>,
}

/// An inbound `session_request` event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequestEvent {
    pub topic: String,
    pub id: u64,
    /// CAIP-2 chain id, e.g. `eip155:11155111`.
    pub chain_id: String,
    pub method: String,
    pub params: Value,
    #[serde(default)]
    pub verified_origin: Option<String>,
}

/// An inbound `session_delete` event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDelete {
    pub topic: String,
}

/// The relay client, as far as sessions are concerned.
///
/// The production implementation wraps the WalletConnect core pairing
/// and sign clients; tests substitute a recorder.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    /// Pair with the peer described by a `wc:` URI.
    async fn pair(&self, uri: &str) -> Result<(), SessionError>;

    /// Approve a session proposal; returns the new session topic.
    async fn approve_session(
        &self,
        proposal_id: u64,
        namespaces: BTreeMap<String, ApprovedNamespace>,
    ) -> Result<String, SessionError>;

    /// Reject a session proposal with a structured reason.
    async fn reject_session(
        &self,
        proposal_id: u64,
        reason: RelayErrorReason,
    ) -> Result<(), SessionError>;

    /// Send a JSON-RPC response over an established session topic.
    async fn respond(
        &self,
        topic: &str,
        request_id: u64,
        response: RpcResponse,
    ) -> Result<(), SessionError>;

    /// Tear down an established session.
    async fn disconnect(&self, topic: &str) -> Result<(), SessionError>;
}

/// Lifecycle of the long-lived session object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initializing,
    Initialized,
}

/// What handling a proposal produced.
#[derive(Debug)]
pub enum ProposalOutcome {
    /// All chains supported and all keys present; awaiting user consent.
    Login(WalletLoginRequest),
    /// The proposal named a chain outside the registry; the peer has
    /// already been told via `reject_session(UNSUPPORTED_CHAINS)`.
    Rejected { unsupported: String },
    /// A required chain has no locally provisioned key. Not an error:
    /// the host app runs key generation, then replays `proposal`.
    KeyGenerationRequired {
        proposal: SessionProposal,
        missing: Vec<ChainId>,
    },
}

/// What handling a request produced.
#[derive(Debug)]
pub enum RequestOutcome {
    /// A signable transaction awaiting user consent.
    Transaction(WalletTransactionRequest),
    /// The method is not implemented; the peer has already received a
    /// structured `UNSUPPORTED_METHODS` error response.
    UnsupportedMethod { method: String },
    /// The target chain's key is missing. The host app runs key
    /// generation, then replays `event`.
    KeyGenerationRequired {
        event: SessionRequestEvent,
        missing: ChainId,
    },
}

/// The long-lived WalletConnect session.
pub struct WalletConnectSession {
    context: SessionContext,
    relay: Arc<dyn RelayTransport>,
    state: RwLock<SessionState>,
    /// Topics of sessions this wallet approved.
    topics: Arc<RwLock<HashSet<String>>>,
}

impl WalletConnectSession {
    pub fn new(context: SessionContext, relay: Arc<dyn RelayTransport>) -> Self {
        Self {
            context,
            relay,
            state: RwLock::new(SessionState::Uninitialized),
            topics: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
            .read()
            .map(|s| *s)
            .unwrap_or(SessionState::Uninitialized)
    }

    fn set_state(&self, state: SessionState) {
        if let Ok(mut current) = self.state.write() {
            *current = state;
        }
    }

    /// Probe connectivity and bring up relay state.
    ///
    /// Idempotent once initialized. An offline device gets a network
    /// error immediately instead of a relay client that hangs.
    pub async fn initialize(&self) -> Result<(), SessionError> {
        if self.state() == SessionState::Initialized {
            return Ok(());
        }
        self.set_state(SessionState::Initializing);
        if !self.context.probe().is_online().await {
            self.set_state(SessionState::Uninitialized);
            return Err(SessionError::Network(
                "no network connection; cannot reach the relay".to_string(),
            ));
        }
        self.set_state(SessionState::Initialized);
        tracing::info!("walletconnect session initialized");
        Ok(())
    }

    fn ensure_initialized(&self) -> Result<(), SessionError> {
        if self.state() == SessionState::Initialized {
            Ok(())
        } else {
            Err(SessionError::NotInitialized)
        }
    }

    pub async fn on_qr_scan(&self, uri: &str) -> Result<(), SessionError> {
        self.pair(uri).await
    }

    pub async fn on_link(&self, uri: &str) -> Result<(), SessionError> {
        self.pair(uri).await
    }

    async fn pair(&self, uri: &str) -> Result<(), SessionError> {
        self.ensure_initialized()?;
        self.relay.pair(uri).await
    }

    /// Handle a `session_proposal` event.
    ///
    /// Every requested chain is validated against the registry before
    /// any account resolution; one unsupported chain rejects the whole
    /// proposal rather than partially accepting it.
    pub async fn on_proposal(
        &self,
        proposal: SessionProposal,
    ) -> Result<ProposalOutcome, SessionError> {
        self.ensure_initialized()?;

        let mut resolved: Vec<(String, String, Chain)> = Vec::new();
        for (namespace, entry) in &proposal.required_namespaces {
            for caip in &entry.chains {
                let Some((ns, reference)) = caip.split_once(':') else {
                    return Err(SessionError::Chain(ChainError::Protocol(format!(
                        "malformed chain id {caip} in namespace {namespace}"
                    ))));
                };
                match self.context.registry().chain_for_caip(ns, reference) {
                    Ok(chain) => resolved.push((namespace.clone(), caip.clone(), chain.clone())),
                    Err(ChainError::UnsupportedChain(_)) => {
                        tracing::warn!(
                            proposal = proposal.id,
                            chain = %caip,
                            "rejecting proposal for unsupported chain"
                        );
                        self.relay
                            .reject_session(proposal.id, RelayErrorReason::unsupported_chains())
                            .await?;
                        return Ok(ProposalOutcome::Rejected {
                            unsupported: caip.clone(),
                        });
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        let mut missing = Vec::new();
        for (_, _, chain) in &resolved {
            if self.context.find_key(chain)?.is_none() {
                let id = chain.chain_id();
                if !missing.contains(&id) {
                    missing.push(id);
                }
            }
        }
        if !missing.is_empty() {
            tracing::info!(
                proposal = proposal.id,
                missing = missing.len(),
                "proposal needs key generation before login"
            );
            return Ok(ProposalOutcome::KeyGenerationRequired { proposal, missing });
        }

        let mut namespaces: BTreeMap<String, ApprovedNamespace> = BTreeMap::new();
        for (namespace, caip, chain) in &resolved {
            let address = self.account_address(chain)?;
            let entry = namespaces.entry(namespace.clone()).or_insert_with(|| {
                let proposed = &proposal.required_namespaces[namespace];
                ApprovedNamespace {
                    accounts: Vec::new(),
                    methods: proposed.methods.clone(),
                    events: proposed.events.clone(),
                }
            });
            entry.accounts.push(format!("{caip}:{address}"));
        }

        Ok(ProposalOutcome::Login(WalletLoginRequest {
            relay: self.relay.clone(),
            topics: self.topics.clone(),
            proposal_id: proposal.id,
            proposer: proposal.proposer,
            namespaces,
            verified_origin: proposal.verified_origin,
        }))
    }

    /// The wallet's account string for `chain`.
    fn account_address(&self, chain: &Chain) -> Result<String, SessionError> {
        match chain {
            Chain::Ethereum(_) => {
                let key = self
                    .context
                    .find_key(chain)?
                    .ok_or_else(|| ChainError::AccountNotFound(chain.chain_id().caip2()))?;
                Ok(key.ethereum_address()?.checksummed())
            }
            Chain::Antelope(_) => self
                .context
                .accounts()
                .find(&chain.chain_id())
                .ok_or_else(|| ChainError::AccountNotFound(chain.chain_id().caip2()).into()),
        }
    }

    /// Handle a `session_request` event.
    ///
    /// Unsupported methods answer the peer with a structured JSON-RPC
    /// error rather than raising locally; only `eth_sendTransaction` is
    /// executed.
    pub async fn on_request(
        &self,
        event: SessionRequestEvent,
    ) -> Result<RequestOutcome, SessionError> {
        self.ensure_initialized()?;

        if event.method != ETH_SEND_TRANSACTION {
            tracing::warn!(method = %event.method, "responding with unsupported-method error");
            self.relay
                .respond(
                    &event.topic,
                    event.id,
                    RpcResponse::Error(RelayErrorReason::unsupported_methods(&event.method)),
                )
                .await?;
            return Ok(RequestOutcome::UnsupportedMethod {
                method: event.method,
            });
        }

        let Some((ns, reference)) = event.chain_id.split_once(':') else {
            return Err(SessionError::Chain(ChainError::Protocol(format!(
                "malformed chain id {}",
                event.chain_id
            ))));
        };
        let chain = self.context.registry().chain_for_caip(ns, reference)?.clone();
        let ethereum = chain.as_ethereum().cloned().ok_or_else(|| {
            ChainError::Protocol(format!(
                "{ETH_SEND_TRANSACTION} is not valid on {}",
                chain.name()
            ))
        })?;

        let request = EthereumTransactionRequest::from_rpc_params(&event.params, ethereum.id())?;
        let transaction = EthereumTransaction::new(ethereum, request)?;

        if self.context.find_key(&chain)?.is_none() {
            let missing = chain.chain_id();
            tracing::info!(
                request = event.id,
                chain = %missing,
                "transaction request needs key generation; retaining for replay"
            );
            return Ok(RequestOutcome::KeyGenerationRequired { event, missing });
        }

        Ok(RequestOutcome::Transaction(WalletTransactionRequest {
            context: self.context.clone(),
            relay: self.relay.clone(),
            topic: event.topic,
            request_id: event.id,
            transaction: ChainTransaction::Ethereum(transaction),
            verified_origin: event.verified_origin,
        }))
    }

    /// Handle a `session_delete` event.
    ///
    /// Deleting an unknown topic is an idempotent no-op; the log field
    /// distinguishes routine relay expiry from topic-tracking bugs.
    pub fn on_delete(&self, delete: &SessionDelete) {
        let known = self
            .topics
            .write()
            .map(|mut topics| topics.remove(&delete.topic))
            .unwrap_or(false);
        tracing::debug!(topic = %delete.topic, known_topic = known, "session deleted");
    }

    /// Whether `topic` belongs to a session this wallet approved.
    pub fn knows_topic(&self, topic: &str) -> bool {
        self.topics
            .read()
            .map(|topics| topics.contains(topic))
            .unwrap_or(false)
    }
}

/// A pending login (session proposal) awaiting user consent.
///
/// Consuming `self` in [`approve`](Self::approve) and
/// [`reject`](Self::reject) makes the two terminal calls mutually
/// exclusive and single-use.
pub struct WalletLoginRequest {
    relay: Arc<dyn RelayTransport>,
    topics: Arc<RwLock<HashSet<String>>>,
    proposal_id: u64,
    proposer: PeerMetadata,
    namespaces: BTreeMap<String, ApprovedNamespace>,
    verified_origin: Option<String>,
}

impl std::fmt::Debug for WalletLoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletLoginRequest")
            .field("proposal_id", &self.proposal_id)
            .field("proposer", &self.proposer.name)
            .field("namespaces", &self.namespaces)
            .finish_non_exhaustive()
    }
}

impl WalletLoginRequest {
    pub fn proposer(&self) -> &PeerMetadata {
        &self.proposer
    }

    pub fn namespaces(&self) -> &BTreeMap<String, ApprovedNamespace> {
        &self.namespaces
    }

    pub fn verified_origin(&self) -> Option<&str> {
        self.verified_origin.as_deref()
    }

    /// Approve the session; returns the established topic.
    pub async fn approve(self) -> Result<String, SessionError> {
        let topic = self
            .relay
            .approve_session(self.proposal_id, self.namespaces)
            .await?;
        if let Ok(mut topics) = self.topics.write() {
            topics.insert(topic.clone());
        }
        tracing::info!(proposal = self.proposal_id, topic = %topic, "session approved");
        Ok(topic)
    }

    /// Reject the session with `USER_REJECTED`.
    pub async fn reject(self) -> Result<(), SessionError> {
        self.relay
            .reject_session(self.proposal_id, RelayErrorReason::user_rejected())
            .await
    }
}

/// A pending `eth_sendTransaction` awaiting user consent.
pub struct WalletTransactionRequest {
    context: SessionContext,
    relay: Arc<dyn RelayTransport>,
    topic: String,
    request_id: u64,
    transaction: ChainTransaction,
    verified_origin: Option<String>,
}

impl std::fmt::Debug for WalletTransactionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletTransactionRequest")
            .field("topic", &self.topic)
            .field("request_id", &self.request_id)
            .field("transaction", &self.transaction)
            .finish_non_exhaustive()
    }
}

/// Result of an approved transaction request.
#[derive(Debug)]
pub struct TransactionApproval {
    pub receipt: TransactionReceipt,
    /// Where to send the user's browser after responding, when the
    /// requesting origin was verified.
    pub redirect: Option<String>,
}

impl WalletTransactionRequest {
    pub fn transaction(&self) -> &ChainTransaction {
        &self.transaction
    }

    pub fn verified_origin(&self) -> Option<&str> {
        self.verified_origin.as_deref()
    }

    /// Broadcast the transaction and respond over the session topic,
    /// each exactly once.
    pub async fn approve(self) -> Result<TransactionApproval, SessionError> {
        let chain = self.transaction.chain();
        let key = self
            .context
            .find_key(&chain)?
            .ok_or_else(|| ChainError::KeyNotFound {
                account: "wallet".to_string(),
                chain: chain.name().to_string(),
            })?;
        let receipt = self
            .context
            .broadcaster()
            .broadcast(&self.transaction, &key)
            .await?;
        self.relay
            .respond(
                &self.topic,
                self.request_id,
                RpcResponse::Result(receipt.raw().clone()),
            )
            .await?;
        tracing::info!(
            request = self.request_id,
            transaction = receipt.id(),
            "transaction request approved"
        );
        Ok(TransactionApproval {
            receipt,
            redirect: self.verified_origin,
        })
    }

    /// Tell the peer the user declined.
    pub async fn reject(self) -> Result<(), SessionError> {
        self.relay
            .respond(
                &self.topic,
                self.request_id,
                RpcResponse::Error(RelayErrorReason::user_rejected()),
            )
            .await
    }
}
