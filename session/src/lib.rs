//! Transaction-session protocols for the Pangea wallet.
//!
//! Two state machines mediate inbound signing and login requests: a
//! WalletConnect session for Ethereum-family dapps and an Antelope
//! signing-request (ESR) session for Anchor-style origins. Both consume
//! one [`SessionContext`] of explicit dependencies, funnel QR scans and
//! deep links through the same entry points, and hand resolved requests
//! to the UI as consume-once approve/reject values.

pub mod antelope;
pub mod context;
pub mod error;
pub mod uri;
pub mod walletconnect;

#[cfg(test)]
mod testing;

pub use antelope::{AntelopeSession, AntelopeTransactionRequest, ScanOutcome};
pub use context::{
    AccountDirectory, CallbackClient, ConnectivityProbe, HttpCallbackClient, HttpProbe,
    SessionContext,
};
pub use error::SessionError;
pub use uri::WalletUri;
pub use walletconnect::{
    ApprovedNamespace, PeerMetadata, ProposalOutcome, ProposedNamespace, RelayErrorReason,
    RelayTransport, RequestOutcome, RpcResponse, SessionDelete, SessionProposal,
    SessionRequestEvent, SessionState, TransactionApproval, WalletConnectSession,
    WalletLoginRequest, WalletTransactionRequest, ETH_SEND_TRANSACTION, UNSUPPORTED_CHAINS_CODE,
    UNSUPPORTED_METHODS_CODE, USER_REJECTED_CODE,
};
