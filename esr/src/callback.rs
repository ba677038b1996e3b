//! Callback delivery payloads.
//!
//! Approval POSTs a [`CallbackPayload`] to the request's full callback
//! URL; rejection POSTs a fixed body to the callback's *origin* only —
//! rejection carries no transaction artifact, so the requesting site
//! gets notified without receiving signature data.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

use pangea_types::PermissionLevel;

use crate::error::EsrError;

/// The JSON body POSTed on approval. Serialized exactly once, with
/// serde; field names follow the signing-request callback convention.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackPayload {
    /// First signature of the broadcast transaction.
    pub sig: String,
    /// Signer account.
    pub sa: String,
    /// Signer permission.
    pub sp: String,
    /// Transaction id, under the short key the protocol template uses.
    pub tx: String,
    /// Transaction id again, under the explicit key callers read.
    pub tx_id: String,
    /// Block number the transaction landed in, when the node reported
    /// one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bn: Option<u64>,
    /// Correlation token the requesting site planted in its callback
    /// URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

impl CallbackPayload {
    pub fn new(signature: &str, signer: &PermissionLevel, transaction_id: &str) -> Self {
        Self {
            sig: signature.to_string(),
            sa: signer.actor.to_string(),
            sp: signer.permission.to_string(),
            tx: transaction_id.to_string(),
            tx_id: transaction_id.to_string(),
            bn: None,
            uid: None,
        }
    }

    pub fn with_block_num(mut self, block_num: u64) -> Self {
        self.bn = Some(block_num);
        self
    }

    /// Carry the `uid` query parameter from `callback_url`, if present.
    pub fn with_uid_from(mut self, callback_url: &str) -> Self {
        self.uid = extract_uid(callback_url);
        self
    }
}

/// The fixed body POSTed to the callback origin on rejection.
pub fn rejection_payload() -> Value {
    json!({ "rejected": "Request cancelled from within Anchor." })
}

/// The `uid` query parameter of a callback URL.
pub fn extract_uid(callback_url: &str) -> Option<String> {
    let url = Url::parse(callback_url).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "uid")
        .map(|(_, value)| value.into_owned())
}

/// The origin (`scheme://host[:port]`) of a callback URL, the rejection
/// target.
pub fn callback_origin(callback_url: &str) -> Result<String, EsrError> {
    let url = Url::parse(callback_url)
        .map_err(|e| EsrError::Malformed(format!("bad callback url: {e}")))?;
    let origin = url.origin();
    if !matches!(origin, url::Origin::Tuple(..)) {
        return Err(EsrError::Malformed(format!(
            "callback url has no origin: {callback_url}"
        )));
    }
    Ok(origin.ascii_serialization())
}
