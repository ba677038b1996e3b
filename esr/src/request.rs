//! The signing-request payload: URI codec and resolution.
//!
//! An `esr:` URI wraps a base64url blob whose first byte carries the
//! protocol version and a compression flag; the body is a raw-deflate
//! stream of the packed payload. Decoding is deliberately two-phase:
//! [`SigningRequest::decode`] needs no chain context, so the wallet can
//! first discover which chain the request targets, then gather that
//! chain's ABIs and live state and [`resolve`](SigningRequest::resolve)
//! the request into a signable transaction.

use std::collections::HashMap;
use std::io::{Read, Write};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use serde_json::Value;

use pangea_types::{
    Abi, Action, AntelopeChainId, AntelopeName, ByteReader, ByteWriter, PermissionLevel,
    Transaction, TransactionHeader,
};

use crate::alias;
use crate::error::EsrError;

const VERSION: u8 = 2;
const COMPRESSED: u8 = 0x80;

/// Ask the wallet to broadcast after signing.
pub const FLAG_BROADCAST: u8 = 1;
/// Deliver the callback from the background, without opening a browser.
pub const FLAG_BACKGROUND: u8 = 2;

/// Upper bound on the inflated body; real requests are a few hundred
/// bytes.
const MAX_INFLATED_BYTES: usize = 1 << 20;

/// How a request names its target chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainRef {
    /// One-byte alias from the protocol's registry.
    Alias(u8),
    /// Full 32-byte chain id.
    Id(AntelopeChainId),
}

/// What the request asks to be signed.
#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    Action(Action),
    Actions(Vec<Action>),
    Transaction(Transaction),
    Identity { permission: Option<PermissionLevel> },
}

/// An opaque metadata pair carried alongside the request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfoPair {
    pub key: String,
    pub value: Vec<u8>,
}

/// Proof of the requesting origin: a K1 signature by `signer` over the
/// request payload. Carried through verbatim; the wallet does not check
/// it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestSignature {
    pub signer: AntelopeName,
    pub signature: Vec<u8>,
}

impl RequestSignature {
    fn write(&self, w: &mut ByteWriter) {
        w.write_name(&self.signer);
        w.write_u8(0); // K1
        w.write_raw(&self.signature);
    }

    fn read(r: &mut ByteReader) -> Result<Self, EsrError> {
        let signer = r.read_name()?;
        let key_type = r.read_u8()?;
        if key_type != 0 {
            return Err(EsrError::Malformed(format!(
                "unsupported request signature type {key_type}"
            )));
        }
        let signature = r.read_raw(65)?.to_vec();
        Ok(Self { signer, signature })
    }
}

/// A decoded signing request.
#[derive(Clone, Debug, PartialEq)]
pub struct SigningRequest {
    chain: ChainRef,
    body: RequestBody,
    flags: u8,
    callback: String,
    info: Vec<InfoPair>,
    signature: Option<RequestSignature>,
}

impl SigningRequest {
    /// A broadcast request for a single action.
    pub fn from_action(chain_id: AntelopeChainId, action: Action) -> Self {
        Self::with_body(chain_id, RequestBody::Action(action))
    }

    /// A broadcast request for an ordered action list.
    pub fn from_actions(chain_id: AntelopeChainId, actions: Vec<Action>) -> Self {
        Self::with_body(chain_id, RequestBody::Actions(actions))
    }

    /// A broadcast request for a full transaction, template header and
    /// all.
    pub fn from_transaction(chain_id: AntelopeChainId, transaction: Transaction) -> Self {
        Self::with_body(chain_id, RequestBody::Transaction(transaction))
    }

    /// An identity (login) request.
    ///
    /// The codec round-trips these, but the wallet refuses to resolve
    /// them; see [`EsrError::IdentityUnsupported`].
    pub fn identity(chain_id: AntelopeChainId, permission: Option<PermissionLevel>) -> Self {
        Self::with_body(chain_id, RequestBody::Identity { permission })
    }

    fn with_body(chain_id: AntelopeChainId, body: RequestBody) -> Self {
        let chain = match alias::alias_for_chain_id(&chain_id) {
            Some(a) => ChainRef::Alias(a),
            None => ChainRef::Id(chain_id),
        };
        Self {
            chain,
            body,
            flags: FLAG_BROADCAST,
            callback: String::new(),
            info: Vec::new(),
            signature: None,
        }
    }

    pub fn with_callback(mut self, url: &str, background: bool) -> Self {
        self.callback = url.to_string();
        if background {
            self.flags |= FLAG_BACKGROUND;
        } else {
            self.flags &= !FLAG_BACKGROUND;
        }
        self
    }

    pub fn with_broadcast(mut self, broadcast: bool) -> Self {
        if broadcast {
            self.flags |= FLAG_BROADCAST;
        } else {
            self.flags &= !FLAG_BROADCAST;
        }
        self
    }

    pub fn with_info_pair(mut self, key: &str, value: &[u8]) -> Self {
        self.info.push(InfoPair {
            key: key.to_string(),
            value: value.to_vec(),
        });
        self
    }

    // ── Codec ──────────────────────────────────────────────────────────

    /// Decode an `esr:` (or `esr-anchor:`) URI.
    pub fn decode(uri: &str) -> Result<Self, EsrError> {
        let payload = strip_scheme(uri)?;
        // Tolerate padded encoders.
        let payload = payload.trim_end_matches('=');
        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| EsrError::Base64(e.to_string()))?;
        Self::decode_payload(&bytes)
    }

    /// Decode the raw payload: header byte, then the (possibly
    /// deflated) packed request.
    pub fn decode_payload(bytes: &[u8]) -> Result<Self, EsrError> {
        let (&header, rest) = bytes
            .split_first()
            .ok_or_else(|| EsrError::Malformed("empty payload".to_string()))?;
        let version = header & !COMPRESSED;
        if version != VERSION {
            return Err(EsrError::UnsupportedVersion(version));
        }
        if header & COMPRESSED != 0 {
            Self::unpack(&inflate(rest)?)
        } else {
            Self::unpack(rest)
        }
    }

    /// Encode as an `esr:` URI (always compressed).
    pub fn encode(&self) -> Result<String, EsrError> {
        let mut writer = ByteWriter::new();
        self.pack(&mut writer);
        let compressed = deflate(&writer.into_bytes())?;
        let mut payload = Vec::with_capacity(compressed.len() + 1);
        payload.push(VERSION | COMPRESSED);
        payload.extend_from_slice(&compressed);
        Ok(format!("esr:{}", URL_SAFE_NO_PAD.encode(payload)))
    }

    fn pack(&self, w: &mut ByteWriter) {
        match &self.chain {
            ChainRef::Alias(a) => {
                w.write_varuint32(0);
                w.write_u8(*a);
            }
            ChainRef::Id(id) => {
                w.write_varuint32(1);
                w.write_checksum256(id.as_bytes());
            }
        }
        match &self.body {
            RequestBody::Action(action) => {
                w.write_varuint32(0);
                action.write(w);
            }
            RequestBody::Actions(actions) => {
                w.write_varuint32(1);
                w.write_varuint32(actions.len() as u32);
                for action in actions {
                    action.write(w);
                }
            }
            RequestBody::Transaction(transaction) => {
                w.write_varuint32(2);
                transaction.write(w);
            }
            RequestBody::Identity { permission } => {
                w.write_varuint32(3);
                match permission {
                    None => w.write_u8(0),
                    Some(level) => {
                        w.write_u8(1);
                        level.write(w);
                    }
                }
            }
        }
        w.write_u8(self.flags);
        w.write_string(&self.callback);
        w.write_varuint32(self.info.len() as u32);
        for pair in &self.info {
            w.write_string(&pair.key);
            w.write_bytes(&pair.value);
        }
        if let Some(signature) = &self.signature {
            signature.write(w);
        }
    }

    fn unpack(bytes: &[u8]) -> Result<Self, EsrError> {
        let mut r = ByteReader::new(bytes);
        let chain = match r.read_varuint32()? {
            0 => ChainRef::Alias(r.read_u8()?),
            1 => ChainRef::Id(AntelopeChainId(r.read_checksum256()?)),
            v => {
                return Err(EsrError::Malformed(format!("unknown chain id variant {v}")));
            }
        };
        let body = match r.read_varuint32()? {
            0 => RequestBody::Action(Action::read(&mut r)?),
            1 => {
                let count = r.read_varuint32()?;
                let mut actions = Vec::new();
                for _ in 0..count {
                    actions.push(Action::read(&mut r)?);
                }
                RequestBody::Actions(actions)
            }
            2 => RequestBody::Transaction(Transaction::read(&mut r)?),
            3 => {
                let permission = match r.read_u8()? {
                    0 => None,
                    1 => Some(PermissionLevel::read(&mut r)?),
                    v => {
                        return Err(EsrError::Malformed(format!("bad optional tag {v}")));
                    }
                };
                RequestBody::Identity { permission }
            }
            v => {
                return Err(EsrError::Malformed(format!("unknown request variant {v}")));
            }
        };
        let flags = r.read_u8()?;
        let callback = r.read_string()?;
        let info_count = r.read_varuint32()?;
        let mut info = Vec::new();
        for _ in 0..info_count {
            info.push(InfoPair {
                key: r.read_string()?,
                value: r.read_bytes()?,
            });
        }
        let signature = if r.is_empty() {
            None
        } else {
            Some(RequestSignature::read(&mut r)?)
        };
        r.expect_end()?;
        Ok(Self {
            chain,
            body,
            flags,
            callback,
            info,
            signature,
        })
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn chain_ref(&self) -> &ChainRef {
        &self.chain
    }

    /// The target chain id, resolving aliases through the registry.
    pub fn chain_id(&self) -> Result<AntelopeChainId, EsrError> {
        match &self.chain {
            ChainRef::Alias(a) => alias::chain_id_for_alias(*a),
            ChainRef::Id(id) => Ok(*id),
        }
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn is_identity(&self) -> bool {
        matches!(self.body, RequestBody::Identity { .. })
    }

    /// Whether the wallet should broadcast after signing.
    pub fn broadcasts(&self) -> bool {
        self.flags & FLAG_BROADCAST != 0
    }

    /// Whether the callback should be delivered without opening a
    /// browser.
    pub fn background(&self) -> bool {
        self.flags & FLAG_BACKGROUND != 0
    }

    pub fn callback(&self) -> Option<&str> {
        if self.callback.is_empty() {
            None
        } else {
            Some(&self.callback)
        }
    }

    pub fn info(&self) -> &[InfoPair] {
        &self.info
    }

    pub fn info_value(&self, key: &str) -> Option<&[u8]> {
        self.info
            .iter()
            .find(|pair| pair.key == key)
            .map(|pair| pair.value.as_slice())
    }

    pub fn signature(&self) -> Option<&RequestSignature> {
        self.signature.as_ref()
    }

    /// Contract accounts the request's actions touch, deduplicated in
    /// first-reference order. The set of ABIs needed to resolve.
    pub fn contract_accounts(&self) -> Vec<AntelopeName> {
        let actions: &[Action] = match &self.body {
            RequestBody::Action(action) => std::slice::from_ref(action),
            RequestBody::Actions(actions) => actions,
            RequestBody::Transaction(transaction) => &transaction.actions,
            RequestBody::Identity { .. } => &[],
        };
        let mut seen = Vec::new();
        for action in actions {
            if !seen.contains(&action.account) {
                seen.push(action.account);
            }
        }
        seen
    }

    // ── Resolution ─────────────────────────────────────────────────────

    /// Resolve placeholders against `signer` and build the signable
    /// transaction.
    ///
    /// Every referenced contract must appear in `abis`: action data is
    /// decoded, placeholder names substituted, and re-encoded, which
    /// also validates the data against the contract's ABI. `header`
    /// replaces a template header; a request that ships a concrete
    /// header keeps it.
    pub fn resolve(
        &self,
        abis: &HashMap<AntelopeName, Abi>,
        signer: PermissionLevel,
        header: TransactionHeader,
    ) -> Result<ResolvedSigningRequest, EsrError> {
        let (actions, header) = match &self.body {
            RequestBody::Identity { .. } => return Err(EsrError::IdentityUnsupported),
            RequestBody::Action(action) => (std::slice::from_ref(action), header),
            RequestBody::Actions(actions) => (actions.as_slice(), header),
            RequestBody::Transaction(transaction) => (
                transaction.actions.as_slice(),
                if transaction.header.is_template() {
                    header
                } else {
                    transaction.header
                },
            ),
        };
        let actions = actions
            .iter()
            .map(|action| resolve_action(action, abis, &signer))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(
            signer = %signer,
            actions = actions.len(),
            "resolved signing request"
        );
        Ok(ResolvedSigningRequest {
            signer,
            transaction: Transaction::new(header, actions),
        })
    }
}

/// A signing request with every placeholder bound, ready to sign.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedSigningRequest {
    signer: PermissionLevel,
    transaction: Transaction,
}

impl ResolvedSigningRequest {
    pub fn signer(&self) -> &PermissionLevel {
        &self.signer
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn into_transaction(self) -> Transaction {
        self.transaction
    }
}

fn resolve_action(
    action: &Action,
    abis: &HashMap<AntelopeName, Abi>,
    signer: &PermissionLevel,
) -> Result<Action, EsrError> {
    let authorization = action
        .authorization
        .iter()
        .map(|level| PermissionLevel {
            actor: if level.actor == AntelopeName::PLACEHOLDER_ACTOR {
                signer.actor
            } else {
                level.actor
            },
            permission: if level.permission == AntelopeName::PLACEHOLDER_PERMISSION {
                signer.permission
            } else {
                level.permission
            },
        })
        .collect();

    let abi = abis
        .get(&action.account)
        .ok_or_else(|| EsrError::MissingAbi(action.account.to_string()))?;
    let decoded = abi.decode_action_data(&action.name, &action.data)?;
    let substituted = substitute_placeholders(decoded, signer);
    let data = abi.encode_action_data(&action.name, &substituted)?;

    Ok(Action {
        account: action.account,
        name: action.name,
        authorization,
        data,
    })
}

/// Replace placeholder names anywhere in decoded action data.
fn substitute_placeholders(value: Value, signer: &PermissionLevel) -> Value {
    match value {
        Value::String(s) => {
            if s == AntelopeName::PLACEHOLDER_ACTOR.to_string() {
                Value::String(signer.actor.to_string())
            } else if s == AntelopeName::PLACEHOLDER_PERMISSION.to_string() {
                Value::String(signer.permission.to_string())
            } else {
                Value::String(s)
            }
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| substitute_placeholders(item, signer))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, substitute_placeholders(v, signer)))
                .collect(),
        ),
        other => other,
    }
}

fn strip_scheme(uri: &str) -> Result<&str, EsrError> {
    let rest = uri
        .strip_prefix("esr-anchor:")
        .or_else(|| uri.strip_prefix("esr:"))
        .ok_or_else(|| EsrError::InvalidScheme(uri.chars().take(24).collect()))?;
    Ok(rest.strip_prefix("//").unwrap_or(rest))
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, EsrError> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| EsrError::Compression(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| EsrError::Compression(e.to_string()))
}

fn inflate(data: &[u8]) -> Result<Vec<u8>, EsrError> {
    let mut out = Vec::new();
    let mut limited = DeflateDecoder::new(data).take(MAX_INFLATED_BYTES as u64 + 1);
    limited
        .read_to_end(&mut out)
        .map_err(|e| EsrError::Compression(e.to_string()))?;
    if out.len() > MAX_INFLATED_BYTES {
        return Err(EsrError::Compression("request body too large".to_string()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pangea_types::standard_token_abi;
    use serde_json::json;

    const TRANSFER: &str = "transfer";

    fn pangea_id() -> AntelopeChainId {
        "8a34ec7df1b8cd06ff4a8abbaa7cc50300823350cadc59ab296cb00d104d2b8f"
            .parse()
            .unwrap()
    }

    fn packed_transfer(from: &str, to: &str, quantity: &str) -> Vec<u8> {
        standard_token_abi()
            .encode_action_data(
                &TRANSFER.parse().unwrap(),
                &json!({
                    "from": from,
                    "to": to,
                    "quantity": quantity,
                    "memo": "",
                }),
            )
            .unwrap()
    }

    fn transfer_action() -> Action {
        Action::new(
            "eosio.token".parse().unwrap(),
            TRANSFER.parse().unwrap(),
            vec![PermissionLevel::placeholder()],
            packed_transfer("............1", "teampangea", "1.000000 LEOS"),
        )
    }

    fn token_abis() -> HashMap<AntelopeName, Abi> {
        let mut abis = HashMap::new();
        abis.insert("eosio.token".parse().unwrap(), standard_token_abi());
        abis
    }

    fn live_header() -> TransactionHeader {
        TransactionHeader {
            expiration: 1_700_000_000,
            ref_block_num: 0x1234,
            ref_block_prefix: 0xdeadbeef,
            ..Default::default()
        }
    }

    #[test]
    fn uri_round_trips_through_encode_and_decode() {
        let request = SigningRequest::from_action(pangea_id(), transfer_action())
            .with_callback("https://cb.example/sig?uid=abc123", true)
            .with_info_pair("note", b"hello");
        let uri = request.encode().unwrap();
        assert!(uri.starts_with("esr:"));
        assert!(!uri.contains('='));

        let decoded = SigningRequest::decode(&uri).unwrap();
        assert_eq!(decoded, request);
        assert!(decoded.broadcasts());
        assert!(decoded.background());
        assert_eq!(decoded.callback(), Some("https://cb.example/sig?uid=abc123"));
        assert_eq!(decoded.info_value("note"), Some(&b"hello"[..]));
        assert_eq!(decoded.chain_id().unwrap(), pangea_id());
    }

    #[test]
    fn scheme_variants_are_accepted() {
        let uri = SigningRequest::from_action(pangea_id(), transfer_action())
            .encode()
            .unwrap();
        let payload = uri.strip_prefix("esr:").unwrap();

        for prefix in ["esr:", "esr://", "esr-anchor:", "esr-anchor://"] {
            let alt = format!("{prefix}{payload}");
            assert!(SigningRequest::decode(&alt).is_ok(), "{prefix}");
        }
        assert!(matches!(
            SigningRequest::decode(&format!("wc:{payload}")),
            Err(EsrError::InvalidScheme(_))
        ));
    }

    #[test]
    fn known_chains_encode_as_aliases() {
        let eos: AntelopeChainId =
            "aca376f206b8fc25a6ed44dbdc66547c36c6c33e3a119ffbeaef943642f0e906"
                .parse()
                .unwrap();
        let request = SigningRequest::from_action(eos, transfer_action());
        assert_eq!(request.chain_ref(), &ChainRef::Alias(1));
        assert_eq!(request.chain_id().unwrap(), eos);

        // Pangea is not in the alias registry, so the id rides in full.
        let request = SigningRequest::from_action(pangea_id(), transfer_action());
        assert_eq!(request.chain_ref(), &ChainRef::Id(pangea_id()));
    }

    #[test]
    fn unsupported_versions_are_rejected() {
        let packed = {
            let request = SigningRequest::from_action(pangea_id(), transfer_action());
            let mut w = ByteWriter::new();
            request.pack(&mut w);
            w.into_bytes()
        };
        let mut payload = vec![3]; // version 3, uncompressed
        payload.extend_from_slice(&packed);
        assert!(matches!(
            SigningRequest::decode_payload(&payload),
            Err(EsrError::UnsupportedVersion(3))
        ));
    }

    #[test]
    fn uncompressed_payloads_decode_too() {
        let request = SigningRequest::from_action(pangea_id(), transfer_action());
        let mut w = ByteWriter::new();
        request.pack(&mut w);
        let mut payload = vec![VERSION];
        payload.extend_from_slice(&w.into_bytes());

        let decoded = SigningRequest::decode_payload(&payload).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn garbage_inputs_are_errors_not_panics() {
        assert!(SigningRequest::decode("esr:!!!not-base64!!!").is_err());
        assert!(SigningRequest::decode("esr:").is_err());
        // Valid base64 of garbage bytes with the compressed flag set.
        let garbage = URL_SAFE_NO_PAD.encode([VERSION | COMPRESSED, 1, 2, 3]);
        assert!(SigningRequest::decode(&format!("esr:{garbage}")).is_err());
    }

    #[test]
    fn identity_requests_decode_but_refuse_resolution() {
        let request = SigningRequest::with_body(
            pangea_id(),
            RequestBody::Identity { permission: None },
        );
        let uri = request.encode().unwrap();
        let decoded = SigningRequest::decode(&uri).unwrap();
        assert!(decoded.is_identity());
        assert!(decoded.contract_accounts().is_empty());

        let signer = PermissionLevel::active("alice".parse().unwrap());
        assert!(matches!(
            decoded.resolve(&token_abis(), signer, live_header()),
            Err(EsrError::IdentityUnsupported)
        ));
    }

    #[test]
    fn resolve_substitutes_placeholders_everywhere() {
        let request = SigningRequest::from_action(pangea_id(), transfer_action());
        let signer = PermissionLevel::active("alice".parse().unwrap());
        let resolved = request
            .resolve(&token_abis(), signer, live_header())
            .unwrap();

        let action = &resolved.transaction().actions[0];
        assert_eq!(action.authorization[0].actor.to_string(), "alice");
        assert_eq!(action.authorization[0].permission.to_string(), "active");

        let decoded = standard_token_abi()
            .decode_action_data(&TRANSFER.parse().unwrap(), &action.data)
            .unwrap();
        assert_eq!(decoded["from"], "alice");
        assert_eq!(decoded["to"], "teampangea");
    }

    #[test]
    fn resolve_fills_template_headers_only() {
        let template = Transaction::new(TransactionHeader::default(), vec![transfer_action()]);
        let request = SigningRequest::from_transaction(pangea_id(), template);
        let signer = PermissionLevel::active("alice".parse().unwrap());
        let resolved = request
            .resolve(&token_abis(), signer.clone(), live_header())
            .unwrap();
        assert_eq!(resolved.transaction().header, live_header());

        let concrete = TransactionHeader {
            expiration: 42,
            ref_block_num: 7,
            ref_block_prefix: 9,
            ..Default::default()
        };
        let own_header = Transaction::new(concrete, vec![transfer_action()]);
        let request = SigningRequest::from_transaction(pangea_id(), own_header);
        let resolved = request
            .resolve(&token_abis(), signer, live_header())
            .unwrap();
        assert_eq!(resolved.transaction().header, concrete);
    }

    #[test]
    fn resolve_requires_every_contract_abi() {
        let request = SigningRequest::from_action(pangea_id(), transfer_action());
        let signer = PermissionLevel::active("alice".parse().unwrap());
        let err = request
            .resolve(&HashMap::new(), signer, live_header())
            .unwrap_err();
        assert!(matches!(err, EsrError::MissingAbi(account) if account == "eosio.token"));
    }

    #[test]
    fn contract_accounts_deduplicate_in_order() {
        let other = Action::new(
            "vesting.tmy".parse().unwrap(),
            "withdraw".parse().unwrap(),
            vec![PermissionLevel::placeholder()],
            vec![],
        );
        let request = SigningRequest::from_actions(
            pangea_id(),
            vec![transfer_action(), other, transfer_action()],
        );
        let accounts: Vec<String> = request
            .contract_accounts()
            .iter()
            .map(|a| a.to_string())
            .collect();
        assert_eq!(accounts, ["eosio.token", "vesting.tmy"]);
    }

    #[test]
    fn request_signature_rides_the_tail() {
        let mut request = SigningRequest::from_action(pangea_id(), transfer_action());
        request.signature = Some(RequestSignature {
            signer: "origin.app".parse().unwrap(),
            signature: vec![7u8; 65],
        });
        let uri = request.encode().unwrap();
        let decoded = SigningRequest::decode(&uri).unwrap();
        let signature = decoded.signature().unwrap();
        assert_eq!(signature.signer.to_string(), "origin.app");
        assert_eq!(signature.signature.len(), 65);
    }

    #[test]
    fn hostile_action_counts_fail_instead_of_aborting() {
        // An uncompressed payload whose transaction body claims
        // u32::MAX actions with no bytes behind the claim. Decoding
        // must return an error, never allocate for the claimed count.
        let mut w = ByteWriter::new();
        w.write_varuint32(0); // chain ref: alias
        w.write_u8(1);
        w.write_varuint32(2); // body: full transaction
        TransactionHeader::default().write(&mut w);
        w.write_varuint32(0); // context-free actions
        w.write_varuint32(u32::MAX);
        let mut payload = vec![VERSION];
        payload.extend_from_slice(&w.into_bytes());
        assert!(SigningRequest::decode_payload(&payload).is_err());
    }

    #[test]
    fn flag_toggles() {
        let request = SigningRequest::from_action(pangea_id(), transfer_action());
        assert!(request.broadcasts());
        assert!(!request.background());
        let request = request.with_broadcast(false);
        assert!(!request.broadcasts());
        assert_eq!(request.callback(), None);
    }
}
