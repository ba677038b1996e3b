//! Legacy (EIP-155) Ethereum transaction encoding and signing.
//!
//! Transactions are RLP-encoded as the canonical 9-item list with
//! `v = chain_id * 2 + 35 + parity`, which replay-protects the
//! signature on the signing chain.

use rlp::RlpStream;
use serde_json::{json, Map, Value};

use pangea_crypto::{keccak256, sign_prehash, PrivateKey, RecoverableSignature};
use pangea_types::{ChainError, EthereumAddress};

use crate::ethereum_rpc::{hex_quantity, parse_hex_u128, parse_hex_u64};

/// An Ethereum transaction in request form.
///
/// `nonce`, `gas_price`, and `gas_limit` may be left unset and filled
/// from the RPC node before signing; [`sign`](Self::sign) fails on an
/// incomplete request.
#[derive(Clone, Debug, PartialEq)]
pub struct EthereumTransactionRequest {
    pub from: Option<EthereumAddress>,
    pub to: Option<EthereumAddress>,
    /// Value in wei.
    pub value: u128,
    pub data: Vec<u8>,
    pub gas_limit: Option<u128>,
    pub gas_price: Option<u128>,
    pub nonce: Option<u64>,
    pub chain_id: u64,
}

impl EthereumTransactionRequest {
    /// A plain value transfer.
    pub fn transfer(to: EthereumAddress, value: u128, chain_id: u64) -> Self {
        Self {
            from: None,
            to: Some(to),
            value,
            data: Vec::new(),
            gas_limit: None,
            gas_price: None,
            nonce: None,
            chain_id,
        }
    }

    /// Parse the transaction object of an `eth_sendTransaction` call.
    ///
    /// Accepts either the params array (`[{...}]`) or the bare object.
    /// Quantities are `0x` hex strings per the JSON-RPC convention.
    pub fn from_rpc_params(params: &Value, chain_id: u64) -> Result<Self, ChainError> {
        let object = match params {
            Value::Array(items) => items
                .first()
                .ok_or_else(|| ChainError::Protocol("empty transaction params".to_string()))?,
            other => other,
        };
        let object = object.as_object().ok_or_else(|| {
            ChainError::Protocol("transaction params must be an object".to_string())
        })?;

        let value = match hex_field(object, "value") {
            Some(s) => parse_hex_u128(s)?,
            None => 0,
        };
        let data = match hex_field(object, "data").or_else(|| hex_field(object, "input")) {
            Some(s) => hex::decode(s.strip_prefix("0x").unwrap_or(s))
                .map_err(|e| ChainError::Protocol(format!("invalid transaction data: {e}")))?,
            None => Vec::new(),
        };
        let gas_limit = match hex_field(object, "gas").or_else(|| hex_field(object, "gasLimit")) {
            Some(s) => Some(parse_hex_u128(s)?),
            None => None,
        };
        let gas_price = match hex_field(object, "gasPrice") {
            Some(s) => Some(parse_hex_u128(s)?),
            None => None,
        };
        let nonce = match hex_field(object, "nonce") {
            Some(s) => Some(parse_hex_u64(s)?),
            None => None,
        };

        Ok(Self {
            from: parse_address_field(object, "from")?,
            to: parse_address_field(object, "to")?,
            value,
            data,
            gas_limit,
            gas_price,
            nonce,
            chain_id,
        })
    }

    /// The call object for `eth_estimateGas`.
    pub fn to_call_object(&self) -> Value {
        let mut object = Map::new();
        if let Some(from) = &self.from {
            object.insert("from".to_string(), json!(from.checksummed()));
        }
        if let Some(to) = &self.to {
            object.insert("to".to_string(), json!(to.checksummed()));
        }
        object.insert("value".to_string(), json!(hex_quantity(self.value)));
        if !self.data.is_empty() {
            object.insert(
                "data".to_string(),
                json!(format!("0x{}", hex::encode(&self.data))),
            );
        }
        Value::Object(object)
    }

    /// The 4-byte selector of a contract call, as `0x` hex.
    pub fn function_selector(&self) -> Option<String> {
        if self.data.len() < 4 {
            return None;
        }
        Some(format!("0x{}", hex::encode(&self.data[..4])))
    }

    pub fn is_complete(&self) -> bool {
        self.nonce.is_some() && self.gas_price.is_some() && self.gas_limit.is_some()
    }

    /// Keccak-256 of the EIP-155 signing preimage.
    pub fn signing_hash(&self) -> Result<[u8; 32], ChainError> {
        Ok(keccak256(&self.rlp_unsigned()?))
    }

    /// Sign the request, returning the raw transaction and its hash.
    pub fn sign(&self, key: &PrivateKey) -> Result<(Vec<u8>, [u8; 32]), ChainError> {
        let digest = self.signing_hash()?;
        let signature = sign_prehash(&digest, key)?;
        let raw = self.rlp_signed(&signature)?;
        let hash = keccak256(&raw);
        Ok((raw, hash))
    }

    fn require_complete(&self) -> Result<(u64, u128, u128), ChainError> {
        let nonce = self
            .nonce
            .ok_or_else(|| ChainError::Protocol("transaction nonce not set".to_string()))?;
        let gas_price = self
            .gas_price
            .ok_or_else(|| ChainError::Protocol("transaction gas price not set".to_string()))?;
        let gas_limit = self
            .gas_limit
            .ok_or_else(|| ChainError::Protocol("transaction gas limit not set".to_string()))?;
        Ok((nonce, gas_price, gas_limit))
    }

    fn append_body(&self, stream: &mut RlpStream) -> Result<(), ChainError> {
        let (nonce, gas_price, gas_limit) = self.require_complete()?;
        stream.append(&be_bytes(nonce as u128));
        stream.append(&be_bytes(gas_price));
        stream.append(&be_bytes(gas_limit));
        match &self.to {
            Some(to) => stream.append(&to.as_bytes().to_vec()),
            None => stream.append_empty_data(),
        };
        stream.append(&be_bytes(self.value));
        stream.append(&self.data);
        Ok(())
    }

    fn rlp_unsigned(&self) -> Result<Vec<u8>, ChainError> {
        let mut stream = RlpStream::new();
        stream.begin_list(9);
        self.append_body(&mut stream)?;
        stream.append(&be_bytes(self.chain_id as u128));
        stream.append_empty_data(); // r = 0
        stream.append_empty_data(); // s = 0
        Ok(stream.out().to_vec())
    }

    fn rlp_signed(&self, signature: &RecoverableSignature) -> Result<Vec<u8>, ChainError> {
        let v = self.chain_id as u128 * 2 + 35 + signature.recovery as u128;
        let mut stream = RlpStream::new();
        stream.begin_list(9);
        self.append_body(&mut stream)?;
        stream.append(&be_bytes(v));
        stream.append(&trim_leading_zeros(&signature.r));
        stream.append(&trim_leading_zeros(&signature.s));
        Ok(stream.out().to_vec())
    }
}

/// Minimal big-endian byte form, as RLP canonical integers require.
fn be_bytes(v: u128) -> Vec<u8> {
    let bytes = v.to_be_bytes();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[first..].to_vec()
}

fn trim_leading_zeros(bytes: &[u8]) -> Vec<u8> {
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[first..].to_vec()
}

fn hex_field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object.get(key).and_then(Value::as_str)
}

fn parse_address_field(
    object: &Map<String, Value>,
    key: &str,
) -> Result<Option<EthereumAddress>, ChainError> {
    match object.get(key).and_then(Value::as_str) {
        Some(s) => Ok(Some(s.parse()?)),
        None => Ok(None),
    }
}
