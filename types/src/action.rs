//! The Antelope transaction wire model.
//!
//! Actions, authorization levels, and the transaction envelope in the
//! exact form they are packed for signing. Signing requests and the
//! transaction signer both build on these types; anything with JSON
//! argument data is converted to packed bytes before it gets here.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::{ByteReader, ByteWriter};
use crate::error::ChainError;
use crate::name::AntelopeName;

/// An authorization entry: `actor@permission`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionLevel {
    pub actor: AntelopeName,
    pub permission: AntelopeName,
}

impl PermissionLevel {
    pub fn new(actor: AntelopeName, permission: AntelopeName) -> Self {
        Self { actor, permission }
    }

    /// `actor@active`, the default signing permission.
    pub fn active(actor: AntelopeName) -> Self {
        Self {
            actor,
            permission: AntelopeName::ACTIVE,
        }
    }

    /// The `............1@............2` form signing requests carry
    /// before a signer is known.
    pub fn placeholder() -> Self {
        Self {
            actor: AntelopeName::PLACEHOLDER_ACTOR,
            permission: AntelopeName::PLACEHOLDER_PERMISSION,
        }
    }

    pub fn write(&self, w: &mut ByteWriter) {
        w.write_name(&self.actor);
        w.write_name(&self.permission);
    }

    pub fn read(r: &mut ByteReader) -> Result<Self, ChainError> {
        Ok(Self {
            actor: r.read_name()?,
            permission: r.read_name()?,
        })
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.actor, self.permission)
    }
}

/// A contract action with packed argument data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// The contract account the action executes on.
    pub account: AntelopeName,
    /// The action name within the contract.
    pub name: AntelopeName,
    pub authorization: Vec<PermissionLevel>,
    /// Argument data, already encoded against the contract ABI.
    #[serde(with = "hex_data")]
    pub data: Vec<u8>,
}

impl Action {
    pub fn new(
        account: AntelopeName,
        name: AntelopeName,
        authorization: Vec<PermissionLevel>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            account,
            name,
            authorization,
            data,
        }
    }

    pub fn write(&self, w: &mut ByteWriter) {
        w.write_name(&self.account);
        w.write_name(&self.name);
        w.write_varuint32(self.authorization.len() as u32);
        for level in &self.authorization {
            level.write(w);
        }
        w.write_bytes(&self.data);
    }

    pub fn read(r: &mut ByteReader) -> Result<Self, ChainError> {
        let account = r.read_name()?;
        let name = r.read_name()?;
        let count = r.read_varuint32()?;
        // The claimed count is untrusted; reserve no more than the
        // input could possibly hold.
        let mut authorization = Vec::with_capacity((count as usize).min(r.remaining()));
        for _ in 0..count {
            authorization.push(PermissionLevel::read(r)?);
        }
        let data = r.read_bytes()?;
        Ok(Self {
            account,
            name,
            authorization,
            data,
        })
    }
}

/// TAPoS reference-block fields plus resource limits.
///
/// A header with all three anchor fields zero is a template: signing
/// requests ship them zeroed and the wallet fills them from live chain
/// state before signing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionHeader {
    /// Expiration as seconds since the Unix epoch (`time_point_sec`).
    pub expiration: u32,
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
    pub max_net_usage_words: u32,
    pub max_cpu_usage_ms: u8,
    pub delay_sec: u32,
}

impl TransactionHeader {
    /// A header anchored to `reference_block_id` (a 32-byte block id in
    /// hex) and expiring at `expiration`.
    pub fn new(expiration: DateTime<Utc>, reference_block_id: &str) -> Result<Self, ChainError> {
        let bytes = hex::decode(reference_block_id)
            .map_err(|_| ChainError::Protocol(format!("bad block id: {reference_block_id}")))?;
        if bytes.len() != 32 {
            return Err(ChainError::Protocol(format!(
                "block id must be 32 bytes: {reference_block_id}"
            )));
        }
        // A block id leads with the big-endian block number; the prefix
        // is the little-endian word at offset 8.
        let block_num = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let prefix = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        let expiration = u32::try_from(expiration.timestamp())
            .map_err(|_| ChainError::Protocol("expiration out of range".to_string()))?;
        Ok(Self {
            expiration,
            ref_block_num: (block_num & 0xffff) as u16,
            ref_block_prefix: prefix,
            max_net_usage_words: 0,
            max_cpu_usage_ms: 0,
            delay_sec: 0,
        })
    }

    /// True when none of the anchor fields has been filled in.
    pub fn is_template(&self) -> bool {
        self.expiration == 0 && self.ref_block_num == 0 && self.ref_block_prefix == 0
    }

    pub fn expiration_time(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.expiration as i64, 0)
    }

    pub fn write(&self, w: &mut ByteWriter) {
        w.write_u32(self.expiration);
        w.write_u16(self.ref_block_num);
        w.write_u32(self.ref_block_prefix);
        w.write_varuint32(self.max_net_usage_words);
        w.write_u8(self.max_cpu_usage_ms);
        w.write_varuint32(self.delay_sec);
    }

    pub fn read(r: &mut ByteReader) -> Result<Self, ChainError> {
        Ok(Self {
            expiration: r.read_u32()?,
            ref_block_num: r.read_u16()?,
            ref_block_prefix: r.read_u32()?,
            max_net_usage_words: r.read_varuint32()?,
            max_cpu_usage_ms: r.read_u8()?,
            delay_sec: r.read_varuint32()?,
        })
    }
}

/// The signable transaction envelope: header plus ordered actions.
///
/// Context-free actions and transaction extensions are not supported;
/// packing writes them empty and reading rejects inputs that carry any.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub header: TransactionHeader,
    pub actions: Vec<Action>,
}

impl Transaction {
    pub fn new(header: TransactionHeader, actions: Vec<Action>) -> Self {
        Self { header, actions }
    }

    /// The packed form that is hashed for signing and submitted to the
    /// chain.
    pub fn pack(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        self.write(&mut w);
        w.into_bytes()
    }

    pub fn write(&self, w: &mut ByteWriter) {
        self.header.write(w);
        w.write_varuint32(0); // context-free actions
        w.write_varuint32(self.actions.len() as u32);
        for action in &self.actions {
            action.write(w);
        }
        w.write_varuint32(0); // transaction extensions
    }

    pub fn read(r: &mut ByteReader) -> Result<Self, ChainError> {
        let header = TransactionHeader::read(r)?;
        let context_free = r.read_varuint32()?;
        if context_free != 0 {
            return Err(ChainError::Codec(
                "context-free actions are not supported".to_string(),
            ));
        }
        let count = r.read_varuint32()?;
        let mut actions = Vec::with_capacity((count as usize).min(r.remaining()));
        for _ in 0..count {
            actions.push(Action::read(r)?);
        }
        let extensions = r.read_varuint32()?;
        if extensions != 0 {
            return Err(ChainError::Codec(
                "transaction extensions are not supported".to_string(),
            ));
        }
        Ok(Self { header, actions })
    }

    /// Parse a fully packed transaction, rejecting trailing bytes.
    pub fn unpack(data: &[u8]) -> Result<Self, ChainError> {
        let mut r = ByteReader::new(data);
        let tx = Self::read(&mut r)?;
        r.expect_end()?;
        Ok(tx)
    }
}

mod hex_data {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}
