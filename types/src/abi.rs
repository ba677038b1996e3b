//! Antelope contract ABI model and action-data conversion.
//!
//! ABIs arrive as JSON from `get_abi` and drive the translation of packed
//! action data to and from `serde_json::Value`. Only the builtin types
//! that appear in wallet-facing actions are supported; anything else is a
//! protocol error rather than a silent passthrough.

use crate::codec::{ByteReader, ByteWriter};
use crate::error::ChainError;
use crate::name::AntelopeName;
use crate::quantity::Quantity;
use crate::symbol::Symbol;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const MAX_TYPE_DEPTH: usize = 32;

/// A type alias entry (`new_type_name` resolves to `type`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbiTypeAlias {
    pub new_type_name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbiField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbiStruct {
    pub name: String,
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub fields: Vec<AbiField>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbiAction {
    pub name: AntelopeName,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub ricardian_contract: String,
}

/// A contract ABI, as served by `get_abi`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Abi {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub types: Vec<AbiTypeAlias>,
    #[serde(default)]
    pub structs: Vec<AbiStruct>,
    #[serde(default)]
    pub actions: Vec<AbiAction>,
}

impl Abi {
    /// The struct type name an action's data decodes as.
    pub fn action_type(&self, action: &AntelopeName) -> Option<&str> {
        self.actions
            .iter()
            .find(|a| a.name == *action)
            .map(|a| a.type_name.as_str())
    }

    fn struct_def(&self, name: &str) -> Option<&AbiStruct> {
        self.structs.iter().find(|s| s.name == name)
    }

    fn resolve_alias(&self, name: &str) -> Option<&str> {
        self.types
            .iter()
            .find(|t| t.new_type_name == name)
            .map(|t| t.type_name.as_str())
    }

    /// Decode packed action data into a JSON object.
    pub fn decode_action_data(
        &self,
        action: &AntelopeName,
        data: &[u8],
    ) -> Result<Value, ChainError> {
        let type_name = self
            .action_type(action)
            .ok_or_else(|| ChainError::Protocol(format!("action {action} not in ABI")))?
            .to_string();
        let mut reader = ByteReader::new(data);
        let value = self.decode_type(&type_name, &mut reader, 0)?;
        reader.expect_end()?;
        Ok(value)
    }

    /// Encode a JSON object into packed action data.
    pub fn encode_action_data(
        &self,
        action: &AntelopeName,
        value: &Value,
    ) -> Result<Vec<u8>, ChainError> {
        let type_name = self
            .action_type(action)
            .ok_or_else(|| ChainError::Protocol(format!("action {action} not in ABI")))?
            .to_string();
        let mut writer = ByteWriter::new();
        self.encode_type(&type_name, value, &mut writer, 0)?;
        Ok(writer.into_bytes())
    }

    fn decode_type(
        &self,
        type_name: &str,
        reader: &mut ByteReader,
        depth: usize,
    ) -> Result<Value, ChainError> {
        if depth > MAX_TYPE_DEPTH {
            return Err(ChainError::Protocol(format!(
                "ABI type nesting too deep at {type_name}"
            )));
        }
        if let Some(inner) = type_name.strip_suffix('$') {
            // binary extension: absent when the input is exhausted
            if reader.is_empty() {
                return Ok(Value::Null);
            }
            return self.decode_type(inner, reader, depth + 1);
        }
        if let Some(inner) = type_name.strip_suffix("[]") {
            let count = reader.read_varuint32()?;
            let mut items = Vec::with_capacity((count as usize).min(reader.remaining()));
            for _ in 0..count {
                items.push(self.decode_type(inner, reader, depth + 1)?);
            }
            return Ok(Value::Array(items));
        }
        if let Some(inner) = type_name.strip_suffix('?') {
            if reader.read_u8()? == 0 {
                return Ok(Value::Null);
            }
            return self.decode_type(inner, reader, depth + 1);
        }
        if let Some(value) = decode_builtin(type_name, reader)? {
            return Ok(value);
        }
        if let Some(def) = self.struct_def(type_name) {
            return self.decode_struct(def, reader, depth);
        }
        if let Some(resolved) = self.resolve_alias(type_name) {
            let resolved = resolved.to_string();
            return self.decode_type(&resolved, reader, depth + 1);
        }
        Err(ChainError::Protocol(format!("unknown ABI type {type_name}")))
    }

    fn decode_struct(
        &self,
        def: &AbiStruct,
        reader: &mut ByteReader,
        depth: usize,
    ) -> Result<Value, ChainError> {
        let mut object = Map::new();
        if !def.base.is_empty() {
            let base = self.decode_type(&def.base, reader, depth + 1)?;
            match base {
                Value::Object(fields) => object.extend(fields),
                _ => {
                    return Err(ChainError::Protocol(format!(
                        "base {} of {} is not a struct",
                        def.base, def.name
                    )))
                }
            }
        }
        for field in &def.fields {
            let value = self.decode_type(&field.type_name, reader, depth + 1)?;
            object.insert(field.name.clone(), value);
        }
        Ok(Value::Object(object))
    }

    fn encode_type(
        &self,
        type_name: &str,
        value: &Value,
        writer: &mut ByteWriter,
        depth: usize,
    ) -> Result<(), ChainError> {
        if depth > MAX_TYPE_DEPTH {
            return Err(ChainError::Protocol(format!(
                "ABI type nesting too deep at {type_name}"
            )));
        }
        if let Some(inner) = type_name.strip_suffix('$') {
            if value.is_null() {
                return Ok(());
            }
            return self.encode_type(inner, value, writer, depth + 1);
        }
        if let Some(inner) = type_name.strip_suffix("[]") {
            let items = value.as_array().ok_or_else(|| {
                ChainError::Protocol(format!("expected array for {type_name}"))
            })?;
            writer.write_varuint32(items.len() as u32);
            for item in items {
                self.encode_type(inner, item, writer, depth + 1)?;
            }
            return Ok(());
        }
        if let Some(inner) = type_name.strip_suffix('?') {
            if value.is_null() {
                writer.write_u8(0);
                return Ok(());
            }
            writer.write_u8(1);
            return self.encode_type(inner, value, writer, depth + 1);
        }
        if encode_builtin(type_name, value, writer)? {
            return Ok(());
        }
        if let Some(def) = self.struct_def(type_name) {
            return self.encode_struct(def, value, writer, depth);
        }
        if let Some(resolved) = self.resolve_alias(type_name) {
            let resolved = resolved.to_string();
            return self.encode_type(&resolved, value, writer, depth + 1);
        }
        Err(ChainError::Protocol(format!("unknown ABI type {type_name}")))
    }

    fn encode_struct(
        &self,
        def: &AbiStruct,
        value: &Value,
        writer: &mut ByteWriter,
        depth: usize,
    ) -> Result<(), ChainError> {
        let object = value.as_object().ok_or_else(|| {
            ChainError::Protocol(format!("expected object for struct {}", def.name))
        })?;
        if !def.base.is_empty() {
            self.encode_type(&def.base, value, writer, depth + 1)?;
        }
        for field in &def.fields {
            let field_value = object.get(&field.name).unwrap_or(&Value::Null);
            if field_value.is_null()
                && !field.type_name.ends_with('?')
                && !field.type_name.ends_with('$')
            {
                return Err(ChainError::Protocol(format!(
                    "missing field {} for struct {}",
                    field.name, def.name
                )));
            }
            self.encode_type(&field.type_name, field_value, writer, depth + 1)?;
        }
        Ok(())
    }
}

fn decode_builtin(type_name: &str, r: &mut ByteReader) -> Result<Option<Value>, ChainError> {
    let value = match type_name {
        "bool" => Value::Bool(r.read_u8()? != 0),
        "uint8" => Value::from(r.read_u8()?),
        "uint16" => Value::from(r.read_u16()?),
        "uint32" => Value::from(r.read_u32()?),
        "varuint32" => Value::from(r.read_varuint32()?),
        // 64-bit integers travel as strings so no JSON reader loses precision
        "uint64" => Value::String(r.read_u64()?.to_string()),
        "int8" => Value::from(r.read_u8()? as i8),
        "int16" => Value::from(r.read_u16()? as i16),
        "int32" => Value::from(r.read_u32()? as i32),
        "int64" => Value::String(r.read_i64()?.to_string()),
        "float64" => {
            let bits = r.read_u64()?;
            let f = f64::from_bits(bits);
            match serde_json::Number::from_f64(f) {
                Some(n) => Value::Number(n),
                None => Value::String(f.to_string()),
            }
        }
        "name" => Value::String(r.read_name()?.to_string()),
        "string" => Value::String(r.read_string()?),
        "bytes" => Value::String(hex::encode(r.read_bytes()?)),
        "checksum256" => Value::String(hex::encode(r.read_checksum256()?)),
        "asset" => Value::String(r.read_quantity()?.to_string()),
        "symbol" => Value::String(r.read_symbol()?.to_string()),
        "symbol_code" => Value::String(Symbol::from_raw(r.read_u64()? << 8).code()),
        "time_point_sec" => {
            let secs = r.read_u32()?;
            let ts = DateTime::<Utc>::from_timestamp(secs as i64, 0)
                .ok_or_else(|| ChainError::Codec("time_point_sec out of range".into()))?;
            Value::String(ts.format("%Y-%m-%dT%H:%M:%S").to_string())
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn encode_builtin(
    type_name: &str,
    value: &Value,
    w: &mut ByteWriter,
) -> Result<bool, ChainError> {
    match type_name {
        "bool" => {
            let b = value
                .as_bool()
                .ok_or_else(|| expected("bool", value))?;
            w.write_u8(b as u8);
        }
        "uint8" => w.write_u8(int_in_range(value, u8::MAX as u64)? as u8),
        "uint16" => w.write_u16(int_in_range(value, u16::MAX as u64)? as u16),
        "uint32" => w.write_u32(int_in_range(value, u32::MAX as u64)? as u32),
        "varuint32" => w.write_varuint32(int_in_range(value, u32::MAX as u64)? as u32),
        "uint64" => w.write_u64(value_to_u64(value)?),
        "int8" => w.write_u8(signed_in_range(value, i8::MIN as i64, i8::MAX as i64)? as u8),
        "int16" => w.write_u16(signed_in_range(value, i16::MIN as i64, i16::MAX as i64)? as u16),
        "int32" => w.write_u32(signed_in_range(value, i32::MIN as i64, i32::MAX as i64)? as u32),
        "int64" => w.write_i64(value_to_i64(value)?),
        "float64" => {
            let f = value.as_f64().ok_or_else(|| expected("float64", value))?;
            w.write_u64(f.to_bits());
        }
        "name" => {
            let s = value.as_str().ok_or_else(|| expected("name", value))?;
            w.write_name(&s.parse()?);
        }
        "string" => {
            let s = value.as_str().ok_or_else(|| expected("string", value))?;
            w.write_string(s);
        }
        "bytes" => {
            let s = value.as_str().ok_or_else(|| expected("bytes", value))?;
            let bytes =
                hex::decode(s).map_err(|_| ChainError::Codec(format!("bad hex bytes: {s}")))?;
            w.write_bytes(&bytes);
        }
        "checksum256" => {
            let s = value.as_str().ok_or_else(|| expected("checksum256", value))?;
            let bytes =
                hex::decode(s).map_err(|_| ChainError::Codec(format!("bad checksum: {s}")))?;
            let arr: [u8; 32] = bytes
                .try_into()
                .map_err(|_| ChainError::Codec(format!("checksum must be 32 bytes: {s}")))?;
            w.write_checksum256(&arr);
        }
        "asset" => {
            let s = value.as_str().ok_or_else(|| expected("asset", value))?;
            w.write_quantity(&s.parse::<Quantity>()?);
        }
        "symbol" => {
            let s = value.as_str().ok_or_else(|| expected("symbol", value))?;
            w.write_symbol(&s.parse::<Symbol>()?);
        }
        "symbol_code" => {
            let s = value.as_str().ok_or_else(|| expected("symbol_code", value))?;
            let sym = Symbol::new(s, 0)?;
            w.write_u64(sym.raw() >> 8);
        }
        "time_point_sec" => {
            let secs = match value {
                Value::Number(_) => int_in_range(value, u32::MAX as u64)? as u32,
                Value::String(s) => parse_time_point_sec(s)?,
                _ => return Err(expected("time_point_sec", value)),
            };
            w.write_u32(secs);
        }
        _ => return Ok(false),
    }
    Ok(true)
}

fn parse_time_point_sec(s: &str) -> Result<u32, ChainError> {
    let trimmed = s.trim_end_matches('Z');
    let parsed = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| ChainError::Codec(format!("bad time_point_sec: {s}")))?;
    let secs = parsed.and_utc().timestamp();
    u32::try_from(secs).map_err(|_| ChainError::Codec(format!("time out of range: {s}")))
}

fn expected(type_name: &str, value: &Value) -> ChainError {
    ChainError::Protocol(format!("expected {type_name}, got {value}"))
}

fn value_to_u64(value: &Value) -> Result<u64, ChainError> {
    match value {
        Value::Number(n) => n.as_u64().ok_or_else(|| expected("uint64", value)),
        Value::String(s) => s
            .parse()
            .map_err(|_| ChainError::Protocol(format!("bad uint64: {s}"))),
        _ => Err(expected("uint64", value)),
    }
}

fn value_to_i64(value: &Value) -> Result<i64, ChainError> {
    match value {
        Value::Number(n) => n.as_i64().ok_or_else(|| expected("int64", value)),
        Value::String(s) => s
            .parse()
            .map_err(|_| ChainError::Protocol(format!("bad int64: {s}"))),
        _ => Err(expected("int64", value)),
    }
}

fn int_in_range(value: &Value, max: u64) -> Result<u64, ChainError> {
    let v = value_to_u64(value)?;
    if v > max {
        return Err(ChainError::Protocol(format!("{v} out of range (max {max})")));
    }
    Ok(v)
}

fn signed_in_range(value: &Value, min: i64, max: i64) -> Result<i64, ChainError> {
    let v = value_to_i64(value)?;
    if v < min || v > max {
        return Err(ChainError::Protocol(format!("{v} out of range")));
    }
    Ok(v)
}

/// The `eosio.token` transfer ABI, used as a fallback when a chain serves
/// token contracts with the standard interface.
pub fn standard_token_abi() -> Abi {
    Abi {
        version: "eosio::abi/1.2".into(),
        types: Vec::new(),
        structs: vec![AbiStruct {
            name: "transfer".into(),
            base: String::new(),
            fields: vec![
                AbiField { name: "from".into(), type_name: "name".into() },
                AbiField { name: "to".into(), type_name: "name".into() },
                AbiField { name: "quantity".into(), type_name: "asset".into() },
                AbiField { name: "memo".into(), type_name: "string".into() },
            ],
        }],
        actions: vec![AbiAction {
            name: AntelopeName::from_raw(0xcdcd3c2d57000000), // "transfer"
            type_name: "transfer".into(),
            ricardian_contract: String::new(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transfer_abi() -> Abi {
        standard_token_abi()
    }

    #[test]
    fn transfer_name_constant_is_correct() {
        let expected: AntelopeName = "transfer".parse().unwrap();
        assert_eq!(transfer_abi().actions[0].name, expected);
    }

    #[test]
    fn transfer_data_round_trips() {
        let abi = transfer_abi();
        let action: AntelopeName = "transfer".parse().unwrap();
        let data = json!({
            "from": "alice",
            "to": "bob",
            "quantity": "1.0000 EOS",
            "memo": "rent"
        });
        let packed = abi.encode_action_data(&action, &data).unwrap();
        let decoded = abi.decode_action_data(&action, &packed).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn optional_and_array_modifiers() {
        let abi = Abi {
            structs: vec![AbiStruct {
                name: "tagset".into(),
                base: String::new(),
                fields: vec![
                    AbiField { name: "tags".into(), type_name: "string[]".into() },
                    AbiField { name: "note".into(), type_name: "string?".into() },
                ],
            }],
            actions: vec![AbiAction {
                name: "tagset".parse().unwrap(),
                type_name: "tagset".into(),
                ricardian_contract: String::new(),
            }],
            ..Default::default()
        };
        let action: AntelopeName = "tagset".parse().unwrap();
        let with_note = json!({ "tags": ["a", "b"], "note": "x" });
        let packed = abi.encode_action_data(&action, &with_note).unwrap();
        assert_eq!(abi.decode_action_data(&action, &packed).unwrap(), with_note);

        let without_note = json!({ "tags": [], "note": null });
        let packed = abi.encode_action_data(&action, &without_note).unwrap();
        assert_eq!(
            abi.decode_action_data(&action, &packed).unwrap(),
            without_note
        );
    }

    #[test]
    fn huge_claimed_array_count_is_an_error() {
        let abi = Abi {
            structs: vec![AbiStruct {
                name: "tagset".into(),
                base: String::new(),
                fields: vec![AbiField {
                    name: "tags".into(),
                    type_name: "string[]".into(),
                }],
            }],
            actions: vec![AbiAction {
                name: "tagset".parse().unwrap(),
                type_name: "tagset".into(),
                ricardian_contract: String::new(),
            }],
            ..Default::default()
        };
        let action: AntelopeName = "tagset".parse().unwrap();
        // varuint u32::MAX element count with no elements behind it.
        let data = [0xff, 0xff, 0xff, 0xff, 0x0f];
        assert!(abi.decode_action_data(&action, &data).is_err());
    }

    #[test]
    fn aliases_resolve() {
        let abi = Abi {
            types: vec![AbiTypeAlias {
                new_type_name: "account_name".into(),
                type_name: "name".into(),
            }],
            structs: vec![AbiStruct {
                name: "ping".into(),
                base: String::new(),
                fields: vec![AbiField {
                    name: "who".into(),
                    type_name: "account_name".into(),
                }],
            }],
            actions: vec![AbiAction {
                name: "ping".parse().unwrap(),
                type_name: "ping".into(),
                ricardian_contract: String::new(),
            }],
            ..Default::default()
        };
        let action: AntelopeName = "ping".parse().unwrap();
        let data = json!({ "who": "eosio" });
        let packed = abi.encode_action_data(&action, &data).unwrap();
        assert_eq!(abi.decode_action_data(&action, &packed).unwrap(), data);
    }

    #[test]
    fn unknown_action_and_type_are_protocol_errors() {
        let abi = transfer_abi();
        let action: AntelopeName = "missing".parse().unwrap();
        assert!(matches!(
            abi.decode_action_data(&action, &[]),
            Err(ChainError::Protocol(_))
        ));
    }

    #[test]
    fn trailing_bytes_rejected() {
        let abi = transfer_abi();
        let action: AntelopeName = "transfer".parse().unwrap();
        let data = json!({
            "from": "alice", "to": "bob",
            "quantity": "1.0000 EOS", "memo": ""
        });
        let mut packed = abi.encode_action_data(&action, &data).unwrap();
        packed.push(0xff);
        assert!(abi.decode_action_data(&action, &packed).is_err());
    }

    #[test]
    fn parses_get_abi_shape() {
        let raw = r#"{
            "version": "eosio::abi/1.2",
            "types": [],
            "structs": [
                {"name": "transfer", "base": "", "fields": [
                    {"name": "from", "type": "name"},
                    {"name": "to", "type": "name"},
                    {"name": "quantity", "type": "asset"},
                    {"name": "memo", "type": "string"}
                ]}
            ],
            "actions": [
                {"name": "transfer", "type": "transfer", "ricardian_contract": ""}
            ]
        }"#;
        let abi: Abi = serde_json::from_str(raw).unwrap();
        assert_eq!(abi.action_type(&"transfer".parse().unwrap()), Some("transfer"));
    }
}
