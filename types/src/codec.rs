//! Antelope binary serialization primitives.
//!
//! Little-endian integers, varuint32 length prefixes, and the packed
//! forms of names, symbols, and quantities. Both the transaction packer
//! and the signing-request codec build on this module.

use crate::error::ChainError;
use crate::name::AntelopeName;
use crate::quantity::Quantity;
use crate::symbol::Symbol;

fn truncated() -> ChainError {
    ChainError::Codec("unexpected end of input".into())
}

/// Append-only buffer for the Antelope wire format.
#[derive(Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// LEB128 unsigned varint, as used for lengths and counts.
    pub fn write_varuint32(&mut self, mut v: u32) {
        loop {
            let mut byte = (v & 0x7f) as u8;
            v >>= 7;
            if v != 0 {
                byte |= 0x80;
            }
            self.buf.push(byte);
            if v == 0 {
                break;
            }
        }
    }

    /// Raw bytes with no length prefix.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Varuint length prefix followed by the bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_varuint32(bytes.len() as u32);
        self.write_raw(bytes);
    }

    pub fn write_string(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    pub fn write_checksum256(&mut self, hash: &[u8; 32]) {
        self.write_raw(hash);
    }

    pub fn write_name(&mut self, name: &AntelopeName) {
        self.write_u64(name.raw());
    }

    pub fn write_symbol(&mut self, symbol: &Symbol) {
        self.write_u64(symbol.raw());
    }

    pub fn write_quantity(&mut self, quantity: &Quantity) {
        self.write_i64(quantity.units());
        self.write_symbol(&quantity.symbol());
    }
}

/// Cursor over a byte slice in the Antelope wire format.
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ChainError> {
        if self.remaining() < n {
            return Err(truncated());
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, ChainError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, ChainError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, ChainError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u64(&mut self) -> Result<u64, ChainError> {
        let b = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(b);
        Ok(u64::from_le_bytes(arr))
    }

    pub fn read_i64(&mut self) -> Result<i64, ChainError> {
        Ok(self.read_u64()? as i64)
    }

    pub fn read_varuint32(&mut self) -> Result<u32, ChainError> {
        let mut value: u32 = 0;
        let mut shift = 0;
        loop {
            let byte = self.read_u8()?;
            if shift >= 32 {
                return Err(ChainError::Codec("varuint32 overflows".into()));
            }
            value |= ((byte & 0x7f) as u32) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
        }
        Ok(value)
    }

    pub fn read_raw(&mut self, n: usize) -> Result<&'a [u8], ChainError> {
        self.take(n)
    }

    pub fn read_bytes(&mut self) -> Result<Vec<u8>, ChainError> {
        let len = self.read_varuint32()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    pub fn read_string(&mut self) -> Result<String, ChainError> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes).map_err(|_| ChainError::Codec("string is not UTF-8".into()))
    }

    pub fn read_checksum256(&mut self) -> Result<[u8; 32], ChainError> {
        let b = self.take(32)?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(b);
        Ok(arr)
    }

    pub fn read_name(&mut self) -> Result<AntelopeName, ChainError> {
        Ok(AntelopeName::from_raw(self.read_u64()?))
    }

    pub fn read_symbol(&mut self) -> Result<Symbol, ChainError> {
        Ok(Symbol::from_raw(self.read_u64()?))
    }

    pub fn read_quantity(&mut self) -> Result<Quantity, ChainError> {
        let units = self.read_i64()?;
        let symbol = self.read_symbol()?;
        Ok(Quantity::new(units, symbol))
    }

    /// Error unless the whole input was consumed.
    pub fn expect_end(&self) -> Result<(), ChainError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ChainError::Codec(format!(
                "{} trailing bytes after payload",
                self.remaining()
            )))
        }
    }
}
