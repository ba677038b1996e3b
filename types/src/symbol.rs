//! Antelope symbol type: a token code plus decimal precision.
//!
//! Stored in the wire layout: low byte is the precision, the remaining
//! seven bytes hold the uppercase code, zero padded.

use crate::error::ChainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum decimal precision a symbol can carry.
pub const MAX_PRECISION: u8 = 18;

/// A token symbol such as `4,LEOS` (precision 4, code `LEOS`).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(u64);

impl Symbol {
    pub fn new(code: &str, precision: u8) -> Result<Self, ChainError> {
        if precision > MAX_PRECISION {
            return Err(ChainError::InvalidSymbol(format!(
                "precision {precision} exceeds {MAX_PRECISION}"
            )));
        }
        let bytes = code.as_bytes();
        if bytes.is_empty() || bytes.len() > 7 {
            return Err(ChainError::InvalidSymbol(format!(
                "code must be 1-7 characters: {code:?}"
            )));
        }
        let mut raw = precision as u64;
        for (i, &b) in bytes.iter().enumerate() {
            if !b.is_ascii_uppercase() {
                return Err(ChainError::InvalidSymbol(format!(
                    "code must be uppercase A-Z: {code:?}"
                )));
            }
            raw |= (b as u64) << (8 * (i + 1));
        }
        Ok(Self(raw))
    }

    /// Construct from the packed u64 wire representation.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn precision(&self) -> u8 {
        (self.0 & 0xff) as u8
    }

    pub fn code(&self) -> String {
        let mut out = String::new();
        let mut rest = self.0 >> 8;
        while rest > 0 {
            let b = (rest & 0xff) as u8;
            if b == 0 {
                break;
            }
            out.push(b as char);
            rest >>= 8;
        }
        out
    }

    /// 10^precision, the number of base units per whole token.
    pub fn unit_scale(&self) -> i64 {
        10i64.pow(self.precision() as u32)
    }
}

impl FromStr for Symbol {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (precision, code) = s
            .split_once(',')
            .ok_or_else(|| ChainError::InvalidSymbol(format!("expected <precision>,<CODE>: {s}")))?;
        let precision: u8 = precision
            .parse()
            .map_err(|_| ChainError::InvalidSymbol(format!("bad precision in {s}")))?;
        Self::new(code, precision)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision(), self.code())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({self})")
    }
}

impl Serialize for Symbol {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
