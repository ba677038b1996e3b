//! Antelope account, action, table, and permission names.
//!
//! Names are up to 13 characters from the base-32 alphabet `.12345a-z`,
//! packed into a u64. The 13th character only carries 4 bits and is
//! therefore restricted to `.1-5a-j`.

use crate::error::ChainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const CHARMAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

fn char_to_symbol(c: u8) -> Option<u64> {
    match c {
        b'.' => Some(0),
        b'1'..=b'5' => Some((c - b'1') as u64 + 1),
        b'a'..=b'z' => Some((c - b'a') as u64 + 6),
        _ => None,
    }
}

/// A packed Antelope name.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AntelopeName(u64);

impl AntelopeName {
    /// Signing-request placeholder that resolves to the signer's actor.
    ///
    /// String form `............1`.
    pub const PLACEHOLDER_ACTOR: Self = Self(1);

    /// Signing-request placeholder that resolves to the signer's permission.
    ///
    /// String form `............2`.
    pub const PLACEHOLDER_PERMISSION: Self = Self(2);

    /// The default `active` permission name.
    pub const ACTIVE: Self = Self(0x3232_eda8_0000_0000);

    /// Construct from the packed u64 representation.
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// The packed u64 representation.
    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn is_placeholder(&self) -> bool {
        *self == Self::PLACEHOLDER_ACTOR || *self == Self::PLACEHOLDER_PERMISSION
    }

    /// Whether a string is a well-formed name without parsing errors.
    pub fn is_valid(s: &str) -> bool {
        s.parse::<Self>().is_ok()
    }
}

impl FromStr for AntelopeName {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.is_empty() || bytes.len() > 13 {
            return Err(ChainError::InvalidName(format!(
                "name must be 1-13 characters: {s:?}"
            )));
        }
        if bytes[bytes.len() - 1] == b'.' {
            return Err(ChainError::InvalidName(format!(
                "name must not end with '.': {s:?}"
            )));
        }
        let mut value: u64 = 0;
        for (i, &b) in bytes.iter().enumerate() {
            let sym = char_to_symbol(b)
                .ok_or_else(|| ChainError::InvalidName(format!("invalid character in {s:?}")))?;
            if i < 12 {
                value |= (sym & 0x1f) << (64 - 5 * (i + 1));
            } else {
                // 13th character carries only the low 4 bits
                if sym > 0x0f {
                    return Err(ChainError::InvalidName(format!(
                        "13th character of {s:?} must be in .1-5a-j"
                    )));
                }
                value |= sym;
            }
        }
        Ok(Self(value))
    }
}

impl fmt::Display for AntelopeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = [b'.'; 13];
        let mut tmp = self.0;
        for i in 0..13 {
            let mask = if i == 0 { 0x0f } else { 0x1f };
            out[12 - i] = CHARMAP[(tmp & mask) as usize];
            tmp >>= if i == 0 { 4 } else { 5 };
        }
        let end = out
            .iter()
            .rposition(|&c| c != b'.')
            .map(|p| p + 1)
            .unwrap_or(0);
        // bytes come from CHARMAP, always valid ASCII
        write!(f, "{}", std::str::from_utf8(&out[..end]).unwrap_or(""))
    }
}

impl fmt::Debug for AntelopeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AntelopeName({self})")
    }
}

impl Serialize for AntelopeName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AntelopeName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
