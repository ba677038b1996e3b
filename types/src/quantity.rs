//! Antelope asset quantities: an integer unit count plus a symbol.
//!
//! Quantities are exact fixed-point values. Parsing a string such as
//! `12.3400 LEOS` infers precision 4 from the decimal literal, and the
//! string form always renders with exactly the symbol's precision.

use crate::error::ChainError;
use crate::symbol::Symbol;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A token quantity in base units.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Quantity {
    units: i64,
    symbol: Symbol,
}

impl Quantity {
    pub fn new(units: i64, symbol: Symbol) -> Self {
        Self { units, symbol }
    }

    pub fn zero(symbol: Symbol) -> Self {
        Self { units: 0, symbol }
    }

    pub fn units(&self) -> i64 {
        self.units
    }

    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    pub fn is_zero(&self) -> bool {
        self.units == 0
    }

    pub fn is_negative(&self) -> bool {
        self.units < 0
    }

    /// Add a quantity of the same symbol.
    pub fn checked_add(self, other: Self) -> Result<Self, ChainError> {
        self.require_same_symbol(&other)?;
        let units = self
            .units
            .checked_add(other.units)
            .ok_or_else(|| ChainError::InvalidQuantity("amount overflows".into()))?;
        Ok(Self { units, symbol: self.symbol })
    }

    /// Subtract a quantity of the same symbol.
    pub fn checked_sub(self, other: Self) -> Result<Self, ChainError> {
        self.require_same_symbol(&other)?;
        let units = self
            .units
            .checked_sub(other.units)
            .ok_or_else(|| ChainError::InvalidQuantity("amount overflows".into()))?;
        Ok(Self { units, symbol: self.symbol })
    }

    fn require_same_symbol(&self, other: &Self) -> Result<(), ChainError> {
        if self.symbol != other.symbol {
            return Err(ChainError::TokenMismatch {
                expected: self.symbol.to_string(),
                found: other.symbol.to_string(),
            });
        }
        Ok(())
    }
}

impl FromStr for Quantity {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (amount, code) = s
            .trim()
            .split_once(' ')
            .ok_or_else(|| ChainError::InvalidQuantity(format!("expected <amount> <SYMBOL>: {s}")))?;
        let (negative, digits) = match amount.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, amount),
        };
        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) => (i, f),
            None => (digits, ""),
        };
        if int_part.is_empty()
            || !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
            || (digits.contains('.') && frac_part.is_empty())
        {
            return Err(ChainError::InvalidQuantity(format!("bad amount: {s}")));
        }
        let precision = frac_part.len() as u8;
        let symbol = Symbol::new(code, precision)?;

        let overflow = || ChainError::InvalidQuantity(format!("amount overflows: {s}"));
        let int: i64 = int_part.parse().map_err(|_| overflow())?;
        let frac: i64 = if frac_part.is_empty() {
            0
        } else {
            frac_part.parse().map_err(|_| overflow())?
        };
        let mut units = int
            .checked_mul(symbol.unit_scale())
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(overflow)?;
        if negative {
            units = -units;
        }
        Ok(Self { units, symbol })
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scale = self.symbol.unit_scale();
        let abs = self.units.unsigned_abs();
        let sign = if self.units < 0 { "-" } else { "" };
        let whole = abs / scale as u64;
        if self.symbol.precision() == 0 {
            write!(f, "{sign}{whole} {}", self.symbol.code())
        } else {
            let frac = abs % scale as u64;
            write!(
                f,
                "{sign}{whole}.{frac:0width$} {}",
                self.symbol.code(),
                width = self.symbol.precision() as usize
            )
        }
    }
}

impl fmt::Debug for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Quantity({self})")
    }
}

impl Serialize for Quantity {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
