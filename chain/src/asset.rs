//! Assets: immutable monetary values bound to a token.

use std::fmt;

use rust_decimal::Decimal;

use pangea_types::{ChainError, Quantity};

use crate::price::PriceOracle;
use crate::token::Token;

/// A token amount, held as an arbitrary-precision decimal.
///
/// Arithmetic never crosses tokens: mixing tokens in `checked_add` or
/// `checked_sub` fails with [`ChainError::TokenMismatch`]. USD values
/// are derived on demand from a price oracle and never cached here.
#[derive(Clone, Debug, PartialEq)]
pub struct Asset {
    token: Token,
    amount: Decimal,
}

impl Asset {
    pub fn new(token: Token, amount: Decimal) -> Self {
        Self { token, amount }
    }

    pub fn zero(token: Token) -> Self {
        Self {
            token,
            amount: Decimal::ZERO,
        }
    }

    /// Build from an Antelope wire quantity.
    ///
    /// The quantity's symbol must match the token's symbol and precision.
    pub fn from_quantity(token: Token, quantity: &Quantity) -> Result<Self, ChainError> {
        let symbol = token.antelope_symbol()?;
        if quantity.symbol() != symbol {
            return Err(ChainError::TokenMismatch {
                expected: symbol.to_string(),
                found: quantity.symbol().to_string(),
            });
        }
        let amount = Decimal::new(quantity.units(), symbol.precision() as u32);
        Ok(Self { token, amount })
    }

    /// Build from an integer count of the token's smallest unit
    /// (wei for 18-precision Ethereum tokens).
    pub fn from_smallest_unit_u128(token: Token, units: u128) -> Result<Self, ChainError> {
        let value = i128::try_from(units)
            .map_err(|_| ChainError::Protocol("balance exceeds supported range".to_string()))?;
        let amount = Decimal::try_from_i128_with_scale(value, token.precision() as u32)
            .map_err(|e| ChainError::Protocol(format!("balance exceeds decimal range: {e}")))?;
        Ok(Self { token, amount })
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn checked_add(&self, other: &Asset) -> Result<Asset, ChainError> {
        self.require_same_token(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| ChainError::Protocol("asset amount overflow".to_string()))?;
        Ok(Asset::new(self.token.clone(), amount))
    }

    pub fn checked_sub(&self, other: &Asset) -> Result<Asset, ChainError> {
        self.require_same_token(other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or_else(|| ChainError::Protocol("asset amount overflow".to_string()))?;
        Ok(Asset::new(self.token.clone(), amount))
    }

    /// The amount as an integer count of the token's smallest unit.
    ///
    /// Fails on negative amounts and on amounts with more fractional
    /// digits than the token's precision.
    pub fn to_smallest_unit_u128(&self) -> Result<u128, ChainError> {
        let precision = self.token.precision() as u32;
        if self.amount.scale() > precision {
            return Err(ChainError::InvalidQuantity(format!(
                "amount {} has more than {precision} decimal places",
                self.amount
            )));
        }
        let mut scaled = self.amount;
        scaled.rescale(precision);
        u128::try_from(scaled.mantissa()).map_err(|_| {
            ChainError::InvalidQuantity(format!("amount {} is negative", self.amount))
        })
    }

    /// Convert back to an Antelope wire quantity at the token's precision.
    pub fn to_quantity(&self) -> Result<Quantity, ChainError> {
        let symbol = self.token.antelope_symbol()?;
        let mut scaled = self.amount;
        scaled.rescale(symbol.precision() as u32);
        let units = i64::try_from(scaled.mantissa()).map_err(|_| {
            ChainError::InvalidQuantity(format!("amount {} exceeds quantity range", self.amount))
        })?;
        Ok(Quantity::new(units, symbol))
    }

    /// The USD value at the oracle's current price. Computed fresh on
    /// every call.
    pub async fn usd_value(&self, oracle: &dyn PriceOracle) -> Result<Decimal, ChainError> {
        let price = oracle.usd_price(self.token.symbol()).await?;
        self.amount
            .checked_mul(price)
            .ok_or_else(|| ChainError::Protocol("usd value overflow".to_string()))
    }

    fn require_same_token(&self, other: &Asset) -> Result<(), ChainError> {
        if self.token != other.token {
            return Err(ChainError::TokenMismatch {
                expected: self.token.symbol().to_string(),
                found: other.token.symbol().to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut amount = self.amount;
        amount.rescale(self.token.precision() as u32);
        write!(f, "{} {}", amount, self.token.symbol())
    }
}
