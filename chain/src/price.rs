//! USD price lookup for tokens.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use pangea_types::ChainError;

use crate::config::WalletConfig;

/// Source of USD token prices.
///
/// Implementations are queried on demand; callers never cache the
/// result inside an [`Asset`](crate::asset::Asset).
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Current USD price for one whole token.
    async fn usd_price(&self, symbol: &str) -> Result<Decimal, ChainError>;
}

/// LEOS has no public market feed yet; the sale price is used instead.
fn leos_usd_price() -> Decimal {
    Decimal::new(2, 3) // 0.002
}

/// Static price table for tests and offline use.
#[derive(Clone, Debug, Default)]
pub struct FixedPriceOracle {
    prices: HashMap<String, Decimal>,
}

impl FixedPriceOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, symbol: &str, price: Decimal) -> Self {
        self.prices.insert(symbol.to_string(), price);
        self
    }
}

#[async_trait]
impl PriceOracle for FixedPriceOracle {
    async fn usd_price(&self, symbol: &str) -> Result<Decimal, ChainError> {
        self.prices
            .get(symbol)
            .copied()
            .ok_or_else(|| ChainError::Protocol(format!("no price feed for symbol {symbol}")))
    }
}

/// Price oracle backed by a coingecko-style `simple/price` endpoint.
///
/// `GET {base}/simple/price?ids={id}&vs_currencies=usd` returns
/// `{"<id>": {"usd": <price>}}`.
pub struct HttpPriceOracle {
    http_client: reqwest::Client,
    base_url: String,
    /// Token symbol -> price-feed asset id.
    ids: HashMap<String, String>,
}

impl HttpPriceOracle {
    pub fn new(base_url: &str, http_client: reqwest::Client) -> Self {
        let mut ids = HashMap::new();
        ids.insert("ETH".to_string(), "ethereum".to_string());
        ids.insert("POL".to_string(), "polygon-ecosystem-token".to_string());
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            ids,
        }
    }

    /// Build the oracle from the wallet config: the configured
    /// `price_oracle_url` endpoint queried with the wallet's HTTP
    /// timeouts.
    pub fn from_config(config: &WalletConfig) -> Result<Self, ChainError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .connect_timeout(Duration::from_secs(config.http_connect_timeout_secs))
            .build()
            .map_err(|e| ChainError::Config(e.to_string()))?;
        Ok(Self::new(&config.price_oracle_url, http_client))
    }

    pub fn with_id(mut self, symbol: &str, id: &str) -> Self {
        self.ids.insert(symbol.to_string(), id.to_string());
        self
    }
}

#[async_trait]
impl PriceOracle for HttpPriceOracle {
    async fn usd_price(&self, symbol: &str) -> Result<Decimal, ChainError> {
        if symbol == "LEOS" {
            return Ok(leos_usd_price());
        }
        let id = self
            .ids
            .get(symbol)
            .ok_or_else(|| ChainError::Protocol(format!("no price feed for symbol {symbol}")))?;

        let url = format!(
            "{}/simple/price?ids={}&vs_currencies=usd",
            self.base_url, id
        );
        let response = self.http_client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                ChainError::Network(format!("price request timed out: {e}"))
            } else if e.is_connect() {
                ChainError::Network(format!("price endpoint connection failed: {e}"))
            } else {
                ChainError::Network(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(ChainError::Network(format!(
                "price endpoint HTTP status {}",
                response.status()
            )));
        }

        let prices: HashMap<String, HashMap<String, Decimal>> = response
            .json()
            .await
            .map_err(|e| ChainError::Protocol(format!("failed to parse price response: {e}")))?;

        prices
            .get(id)
            .and_then(|entry| entry.get("usd"))
            .copied()
            .ok_or_else(|| ChainError::Protocol(format!("price response missing {id}.usd")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[tokio::test]
    async fn fixed_oracle_returns_configured_price() {
        let oracle =
            FixedPriceOracle::new().with_price("ETH", Decimal::from_str("2500.00").unwrap());
        let price = oracle.usd_price("ETH").await.unwrap();
        assert_eq!(price, Decimal::from_str("2500.00").unwrap());
    }

    #[tokio::test]
    async fn fixed_oracle_rejects_unknown_symbol() {
        let oracle = FixedPriceOracle::new();
        assert!(matches!(
            oracle.usd_price("DOGE").await,
            Err(ChainError::Protocol(_))
        ));
    }

    #[test]
    fn from_config_uses_the_configured_endpoint() {
        let config = WalletConfig {
            price_oracle_url: "http://oracle.local/api/v3/".to_string(),
            ..Default::default()
        };
        let oracle = HttpPriceOracle::from_config(&config).unwrap();
        assert_eq!(oracle.base_url, "http://oracle.local/api/v3");
    }

    #[tokio::test]
    async fn leos_price_is_fixed_without_network() {
        let oracle = HttpPriceOracle::new("http://127.0.0.1:1", reqwest::Client::new());
        let price = oracle.usd_price("LEOS").await.unwrap();
        assert_eq!(price, Decimal::new(2, 3));
    }
}
