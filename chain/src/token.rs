//! Tokens: fungible asset types bound to a chain.

use once_cell::sync::OnceCell;
use serde_json::Value;

use pangea_types::{AntelopeName, ChainError, ChainId, Quantity, Symbol};

use crate::asset::Asset;
use crate::chain::Chain;

/// A fungible token native to or hosted on one chain.
///
/// Tokens identify themselves structurally: two tokens are equal when
/// their name, symbol, and precision match. A token holds its owning
/// [`ChainId`] rather than a chain handle; callers resolve the chain
/// through the registry when they need I/O.
#[derive(Clone, Debug)]
pub struct Token {
    chain_id: ChainId,
    name: String,
    symbol: String,
    precision: u8,
    logo_url: Option<String>,
    transferable: bool,
    vestable: bool,
    stakeable: bool,
    /// Contract account hosting the token's balance table (Antelope).
    contract: Option<AntelopeName>,
    /// Contract account holding vesting allocations (Antelope).
    vesting_contract: Option<AntelopeName>,
    /// Default account for balance lookups, set at most once.
    account: OnceCell<String>,
}

impl Token {
    /// A transferable token with no contract binding.
    pub fn new(chain_id: ChainId, name: &str, symbol: &str, precision: u8) -> Self {
        Self {
            chain_id,
            name: name.to_string(),
            symbol: symbol.to_string(),
            precision,
            logo_url: None,
            transferable: true,
            vestable: false,
            stakeable: false,
            contract: None,
            vesting_contract: None,
            account: OnceCell::new(),
        }
    }

    pub fn with_logo_url(mut self, url: &str) -> Self {
        self.logo_url = Some(url.to_string());
        self
    }

    /// Bind the token contract account (Antelope).
    pub fn with_contract(mut self, contract: AntelopeName) -> Self {
        self.contract = Some(contract);
        self
    }

    /// Mark the token vestable and bind its vesting contract.
    pub fn with_vesting(mut self, vesting_contract: AntelopeName) -> Self {
        self.vestable = true;
        self.vesting_contract = Some(vesting_contract);
        self
    }

    pub fn with_staking(mut self) -> Self {
        self.stakeable = true;
        self
    }

    pub fn with_transferable(mut self, transferable: bool) -> Self {
        self.transferable = transferable;
        self
    }

    pub fn chain_id(&self) -> &ChainId {
        &self.chain_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    pub fn logo_url(&self) -> Option<&str> {
        self.logo_url.as_deref()
    }

    pub fn is_transferable(&self) -> bool {
        self.transferable
    }

    pub fn is_vestable(&self) -> bool {
        self.vestable
    }

    pub fn is_stakeable(&self) -> bool {
        self.stakeable
    }

    pub fn contract(&self) -> Option<&AntelopeName> {
        self.contract.as_ref()
    }

    pub fn vesting_contract(&self) -> Option<&AntelopeName> {
        self.vesting_contract.as_ref()
    }

    /// The symbol in Antelope wire form.
    pub fn antelope_symbol(&self) -> Result<Symbol, ChainError> {
        Symbol::new(&self.symbol, self.precision)
    }

    /// Bind the default balance-lookup account. May be called at most once.
    pub fn set_account(&self, account: &str) -> Result<(), ChainError> {
        self.account
            .set(account.to_string())
            .map_err(|_| ChainError::Protocol(format!("token {} account already set", self.symbol)))
    }

    pub fn bound_account(&self) -> Option<&str> {
        self.account.get().map(String::as_str)
    }

    /// The spendable on-chain balance.
    ///
    /// Falls back to the token-bound account when `account` is `None`;
    /// with neither, fails with [`ChainError::AccountNotFound`]. A zero
    /// on-chain balance yields a zero [`Asset`], never an error.
    pub async fn available_balance(
        &self,
        chain: &Chain,
        account: Option<&str>,
    ) -> Result<Asset, ChainError> {
        let account = self.resolve_account(chain, account)?;
        match chain {
            Chain::Ethereum(eth) => {
                let address = account.parse()?;
                let wei = eth.client().balance(&address).await?;
                Asset::from_smallest_unit_u128(self.clone(), wei)
            }
            Chain::Antelope(ant) => {
                let name: AntelopeName = account.parse()?;
                let contract = self.contract.as_ref().ok_or_else(|| {
                    ChainError::Protocol(format!("token {} has no contract account", self.symbol))
                })?;
                let rows = ant
                    .client()
                    .get_currency_balance(contract, &name, &self.symbol)
                    .await?;
                match rows.first() {
                    None => Ok(Asset::zero(self.clone())),
                    Some(row) => {
                        let quantity: Quantity = row.parse()?;
                        Asset::from_quantity(self.clone(), &quantity)
                    }
                }
            }
        }
    }

    /// The locked balance still held by the vesting contract.
    ///
    /// Zero for tokens without a vesting contract.
    pub async fn vested_balance(
        &self,
        chain: &Chain,
        account: Option<&str>,
    ) -> Result<Asset, ChainError> {
        let allocations = self.vested_allocations(chain, account).await?;
        let symbol = self.antelope_symbol()?;
        let mut total = Quantity::zero(symbol);
        for allocation in &allocations {
            total = total.checked_add(allocation.locked()?)?;
        }
        Asset::from_quantity(self.clone(), &total)
    }

    /// Individual vesting allocations for the account, in table order.
    pub async fn vested_allocations(
        &self,
        chain: &Chain,
        account: Option<&str>,
    ) -> Result<Vec<VestingAllocation>, ChainError> {
        let Some(vesting) = self.vesting_contract.as_ref() else {
            return Ok(Vec::new());
        };
        let account = self.resolve_account(chain, account)?;
        let Chain::Antelope(ant) = chain else {
            return Ok(Vec::new());
        };
        let rows = ant
            .client()
            .get_table_rows(vesting, &account, "allocation", 100)
            .await?;
        let symbol = self.antelope_symbol()?;
        rows.iter()
            .map(|row| VestingAllocation::from_row(row, symbol))
            .collect()
    }

    /// The full balance: available plus vested for vestable tokens.
    pub async fn balance(&self, chain: &Chain, account: Option<&str>) -> Result<Asset, ChainError> {
        let available = self.available_balance(chain, account).await?;
        if !self.vestable {
            return Ok(available);
        }
        let vested = self.vested_balance(chain, account).await?;
        available.checked_add(&vested)
    }

    fn resolve_account(&self, chain: &Chain, account: Option<&str>) -> Result<String, ChainError> {
        if chain.chain_id() != self.chain_id {
            return Err(ChainError::ChainIdMismatch {
                expected: self.chain_id.to_string(),
                found: chain.chain_id().to_string(),
            });
        }
        account
            .map(str::to_string)
            .or_else(|| self.account.get().cloned())
            .ok_or_else(|| ChainError::AccountNotFound(chain.name().to_string()))
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.symbol == other.symbol && self.precision == other.precision
    }
}

impl Eq for Token {}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

/// One row of a vesting contract's allocation table.
#[derive(Clone, Debug, PartialEq)]
pub struct VestingAllocation {
    pub id: u64,
    pub allocated: Quantity,
    pub claimed: Quantity,
}

impl VestingAllocation {
    /// The portion still locked in the contract.
    pub fn locked(&self) -> Result<Quantity, ChainError> {
        self.allocated.checked_sub(self.claimed)
    }

    fn from_row(row: &Value, symbol: Symbol) -> Result<Self, ChainError> {
        let id = row.get("id").and_then(Value::as_u64).unwrap_or(0);
        let allocated = row
            .get("tokens_allocated")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ChainError::Protocol("vesting row missing tokens_allocated".to_string())
            })?
            .parse()?;
        let claimed = match row.get("tokens_claimed").and_then(Value::as_str) {
            Some(s) => s.parse()?,
            None => Quantity::zero(symbol),
        };
        Ok(Self {
            id,
            allocated,
            claimed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn pangea_chain_id() -> ChainId {
        ChainId::Antelope(
            "8a34ec7df1b8cd06ff4a8abbaa7cc50300823350cadc59ab296cb00d104d2b8f"
                .parse()
                .unwrap(),
        )
    }

    fn leos() -> Token {
        Token::new(pangea_chain_id(), "LEOS", "LEOS", 6)
            .with_contract(AntelopeName::from_str("eosio.token").unwrap())
            .with_vesting(AntelopeName::from_str("vesting.tmy").unwrap())
            .with_staking()
    }

    #[test]
    fn equality_is_structural() {
        let a = leos();
        let b = leos().with_logo_url("https://example.com/leos.png");
        assert_eq!(a, b);

        let c = Token::new(a.chain_id().clone(), "LEOS", "LEOS", 4);
        assert_ne!(a, c); // precision differs
    }

    #[test]
    fn account_binds_exactly_once() {
        let token = leos();
        assert!(token.bound_account().is_none());
        token.set_account("alice").unwrap();
        assert_eq!(token.bound_account(), Some("alice"));
        assert!(token.set_account("bob").is_err());
        assert_eq!(token.bound_account(), Some("alice"));
    }

    #[test]
    fn capability_flags() {
        let token = leos();
        assert!(token.is_transferable());
        assert!(token.is_vestable());
        assert!(token.is_stakeable());

        let plain = Token::new(ChainId::Ethereum(1), "Ether", "ETH", 18);
        assert!(plain.is_transferable());
        assert!(!plain.is_vestable());
        assert!(!plain.is_stakeable());
    }

    #[test]
    fn allocation_row_parses_with_defaults() {
        let symbol = Symbol::new("LEOS", 6).unwrap();
        let row = serde_json::json!({
            "id": 3,
            "tokens_allocated": "100.000000 LEOS",
            "tokens_claimed": "25.000000 LEOS",
        });
        let allocation = VestingAllocation::from_row(&row, symbol).unwrap();
        assert_eq!(allocation.id, 3);
        assert_eq!(allocation.locked().unwrap().to_string(), "75.000000 LEOS");

        let sparse = serde_json::json!({ "tokens_allocated": "1.000000 LEOS" });
        let allocation = VestingAllocation::from_row(&sparse, symbol).unwrap();
        assert_eq!(allocation.id, 0);
        assert!(allocation.claimed.is_zero());
    }

    #[test]
    fn allocation_row_without_amount_is_rejected() {
        let symbol = Symbol::new("LEOS", 6).unwrap();
        let row = serde_json::json!({ "id": 1 });
        assert!(VestingAllocation::from_row(&row, symbol).is_err());
    }
}
