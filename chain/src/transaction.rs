//! Chain transactions and the uniform operation view.
//!
//! A [`ChainTransaction`] is a closed sum over the family-specific
//! transaction shapes. Whatever the family, callers read it through
//! [`Operation`]s — one per transfer or contract call — and sign or
//! broadcast it without caring which chain it targets.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::{json, Value};

use pangea_crypto::{ethereum_address, sha256, sha256_multi, sign_canonical, PrivateKey};
use pangea_types::{
    standard_token_abi, Abi, Action, AntelopeName, ChainError, EthereumAddress, PermissionLevel,
    Quantity, Transaction, TransactionHeader, TransactionType,
};

use crate::asset::Asset;
use crate::chain::{AntelopeChain, Chain, EthereumChain};
use crate::eip155::EthereumTransactionRequest;
use crate::key::ChainPrivateKey;
use crate::receipt::TransactionReceipt;
use crate::token::Token;

const TRANSFER: AntelopeName = AntelopeName::from_raw(0xcdcd3c2d57000000);

/// Default Antelope expiration window, in seconds.
pub const DEFAULT_EXPIRE_SECS: u32 = 120;

/// One transfer or contract call inside a transaction.
///
/// Fields are populated per family: Ethereum transactions always yield
/// exactly one operation; an Antelope transaction yields one per action,
/// in action order.
#[derive(Clone, Debug)]
pub struct Operation {
    kind: TransactionType,
    from: Option<String>,
    to: Option<String>,
    value: Option<Asset>,
    function: Option<String>,
    arguments: Option<Value>,
    data: Option<String>,
}

impl Operation {
    pub fn kind(&self) -> TransactionType {
        self.kind
    }

    /// The sending account or address.
    pub fn from(&self) -> Option<&str> {
        self.from.as_deref()
    }

    /// The receiving account, address, or contract.
    pub fn to(&self) -> Option<&str> {
        self.to.as_deref()
    }

    /// Value moved by the operation, when it moves any.
    pub fn value(&self) -> Option<&Asset> {
        self.value.as_ref()
    }

    /// Called function: selector hex for Ethereum, action name for
    /// Antelope contract calls.
    pub fn function(&self) -> Option<&str> {
        self.function.as_deref()
    }

    /// Decoded call arguments, when an ABI is available.
    pub fn arguments(&self) -> Option<&Value> {
        self.arguments.as_ref()
    }

    /// Raw call data as hex.
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }
}

/// An Ethereum transaction bound to its chain.
#[derive(Clone, Debug)]
pub struct EthereumTransaction {
    chain: Arc<EthereumChain>,
    request: EthereumTransactionRequest,
}

impl EthereumTransaction {
    /// Wrap a request, rejecting one built for another chain.
    pub fn new(
        chain: Arc<EthereumChain>,
        request: EthereumTransactionRequest,
    ) -> Result<Self, ChainError> {
        if request.chain_id != chain.id() {
            return Err(ChainError::ChainIdMismatch {
                expected: chain.id().to_string(),
                found: request.chain_id.to_string(),
            });
        }
        Ok(Self { chain, request })
    }

    /// A native-token transfer of `amount` to `to`.
    pub fn transfer(
        chain: Arc<EthereumChain>,
        to: EthereumAddress,
        amount: &Asset,
    ) -> Result<Self, ChainError> {
        if *amount.token().chain_id() != chain.chain_id() {
            return Err(ChainError::ChainIdMismatch {
                expected: chain.chain_id().to_string(),
                found: amount.token().chain_id().to_string(),
            });
        }
        let wei = amount.to_smallest_unit_u128()?;
        let request = EthereumTransactionRequest::transfer(to, wei, chain.id());
        Ok(Self { chain, request })
    }

    pub fn chain(&self) -> &Arc<EthereumChain> {
        &self.chain
    }

    pub fn request(&self) -> &EthereumTransactionRequest {
        &self.request
    }

    pub fn operation(&self) -> Result<Operation, ChainError> {
        let request = &self.request;
        let kind = if request.data.is_empty() {
            TransactionType::Transfer
        } else if request.value == 0 {
            TransactionType::ContractCall
        } else {
            TransactionType::Both
        };
        let token = self.chain.native_token()?;
        Ok(Operation {
            kind,
            from: request.from.map(|a| a.checksummed()),
            to: request.to.map(|a| a.checksummed()),
            value: Some(Asset::from_smallest_unit_u128(token, request.value)?),
            function: request.function_selector(),
            arguments: None,
            data: if request.data.is_empty() {
                None
            } else {
                Some(hex::encode(&request.data))
            },
        })
    }

    /// Fill in nonce, gas price, and gas limit from the node where the
    /// request left them unset.
    pub async fn prepare(
        &self,
        sender: &EthereumAddress,
    ) -> Result<EthereumTransactionRequest, ChainError> {
        let mut request = self.request.clone();
        if request.from.is_none() {
            request.from = Some(*sender);
        }
        if request.nonce.is_none() {
            request.nonce = Some(self.chain.client().transaction_count(sender).await?);
        }
        if request.gas_price.is_none() {
            request.gas_price = Some(self.chain.client().gas_price().await?);
        }
        if request.gas_limit.is_none() {
            request.gas_limit = Some(self.chain.client().estimate_gas(&request).await?);
        }
        Ok(request)
    }

    /// Prepare and sign, producing the raw EIP-155 transaction.
    ///
    /// The signing key must control the request's `from` address.
    pub async fn sign(&self, key: &PrivateKey) -> Result<SignedEthereumTransaction, ChainError> {
        let sender = ethereum_address(&key.public_key());
        if let Some(from) = &self.request.from {
            if *from != sender {
                return Err(ChainError::Protocol(format!(
                    "transaction sender {} does not match the signing key's address {}",
                    from.checksummed(),
                    sender.checksummed()
                )));
            }
        }
        let request = self.prepare(&sender).await?;
        let fee = fee_for(&request, &self.chain)?;
        let (raw, hash) = request.sign(key)?;
        tracing::debug!(
            chain = self.chain.name(),
            hash = hex::encode(hash),
            "signed ethereum transaction"
        );
        Ok(SignedEthereumTransaction {
            chain: self.chain.clone(),
            raw,
            hash,
            fee,
        })
    }

    /// The network fee the transaction can cost at most.
    pub async fn estimate_fee(&self) -> Result<Asset, ChainError> {
        let request = &self.request;
        let gas_price = match request.gas_price {
            Some(price) => price,
            None => self.chain.client().gas_price().await?,
        };
        let gas = match request.gas_limit {
            Some(gas) => gas,
            None => self.chain.client().estimate_gas(request).await?,
        };
        let wei = gas_price
            .checked_mul(gas)
            .ok_or_else(|| ChainError::Protocol("fee exceeds supported range".to_string()))?;
        Asset::from_smallest_unit_u128(self.chain.native_token()?, wei)
    }
}

fn fee_for(
    request: &EthereumTransactionRequest,
    chain: &Arc<EthereumChain>,
) -> Result<Asset, ChainError> {
    let gas_price = request.gas_price.unwrap_or(0);
    let gas_limit = request.gas_limit.unwrap_or(0);
    let wei = gas_price
        .checked_mul(gas_limit)
        .ok_or_else(|| ChainError::Protocol("fee exceeds supported range".to_string()))?;
    Asset::from_smallest_unit_u128(chain.native_token()?, wei)
}

/// How an Antelope action carries its arguments.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionData {
    /// JSON arguments, encoded against the contract ABI at signing time.
    Json(Value),
    /// Packed argument bytes; signing requests arrive in this form.
    Packed(Vec<u8>),
}

/// One Antelope action in request form.
#[derive(Clone, Debug, PartialEq)]
pub struct AntelopeAction {
    pub account: AntelopeName,
    pub name: AntelopeName,
    pub authorization: Vec<PermissionLevel>,
    pub data: ActionData,
}

/// An ordered list of Antelope actions awaiting signature.
///
/// The expiration window is applied when the transaction is signed, not
/// when it is built, so a request can sit in front of the user without
/// burning its validity period.
#[derive(Clone, Debug)]
pub struct AntelopeTransaction {
    chain: Arc<AntelopeChain>,
    actions: Vec<AntelopeAction>,
    abis: HashMap<AntelopeName, Abi>,
    expire_secs: u32,
}

impl AntelopeTransaction {
    pub fn new(chain: Arc<AntelopeChain>, actions: Vec<AntelopeAction>) -> Self {
        let expire_secs = chain.expire_secs();
        Self {
            chain,
            actions,
            abis: HashMap::new(),
            expire_secs,
        }
    }

    /// Carry pre-fetched contract ABIs, keyed by contract account.
    ///
    /// Actions whose contract appears here decode offline in
    /// [`operations`](Self::operations) and are not re-fetched at
    /// signing time.
    pub fn with_abis(mut self, abis: HashMap<AntelopeName, Abi>) -> Self {
        self.abis = abis;
        self
    }

    /// Override the expiration window applied at signing time.
    pub fn with_expiration(mut self, expire_secs: u32) -> Self {
        self.expire_secs = expire_secs;
        self
    }

    /// A token transfer of `amount` from `from` to `to`.
    pub fn transfer(
        chain: Arc<AntelopeChain>,
        from: AntelopeName,
        to: AntelopeName,
        amount: &Asset,
        memo: &str,
    ) -> Result<Self, ChainError> {
        if *amount.token().chain_id() != chain.chain_id() {
            return Err(ChainError::ChainIdMismatch {
                expected: chain.chain_id().to_string(),
                found: amount.token().chain_id().to_string(),
            });
        }
        let contract = *amount.token().contract().ok_or_else(|| {
            ChainError::Protocol(format!(
                "token {} has no contract account",
                amount.token().symbol()
            ))
        })?;
        let quantity = amount.to_quantity()?;
        let action = AntelopeAction {
            account: contract,
            name: TRANSFER,
            authorization: vec![PermissionLevel::active(from)],
            data: ActionData::Json(json!({
                "from": from,
                "to": to,
                "quantity": quantity.to_string(),
                "memo": memo,
            })),
        };
        let mut abis = HashMap::new();
        abis.insert(contract, standard_token_abi());
        let expire_secs = chain.expire_secs();
        Ok(Self {
            chain,
            actions: vec![action],
            abis,
            expire_secs,
        })
    }

    pub fn chain(&self) -> &Arc<AntelopeChain> {
        &self.chain
    }

    pub fn actions(&self) -> &[AntelopeAction] {
        &self.actions
    }

    pub fn expire_secs(&self) -> u32 {
        self.expire_secs
    }

    /// One operation per action, in action order.
    ///
    /// Decoding packed data needs the contract's ABI to be carried (see
    /// [`with_abis`](Self::with_abis)); a missing ABI is an error rather
    /// than a silently opaque operation.
    pub fn operations(&self) -> Result<Vec<Operation>, ChainError> {
        self.actions.iter().map(|a| self.operation_for(a)).collect()
    }

    fn operation_for(&self, action: &AntelopeAction) -> Result<Operation, ChainError> {
        let arguments = match &action.data {
            ActionData::Json(value) => value.clone(),
            ActionData::Packed(bytes) => {
                let abi = self.abis.get(&action.account).ok_or_else(|| {
                    ChainError::Protocol(format!("abi for {} not resolved", action.account))
                })?;
                abi.decode_action_data(&action.name, bytes)?
            }
        };
        let data = match &action.data {
            ActionData::Packed(bytes) => Some(hex::encode(bytes)),
            ActionData::Json(_) => None,
        };

        if action.name == TRANSFER {
            if let Some(operation) = self.transfer_operation(&arguments, data.clone())? {
                return Ok(operation);
            }
        }

        // Generic contract call: the first authorizer acts on the contract.
        let from = action
            .authorization
            .first()
            .map(|level| level.actor.to_string());
        Ok(Operation {
            kind: TransactionType::ContractCall,
            from,
            to: Some(action.account.to_string()),
            value: None,
            function: Some(action.name.to_string()),
            arguments: Some(arguments),
            data,
        })
    }

    /// Interpret a `transfer(from, to, quantity, memo)` action, the
    /// shape every standard token contract shares.
    fn transfer_operation(
        &self,
        arguments: &Value,
        data: Option<String>,
    ) -> Result<Option<Operation>, ChainError> {
        let (Some(from), Some(to), Some(quantity)) = (
            arguments.get("from").and_then(Value::as_str),
            arguments.get("to").and_then(Value::as_str),
            arguments.get("quantity").and_then(Value::as_str),
        ) else {
            return Ok(None);
        };
        let quantity: Quantity = quantity.parse()?;
        let token = self.token_for(&quantity);
        Ok(Some(Operation {
            kind: TransactionType::Transfer,
            from: Some(from.to_string()),
            to: Some(to.to_string()),
            value: Some(Asset::from_quantity(token, &quantity)?),
            function: None,
            arguments: Some(arguments.clone()),
            data,
        }))
    }

    /// The registered native token when the symbol matches, otherwise an
    /// ad hoc token so unknown assets still display.
    fn token_for(&self, quantity: &Quantity) -> Token {
        if let Ok(native) = self.chain.native_token() {
            if let Ok(symbol) = native.antelope_symbol() {
                if symbol == quantity.symbol() {
                    return native;
                }
            }
        }
        let code = quantity.symbol().code();
        Token::new(
            self.chain.chain_id(),
            &code,
            &code,
            quantity.symbol().precision(),
        )
    }

    /// Every distinct contract's ABI: carried ones plus a deduplicated
    /// fetch for the rest.
    async fn resolve_abis(&self) -> Result<HashMap<AntelopeName, Abi>, ChainError> {
        let mut abis = self.abis.clone();
        for action in &self.actions {
            if abis.contains_key(&action.account) {
                continue;
            }
            let abi = self.chain.client().get_abi(&action.account).await?;
            abis.insert(action.account, abi);
        }
        Ok(abis)
    }

    fn wire_actions(&self, abis: &HashMap<AntelopeName, Abi>) -> Result<Vec<Action>, ChainError> {
        self.actions
            .iter()
            .map(|action| {
                let data = match &action.data {
                    ActionData::Packed(bytes) => bytes.clone(),
                    ActionData::Json(value) => {
                        let abi = abis.get(&action.account).ok_or_else(|| {
                            ChainError::Protocol(format!("abi for {} not resolved", action.account))
                        })?;
                        abi.encode_action_data(&action.name, value)?
                    }
                };
                Ok(Action::new(
                    action.account,
                    action.name,
                    action.authorization.clone(),
                    data,
                ))
            })
            .collect()
    }

    /// Resolve ABIs, build the header from current chain state, pack,
    /// and sign.
    pub async fn sign(&self, key: &PrivateKey) -> Result<SignedAntelopeTransaction, ChainError> {
        let abis = self.resolve_abis().await?;
        let actions = self.wire_actions(&abis)?;
        let info = self.chain.client().get_info().await?;
        let expiration = Utc::now() + Duration::seconds(self.expire_secs as i64);
        let header = TransactionHeader::new(expiration, &info.last_irreversible_block_id)?;
        let transaction = Transaction::new(header, actions);
        let packed = transaction.pack();
        let digest = signing_digest(self.chain.antelope_chain_id().as_bytes(), &packed);
        let signature = sign_canonical(&digest, key)?;
        let id = sha256(&packed);
        tracing::debug!(
            chain = self.chain.name(),
            id = hex::encode(id),
            actions = self.actions.len(),
            "signed antelope transaction"
        );
        Ok(SignedAntelopeTransaction {
            chain: self.chain.clone(),
            signatures: vec![signature.to_string()],
            packed,
            id,
        })
    }
}

/// The digest an Antelope chain expects a signature over: chain id,
/// packed transaction, and a zeroed context-free-data hash.
fn signing_digest(chain_id: &[u8; 32], packed: &[u8]) -> [u8; 32] {
    sha256_multi(&[chain_id, packed, &[0u8; 32]])
}

/// A transaction for any supported chain.
#[derive(Clone, Debug)]
pub enum ChainTransaction {
    Ethereum(EthereumTransaction),
    Antelope(AntelopeTransaction),
}

impl ChainTransaction {
    pub fn chain(&self) -> Chain {
        match self {
            ChainTransaction::Ethereum(tx) => Chain::Ethereum(tx.chain.clone()),
            ChainTransaction::Antelope(tx) => Chain::Antelope(tx.chain.clone()),
        }
    }

    /// The transaction's operations, in execution order.
    pub fn operations(&self) -> Result<Vec<Operation>, ChainError> {
        match self {
            ChainTransaction::Ethereum(tx) => Ok(vec![tx.operation()?]),
            ChainTransaction::Antelope(tx) => tx.operations(),
        }
    }

    /// The single operation of a single-operation transaction.
    ///
    /// Transactions with several operations have no transaction-level
    /// sender, recipient, or kind; callers must walk
    /// [`operations`](Self::operations) instead.
    fn single_operation(&self) -> Result<Operation, ChainError> {
        let mut operations = self.operations()?;
        match operations.len() {
            0 => Err(ChainError::Protocol(
                "transaction has no operations".to_string(),
            )),
            1 => Ok(operations.remove(0)),
            _ => Err(ChainError::MultipleOperations),
        }
    }

    pub fn kind(&self) -> Result<TransactionType, ChainError> {
        Ok(self.single_operation()?.kind())
    }

    pub fn from(&self) -> Result<Option<String>, ChainError> {
        Ok(self.single_operation()?.from)
    }

    pub fn to(&self) -> Result<Option<String>, ChainError> {
        Ok(self.single_operation()?.to)
    }

    pub fn value(&self) -> Result<Option<Asset>, ChainError> {
        Ok(self.single_operation()?.value)
    }

    pub fn function(&self) -> Result<Option<String>, ChainError> {
        Ok(self.single_operation()?.function)
    }

    /// The network fee the transaction will cost.
    ///
    /// Antelope chains meter CPU and NET rather than charging a fee, so
    /// the estimate there is always zero.
    pub async fn estimate_fee(&self) -> Result<Asset, ChainError> {
        match self {
            ChainTransaction::Ethereum(tx) => tx.estimate_fee().await,
            ChainTransaction::Antelope(tx) => Ok(Asset::zero(tx.chain.native_token()?)),
        }
    }

    /// Total cost: every operation's value plus the fee.
    ///
    /// Fails with [`ChainError::TokenMismatch`] when operations move
    /// different tokens; such transactions have no single total.
    pub async fn estimate_total(&self) -> Result<Asset, ChainError> {
        let mut total = self.estimate_fee().await?;
        for operation in self.operations()? {
            if let Some(value) = operation.value() {
                total = total.checked_add(value)?;
            }
        }
        Ok(total)
    }

    /// Sign with a key of the matching family.
    pub async fn sign(&self, key: &ChainPrivateKey) -> Result<SignedTransaction, ChainError> {
        match self {
            ChainTransaction::Ethereum(tx) => {
                Ok(SignedTransaction::Ethereum(tx.sign(key.ethereum_key()?).await?))
            }
            ChainTransaction::Antelope(tx) => {
                Ok(SignedTransaction::Antelope(tx.sign(key.antelope_key()?).await?))
            }
        }
    }

    /// Sign and broadcast in one step.
    pub async fn send(&self, key: &ChainPrivateKey) -> Result<TransactionReceipt, ChainError> {
        self.sign(key).await?.submit().await
    }
}

/// A signed Ethereum transaction ready for `eth_sendRawTransaction`.
#[derive(Clone, Debug)]
pub struct SignedEthereumTransaction {
    chain: Arc<EthereumChain>,
    raw: Vec<u8>,
    hash: [u8; 32],
    fee: Asset,
}

impl SignedEthereumTransaction {
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn hash(&self) -> [u8; 32] {
        self.hash
    }

    pub fn hash_hex(&self) -> String {
        format!("0x{}", hex::encode(self.hash))
    }

    pub async fn submit(self) -> Result<TransactionReceipt, ChainError> {
        let response = self.chain.client().send_raw_transaction(&self.raw).await?;
        tracing::info!(chain = self.chain.name(), hash = %response, "broadcast ethereum transaction");
        Ok(TransactionReceipt::new(
            Chain::Ethereum(self.chain),
            response.clone(),
            self.fee,
            Value::String(response),
        ))
    }
}

/// A signed Antelope transaction ready for `push_transaction`.
#[derive(Clone, Debug)]
pub struct SignedAntelopeTransaction {
    chain: Arc<AntelopeChain>,
    signatures: Vec<String>,
    packed: Vec<u8>,
    id: [u8; 32],
}

impl SignedAntelopeTransaction {
    pub fn signatures(&self) -> &[String] {
        &self.signatures
    }

    pub fn packed(&self) -> &[u8] {
        &self.packed
    }

    /// The transaction id: SHA-256 of the packed transaction.
    pub fn id_hex(&self) -> String {
        hex::encode(self.id)
    }

    pub async fn submit(self) -> Result<TransactionReceipt, ChainError> {
        let response = self
            .chain
            .client()
            .push_transaction(&self.signatures, &self.packed)
            .await?;
        let id = response
            .get("transaction_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| self.id_hex());
        tracing::info!(chain = self.chain.name(), id = %id, "broadcast antelope transaction");
        let fee = Asset::zero(self.chain.native_token()?);
        Ok(
            TransactionReceipt::new(Chain::Antelope(self.chain), id, fee, response)
                .with_signatures(self.signatures),
        )
    }
}

/// A signed transaction for any supported chain.
#[derive(Clone, Debug)]
pub enum SignedTransaction {
    Ethereum(SignedEthereumTransaction),
    Antelope(SignedAntelopeTransaction),
}

impl SignedTransaction {
    /// Broadcast through the owning chain's endpoint.
    pub async fn submit(self) -> Result<TransactionReceipt, ChainError> {
        match self {
            SignedTransaction::Ethereum(tx) => tx.submit().await,
            SignedTransaction::Antelope(tx) => tx.submit().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pangea_types::ChainId;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn sepolia() -> Arc<EthereumChain> {
        let chain = Arc::new(EthereumChain::new(
            "Sepolia",
            11155111,
            "https://ethereum-sepolia-rpc.publicnode.com",
            "https://sepolia.etherscan.io",
            true,
            reqwest::Client::new(),
        ));
        let token = Token::new(chain.chain_id(), "Ether", "ETH", 18);
        chain.set_native_token(token).unwrap();
        chain
    }

    fn pangea() -> Arc<AntelopeChain> {
        let chain_id = "8a34ec7df1b8cd06ff4a8abbaa7cc50300823350cadc59ab296cb00d104d2b8f"
            .parse()
            .unwrap();
        let chain = Arc::new(AntelopeChain::new(
            "Pangea Testnet",
            chain_id,
            "https://blockchain-api-testnet.pangea.web4.world",
            "https://explorer.testnet.pangea.web4.world",
            true,
            reqwest::Client::new(),
        ));
        let token = Token::new(chain.chain_id(), "LEOS", "LEOS", 6)
            .with_contract("eosio.token".parse().unwrap());
        chain.set_native_token(token).unwrap();
        chain
    }

    fn leos_asset(chain: &Arc<AntelopeChain>, amount: &str) -> Asset {
        Asset::new(
            chain.native_token().unwrap(),
            Decimal::from_str(amount).unwrap(),
        )
    }

    #[test]
    fn ethereum_transfer_is_a_single_transfer_operation() {
        let chain = sepolia();
        let amount = Asset::new(
            chain.native_token().unwrap(),
            Decimal::from_str("1.5").unwrap(),
        );
        let to: EthereumAddress = "0x3535353535353535353535353535353535353535".parse().unwrap();
        let tx = ChainTransaction::Ethereum(
            EthereumTransaction::transfer(chain, to, &amount).unwrap(),
        );

        let ops = tx.operations().unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].kind(), TransactionType::Transfer);
        assert_eq!(
            ops[0].to(),
            Some("0x3535353535353535353535353535353535353535")
        );
        assert_eq!(ops[0].value().unwrap().amount(), Decimal::from_str("1.5").unwrap());
        assert_eq!(tx.kind().unwrap(), TransactionType::Transfer);
    }

    #[test]
    fn ethereum_contract_call_kinds() {
        let chain = sepolia();
        let mut request = EthereumTransactionRequest::transfer(
            "0x3535353535353535353535353535353535353535".parse().unwrap(),
            0,
            chain.id(),
        );
        request.data = hex::decode("a9059cbb00000000").unwrap();
        let tx = EthereumTransaction::new(chain.clone(), request.clone()).unwrap();
        let op = tx.operation().unwrap();
        assert_eq!(op.kind(), TransactionType::ContractCall);
        assert_eq!(op.function(), Some("0xa9059cbb"));
        assert_eq!(op.data(), Some("a9059cbb00000000"));

        request.value = 5;
        let tx = EthereumTransaction::new(chain, request).unwrap();
        assert_eq!(tx.operation().unwrap().kind(), TransactionType::Both);
    }

    #[test]
    fn ethereum_chain_id_mismatch_is_rejected() {
        let chain = sepolia();
        let request = EthereumTransactionRequest::transfer(
            "0x3535353535353535353535353535353535353535".parse().unwrap(),
            1,
            1, // mainnet id on a Sepolia handle
        );
        assert!(matches!(
            EthereumTransaction::new(chain, request),
            Err(ChainError::ChainIdMismatch { .. })
        ));
    }

    #[test]
    fn antelope_transfer_reads_back_as_transfer_operation() {
        let chain = pangea();
        let amount = leos_asset(&chain, "10.5");
        let tx = AntelopeTransaction::transfer(
            chain,
            "alice".parse().unwrap(),
            "bob".parse().unwrap(),
            &amount,
            "rent",
        )
        .unwrap();

        let ops = tx.operations().unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].kind(), TransactionType::Transfer);
        assert_eq!(ops[0].from(), Some("alice"));
        assert_eq!(ops[0].to(), Some("bob"));
        assert_eq!(
            ops[0].value().unwrap().amount(),
            Decimal::from_str("10.5").unwrap()
        );
        assert_eq!(ops[0].arguments().unwrap()["memo"], "rent");
    }

    #[test]
    fn packed_transfer_decodes_through_carried_abi() {
        let chain = pangea();
        let abi = standard_token_abi();
        let data = abi
            .encode_action_data(
                &TRANSFER,
                &json!({
                    "from": "alice",
                    "to": "bob",
                    "quantity": "1.000000 LEOS",
                    "memo": "",
                }),
            )
            .unwrap();
        let contract: AntelopeName = "eosio.token".parse().unwrap();
        let action = AntelopeAction {
            account: contract,
            name: TRANSFER,
            authorization: vec![PermissionLevel::active("alice".parse().unwrap())],
            data: ActionData::Packed(data),
        };

        // Without the ABI the packed data cannot be interpreted.
        let bare = AntelopeTransaction::new(chain.clone(), vec![action.clone()]);
        assert!(matches!(bare.operations(), Err(ChainError::Protocol(_))));

        let mut abis = HashMap::new();
        abis.insert(contract, abi);
        let tx = AntelopeTransaction::new(chain, vec![action]).with_abis(abis);
        let ops = tx.operations().unwrap();
        assert_eq!(ops[0].kind(), TransactionType::Transfer);
        assert_eq!(ops[0].value().unwrap().token().symbol(), "LEOS");
    }

    #[test]
    fn non_transfer_action_is_a_contract_call() {
        let chain = pangea();
        let action = AntelopeAction {
            account: "vesting.tmy".parse().unwrap(),
            name: "withdraw".parse().unwrap(),
            authorization: vec![PermissionLevel::active("alice".parse().unwrap())],
            data: ActionData::Json(json!({ "holder": "alice" })),
        };
        let tx = AntelopeTransaction::new(chain, vec![action]);
        let ops = tx.operations().unwrap();
        assert_eq!(ops[0].kind(), TransactionType::ContractCall);
        assert_eq!(ops[0].from(), Some("alice"));
        assert_eq!(ops[0].to(), Some("vesting.tmy"));
        assert_eq!(ops[0].function(), Some("withdraw"));
        assert!(ops[0].value().is_none());
    }

    #[test]
    fn multi_operation_transaction_refuses_scalar_accessors() {
        let chain = pangea();
        let action = AntelopeAction {
            account: "vesting.tmy".parse().unwrap(),
            name: "withdraw".parse().unwrap(),
            authorization: vec![PermissionLevel::active("alice".parse().unwrap())],
            data: ActionData::Json(json!({ "holder": "alice" })),
        };
        let tx = ChainTransaction::Antelope(AntelopeTransaction::new(
            chain,
            vec![action.clone(), action],
        ));
        assert_eq!(tx.operations().unwrap().len(), 2);
        assert!(matches!(tx.kind(), Err(ChainError::MultipleOperations)));
        assert!(matches!(tx.from(), Err(ChainError::MultipleOperations)));
    }

    #[test]
    fn empty_transaction_has_no_operation_view() {
        let tx = ChainTransaction::Antelope(AntelopeTransaction::new(pangea(), vec![]));
        assert!(matches!(tx.kind(), Err(ChainError::Protocol(_))));
    }

    #[test]
    fn unknown_token_symbol_gets_an_ad_hoc_token() {
        let chain = pangea();
        let action = AntelopeAction {
            account: "other.token".parse().unwrap(),
            name: TRANSFER,
            authorization: vec![PermissionLevel::active("alice".parse().unwrap())],
            data: ActionData::Json(json!({
                "from": "alice",
                "to": "bob",
                "quantity": "2.0000 WAX",
                "memo": "",
            })),
        };
        let tx = AntelopeTransaction::new(chain, vec![action]);
        let ops = tx.operations().unwrap();
        let value = ops[0].value().unwrap();
        assert_eq!(value.token().symbol(), "WAX");
        assert_eq!(value.token().precision(), 4);
    }

    #[test]
    fn signing_digest_covers_chain_id_and_padding() {
        let chain_id = [7u8; 32];
        let packed = vec![1, 2, 3];
        let expected = sha256_multi(&[&chain_id, packed.as_slice(), &[0u8; 32]]);
        assert_eq!(signing_digest(&chain_id, &packed), expected);
    }

    #[test]
    fn wire_actions_encode_json_against_carried_abi() {
        let chain = pangea();
        let amount = leos_asset(&chain, "1");
        let tx = AntelopeTransaction::transfer(
            chain,
            "alice".parse().unwrap(),
            "bob".parse().unwrap(),
            &amount,
            "",
        )
        .unwrap();
        let actions = tx.wire_actions(&tx.abis).unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].name, TRANSFER);
        // Data starts with the packed "alice" name.
        let alice: AntelopeName = "alice".parse().unwrap();
        assert_eq!(&actions[0].data[..8], &alice.raw().to_le_bytes());
    }

    #[test]
    fn expiration_window_is_configurable() {
        let tx = AntelopeTransaction::new(pangea(), vec![]);
        assert_eq!(tx.expire_secs(), DEFAULT_EXPIRE_SECS);
        let tx = tx.with_expiration(30);
        assert_eq!(tx.expire_secs(), 30);
    }

    #[test]
    fn transactions_inherit_the_chain_expiration_window() {
        let chain_id = "8a34ec7df1b8cd06ff4a8abbaa7cc50300823350cadc59ab296cb00d104d2b8f"
            .parse()
            .unwrap();
        let chain = Arc::new(
            AntelopeChain::new(
                "Pangea Testnet",
                chain_id,
                "https://blockchain-api-testnet.pangea.web4.world",
                "https://explorer.testnet.pangea.web4.world",
                true,
                reqwest::Client::new(),
            )
            .with_expiration(600),
        );
        let tx = AntelopeTransaction::new(chain, vec![]);
        assert_eq!(tx.expire_secs(), 600);
    }
}
