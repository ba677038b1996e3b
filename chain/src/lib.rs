//! Chain abstraction for the Pangea wallet.
//!
//! One closed model over every supported chain: [`Chain`] configs and the
//! [`ChainRegistry`] that owns them, [`Token`]/[`Asset`] value handling,
//! [`ChainAccount`] keys and accounts, and the [`ChainTransaction`] /
//! [`Operation`] view that signing and sessions work against. Family
//! differences (Ethereum JSON-RPC vs Antelope chain API) stay behind the
//! enum variants; callers match exhaustively instead of downcasting.

pub mod account;
pub mod antelope_api;
pub mod asset;
pub mod broadcaster;
pub mod chain;
pub mod config;
pub mod eip155;
pub mod ethereum_rpc;
pub mod key;
pub mod price;
pub mod receipt;
pub mod registry;
pub mod token;
pub mod transaction;

pub use account::{AntelopeAccount, ChainAccount, EthereumAccount};
pub use antelope_api::{AntelopeApiClient, ChainInfo};
pub use asset::Asset;
pub use broadcaster::{RpcBroadcaster, TransactionBroadcaster};
pub use chain::{AntelopeChain, Chain, EthereumChain, ExplorerTarget};
pub use config::{Network, WalletConfig};
pub use eip155::EthereumTransactionRequest;
pub use ethereum_rpc::EthereumRpcClient;
pub use key::ChainPrivateKey;
pub use price::{FixedPriceOracle, HttpPriceOracle, PriceOracle};
pub use receipt::TransactionReceipt;
pub use registry::ChainRegistry;
pub use token::{Token, VestingAllocation};
pub use transaction::{
    ActionData, AntelopeAction, AntelopeTransaction, ChainTransaction, EthereumTransaction,
    Operation, SignedAntelopeTransaction, SignedEthereumTransaction, SignedTransaction,
};
