//! Fundamental types for the Pangea wallet.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! chain families and identifiers, Antelope names/symbols/quantities, Ethereum
//! addresses, DIDs, the Antelope binary codec and ABI model, and the common
//! error type.

pub mod abi;
pub mod action;
pub mod address;
pub mod codec;
pub mod did;
pub mod error;
pub mod family;
pub mod name;
pub mod quantity;
pub mod symbol;
pub mod transaction_type;

pub use abi::{standard_token_abi, Abi, AbiAction, AbiField, AbiStruct, AbiTypeAlias};
pub use action::{Action, PermissionLevel, Transaction, TransactionHeader};
pub use address::EthereumAddress;
pub use codec::{ByteReader, ByteWriter};
pub use did::Did;
pub use error::ChainError;
pub use family::{AntelopeChainId, ChainFamily, ChainId};
pub use name::AntelopeName;
pub use quantity::Quantity;
pub use symbol::Symbol;
pub use transaction_type::TransactionType;
