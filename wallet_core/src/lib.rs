//! Top-level wallet facade.
//!
//! Ties the chain registry, the key and asset stores, and the price
//! oracle together behind one [`Wallet`] type, and carries the tracing
//! setup the host application installs at startup.

pub mod logging;
pub mod wallet;

pub use logging::{init_from_config, init_logging, LogFormat};
pub use wallet::{Wallet, WalletError};
