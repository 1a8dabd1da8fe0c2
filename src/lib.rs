//! Sniper Keystore - multi-wallet key custody for a Solana sniper bot
//!
//! Loads solana-keygen keypair files from a wallet directory, validates every
//! one, and exposes signing without handing out secret key material.
//!
//! # Modules
//!
//! - `domain`: Keypair records, the wallet registry, error taxonomy
//! - `ports`: `WalletSigner`, the seam the trading engine signs through
//! - `adapters`: Filesystem discovery and the CLI
//! - `config`: Configuration loading and validation

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;

pub use adapters::keystore::{
    discover_wallets, discover_wallets_with_timeout, DiscoveryOptions, DiscoveryReport, LoadMode,
    WalletSource,
};
pub use domain::{ErrorKind, KeypairRecord, LoadFailure, ValidationError, WalletError, WalletRegistry};
pub use ports::WalletSigner;
