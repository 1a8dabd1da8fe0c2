//! Keystore Adapter
//!
//! Filesystem discovery of solana-keygen key files.

pub mod discovery;

pub use discovery::{
    discover_wallets, discover_wallets_with_timeout, DiscoveryOptions, DiscoveryReport, LoadMode,
    WalletSource, DEFAULT_KEY_EXTENSION,
};
