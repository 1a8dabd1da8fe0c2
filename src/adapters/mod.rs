//! Adapters Layer - External System Implementations
//!
//! - Keystore: wallet discovery from key files on disk
//! - CLI: Command-line interface handlers

pub mod keystore;
pub mod cli;

pub use keystore::{discover_wallets, DiscoveryOptions, DiscoveryReport, LoadMode};
pub use cli::CliApp;
