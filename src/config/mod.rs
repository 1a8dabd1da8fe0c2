//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    Config, ConfigError, ExtraWallet, LoggingSection, WalletsSection, load_config,
    DEFAULT_WALLETS_DIR, WALLETS_DIR_ENV,
};
