//! Ports Layer - Trait definitions for external collaborators
//!
//! Trade execution and other out-of-process consumers reach wallets only
//! through these traits.

pub mod signing;

pub use signing::WalletSigner;
