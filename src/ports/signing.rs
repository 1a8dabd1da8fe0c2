//! Signing Port
//!
//! What the trading side may ask of the keystore: public keys, labels and
//! signatures. No method returns key material.

use solana_sdk::{pubkey::Pubkey, signature::Signature, transaction::Transaction};
use std::sync::Arc;

use crate::domain::{WalletError, WalletRegistry};

pub trait WalletSigner: Send + Sync {
    /// Public key of the wallet registered under `label`
    fn public_key(&self, label: &str) -> Result<Pubkey, WalletError>;

    /// Sign arbitrary bytes
    fn sign_message(&self, label: &str, message: &[u8]) -> Result<Signature, WalletError>;

    /// Sign a transaction in place
    fn sign_transaction(&self, label: &str, transaction: &mut Transaction)
        -> Result<(), WalletError>;

    /// Labels in lexicographic order
    fn labels(&self) -> Vec<String>;
}

impl WalletSigner for WalletRegistry {
    fn public_key(&self, label: &str) -> Result<Pubkey, WalletError> {
        self.get_public_key(label)
    }

    fn sign_message(&self, label: &str, message: &[u8]) -> Result<Signature, WalletError> {
        self.sign(label, message)
    }

    fn sign_transaction(
        &self,
        label: &str,
        transaction: &mut Transaction,
    ) -> Result<(), WalletError> {
        WalletRegistry::sign_transaction(self, label, transaction)
    }

    fn labels(&self) -> Vec<String> {
        self.list_labels().into_iter().map(String::from).collect()
    }
}

impl<T: WalletSigner + ?Sized> WalletSigner for Arc<T> {
    fn public_key(&self, label: &str) -> Result<Pubkey, WalletError> {
        (**self).public_key(label)
    }

    fn sign_message(&self, label: &str, message: &[u8]) -> Result<Signature, WalletError> {
        (**self).sign_message(label, message)
    }

    fn sign_transaction(
        &self,
        label: &str,
        transaction: &mut Transaction,
    ) -> Result<(), WalletError> {
        (**self).sign_transaction(label, transaction)
    }

    fn labels(&self) -> Vec<String> {
        (**self).labels()
    }
}
