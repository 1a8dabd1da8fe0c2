//! Wallet Registry
//!
//! The set of loaded wallets for one process run. Populated once by
//! discovery, read-only afterwards, and shared across threads behind an `Arc`
//! without locking. Dropping the registry drops every keypair, which zeroes
//! the secret key material.

use solana_sdk::{pubkey::Pubkey, signature::Signature, transaction::Transaction};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;

use super::error::{ValidationError, WalletError};
use super::keypair_record::KeypairRecord;

#[derive(Default)]
pub struct WalletRegistry {
    wallets: BTreeMap<String, KeypairRecord>,
}

impl WalletRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from validated records, rejecting duplicate labels
    pub fn from_records<I>(records: I) -> Result<Self, WalletError>
    where
        I: IntoIterator<Item = KeypairRecord>,
    {
        let mut wallets = BTreeMap::new();
        for record in records {
            match wallets.entry(record.label().to_string()) {
                Entry::Occupied(entry) => {
                    return Err(ValidationError::DuplicateLabel(entry.key().clone()).into());
                }
                Entry::Vacant(entry) => {
                    entry.insert(record);
                }
            }
        }
        Ok(Self { wallets })
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.wallets.contains_key(label)
    }

    fn record(&self, label: &str) -> Result<&KeypairRecord, WalletError> {
        self.wallets
            .get(label)
            .ok_or_else(|| WalletError::NotFound(format!("no wallet labelled '{}'", label)))
    }

    /// Public key of the wallet registered under `label`
    pub fn get_public_key(&self, label: &str) -> Result<Pubkey, WalletError> {
        self.record(label).map(KeypairRecord::public_key)
    }

    /// Sign `message` with the wallet registered under `label`.
    ///
    /// Callers only ever receive the signature.
    pub fn sign(&self, label: &str, message: &[u8]) -> Result<Signature, WalletError> {
        let record = self.record(label)?;
        Ok(record.sign_message(message))
    }

    /// Sign a transaction with the wallet registered under `label`
    pub fn sign_transaction(
        &self,
        label: &str,
        transaction: &mut Transaction,
    ) -> Result<(), WalletError> {
        let record = self.record(label)?;
        record.sign_transaction(transaction)
    }

    /// Labels in lexicographic order
    pub fn list_labels(&self) -> Vec<&str> {
        self.wallets.keys().map(String::as_str).collect()
    }

    /// Label of the wallet holding `public_key`, if loaded
    pub fn label_for(&self, public_key: &Pubkey) -> Option<&str> {
        self.wallets
            .values()
            .find(|record| record.public_key() == *public_key)
            .map(KeypairRecord::label)
    }

    /// Loaded wallets in label order
    pub fn records(&self) -> impl Iterator<Item = &KeypairRecord> {
        self.wallets.values()
    }

    /// Explicitly destroy the registry and the key material it owns
    pub fn teardown(mut self) {
        let count = self.wallets.len();
        self.wallets.clear();
        tracing::debug!("Wallet registry torn down ({} wallet(s) released)", count);
    }
}

impl fmt::Debug for WalletRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.wallets.iter().map(|(label, record)| (label, record.public_key())))
            .finish()
    }
}
