//! Wallet Error Types
//!
//! Error taxonomy for key custody. No variant ever carries key bytes:
//! messages hold labels, paths, lengths and positions only.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`WalletError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Io,
    Parse,
    Validation,
    NotFound,
    Signing,
}

/// Structural problems with a candidate key file
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("malformed key length: expected {expected} bytes, got {actual}")]
    MalformedKeyLength { expected: usize, actual: usize },

    /// Only the position is reported, never the offending value
    #[error("key byte out of range at index {index} (must be 0-255)")]
    ByteOutOfRange { index: usize },

    #[error("invalid seed: {0}")]
    InvalidSeed(String),

    #[error("public key mismatch: embedded key does not match key derived from seed")]
    PublicKeyMismatch,

    #[error("duplicate wallet label '{0}'")]
    DuplicateLabel(String),

    #[error("invalid wallet label: {0}")]
    InvalidLabel(String),
}

/// Errors raised by the wallet store
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Wallet not found: {0}")]
    NotFound(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("{0}")]
    LoadAborted(AbortedLoad),
}

impl WalletError {
    /// Classify the error.
    ///
    /// An aborted load reports the kind of its first failure (failures are
    /// ordered by path).
    pub fn kind(&self) -> ErrorKind {
        match self {
            WalletError::Configuration(_) => ErrorKind::Configuration,
            WalletError::Io(_) => ErrorKind::Io,
            WalletError::Parse(_) => ErrorKind::Parse,
            WalletError::Validation(_) => ErrorKind::Validation,
            WalletError::NotFound(_) => ErrorKind::NotFound,
            WalletError::Signing(_) => ErrorKind::Signing,
            WalletError::LoadAborted(aborted) => aborted
                .failures()
                .first()
                .map(|f| f.error.kind())
                .unwrap_or(ErrorKind::Validation),
        }
    }

    /// The validation detail, if this is a validation error
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            WalletError::Validation(v) => Some(v),
            _ => None,
        }
    }

    /// Per-file failures behind an aborted all-or-nothing load
    pub fn failures(&self) -> &[LoadFailure] {
        match self {
            WalletError::LoadAborted(aborted) => aborted.failures(),
            _ => &[],
        }
    }
}

impl From<serde_json::Error> for WalletError {
    /// serde_json messages may quote file content, so only the category and
    /// position survive.
    fn from(err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        let category = match err.classify() {
            Category::Io => return WalletError::Io("read failed while parsing".to_string()),
            Category::Syntax => "invalid JSON syntax",
            Category::Eof => "unexpected end of JSON input",
            Category::Data => "expected a JSON array of integers",
        };
        WalletError::Parse(format!(
            "{} at line {} column {}",
            category,
            err.line(),
            err.column()
        ))
    }
}

/// One key file that could not be loaded
#[derive(Debug)]
pub struct LoadFailure {
    /// File the failure relates to
    pub path: PathBuf,
    /// Label the file would have been registered under, when known
    pub label: Option<String>,
    pub error: WalletError,
}

impl LoadFailure {
    pub fn new(path: impl Into<PathBuf>, label: Option<String>, error: WalletError) -> Self {
        Self {
            path: path.into(),
            label,
            error,
        }
    }
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.error)
    }
}

/// Aggregate error for an all-or-nothing load that hit at least one failure
#[derive(Debug)]
pub struct AbortedLoad {
    failures: Vec<LoadFailure>,
}

impl AbortedLoad {
    pub fn new(failures: Vec<LoadFailure>) -> Self {
        Self { failures }
    }

    pub fn failures(&self) -> &[LoadFailure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<LoadFailure> {
        self.failures
    }
}

impl fmt::Display for AbortedLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "wallet discovery aborted: {} file(s) failed to load",
            self.failures.len()
        )?;
        for failure in &self.failures {
            write!(f, "\n  - {}", failure)?;
        }
        Ok(())
    }
}
