//! Wallet Discovery
//!
//! Turns a directory of untrusted key files into a [`WalletRegistry`].
//! Every candidate goes through the full parse/validate pipeline; per-file
//! failures are collected and the load mode decides what the caller gets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::{
    AbortedLoad, KeypairRecord, LoadFailure, ValidationError, WalletError, WalletRegistry,
};

/// Default key file extension (solana-keygen output)
pub const DEFAULT_KEY_EXTENSION: &str = "json";

/// What to do when some key files fail to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadMode {
    /// Any failure aborts the load and no wallet is returned
    #[default]
    AllOrNothing,
    /// Valid wallets load, failures are reported alongside
    Partial,
}

impl std::fmt::Display for LoadMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadMode::AllOrNothing => write!(f, "all-or-nothing"),
            LoadMode::Partial => write!(f, "partial"),
        }
    }
}

/// A key file registered under an explicit label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSource {
    pub label: String,
    pub path: PathBuf,
}

impl WalletSource {
    pub fn new(label: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
        }
    }
}

/// Discovery settings
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Key file extension, matched ASCII case-insensitively
    pub extension: String,
    /// Descend into subdirectories (symlinked directories are not followed)
    pub recursive: bool,
    pub load_mode: LoadMode,
    /// Explicitly labelled key files loaded alongside the scanned ones
    pub extra: Vec<WalletSource>,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            extension: DEFAULT_KEY_EXTENSION.to_string(),
            recursive: false,
            load_mode: LoadMode::default(),
            extra: Vec::new(),
        }
    }
}

impl DiscoveryOptions {
    pub fn with_load_mode(mut self, load_mode: LoadMode) -> Self {
        self.load_mode = load_mode;
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_extra(mut self, source: WalletSource) -> Self {
        self.extra.push(source);
        self
    }
}

/// Outcome of a discovery pass
#[derive(Debug)]
pub struct DiscoveryReport {
    registry: WalletRegistry,
    failures: Vec<LoadFailure>,
}

impl DiscoveryReport {
    pub fn registry(&self) -> &WalletRegistry {
        &self.registry
    }

    /// Files that failed to load (only ever non-empty in partial mode)
    pub fn failures(&self) -> &[LoadFailure] {
        &self.failures
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_registry(self) -> WalletRegistry {
        self.registry
    }

    pub fn into_parts(self) -> (WalletRegistry, Vec<LoadFailure>) {
        (self.registry, self.failures)
    }
}

struct Candidate {
    label: String,
    path: PathBuf,
}

/// Discover and load every key file in `dir`.
///
/// A missing or unreadable directory is a configuration error; an empty
/// directory yields an empty registry.
pub fn discover_wallets(
    dir: &Path,
    options: &DiscoveryOptions,
) -> Result<DiscoveryReport, WalletError> {
    check_directory(dir)?;
    tracing::info!(
        "Scanning {} for *.{} wallet files ({} mode)",
        dir.display(),
        options.extension,
        options.load_mode
    );

    let mut failures = Vec::new();
    let mut candidates = Vec::new();

    let entries = fs::read_dir(dir).map_err(|e| {
        WalletError::Configuration(format!(
            "cannot read wallet directory {}: {}",
            dir.display(),
            e
        ))
    })?;
    scan_entries(entries, dir, options, &mut candidates, &mut failures);
    candidates.sort_by(|a, b| a.path.cmp(&b.path));

    candidates.extend(options.extra.iter().map(|source| Candidate {
        label: source.label.clone(),
        path: source.path.clone(),
    }));

    let mut by_label: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for candidate in candidates {
        by_label.entry(candidate.label).or_default().push(candidate.path);
    }

    let mut records = Vec::new();
    for (label, paths) in by_label {
        if paths.len() > 1 {
            // An ambiguous label loads neither file
            for path in paths {
                failures.push(LoadFailure::new(
                    path,
                    Some(label.clone()),
                    ValidationError::DuplicateLabel(label.clone()).into(),
                ));
            }
            continue;
        }

        let path = &paths[0];
        match KeypairRecord::from_file(label.clone(), path) {
            Ok(record) => {
                tracing::debug!("Loaded wallet '{}' ({})", label, record.public_key());
                records.push(record);
            }
            Err(error) => failures.push(LoadFailure::new(path.clone(), Some(label), error)),
        }
    }

    failures.sort_by(|a, b| a.path.cmp(&b.path));
    for failure in &failures {
        tracing::warn!("Failed to load {}", failure);
    }

    let registry = WalletRegistry::from_records(records)?;

    match options.load_mode {
        LoadMode::AllOrNothing if !failures.is_empty() => {
            tracing::error!(
                "Wallet discovery aborted: {} of {} file(s) failed",
                failures.len(),
                failures.len() + registry.len()
            );
            drop(registry);
            Err(WalletError::LoadAborted(AbortedLoad::new(failures)))
        }
        _ => {
            tracing::info!(
                "Discovered {} wallet(s), {} failure(s)",
                registry.len(),
                failures.len()
            );
            Ok(DiscoveryReport { registry, failures })
        }
    }
}

/// Run [`discover_wallets`] on the blocking pool, bounded by `timeout`.
///
/// Expiry is reported as an IO error; a late result is dropped along with
/// its key material.
pub async fn discover_wallets_with_timeout(
    dir: PathBuf,
    options: DiscoveryOptions,
    timeout: Duration,
) -> Result<DiscoveryReport, WalletError> {
    with_io_timeout(timeout, move || discover_wallets(&dir, &options)).await
}

/// Run blocking filesystem work on the blocking pool, giving up after
/// `timeout`. The thread itself cannot be cancelled and keeps running until
/// the read returns.
pub(crate) async fn with_io_timeout<T, F>(timeout: Duration, work: F) -> Result<T, WalletError>
where
    F: FnOnce() -> Result<T, WalletError> + Send + 'static,
    T: Send + 'static,
{
    let task = tokio::task::spawn_blocking(work);

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(WalletError::Io(format!("discovery task failed: {}", e))),
        Err(_) => Err(WalletError::Io(format!(
            "wallet discovery timed out after {}s",
            timeout.as_secs_f64()
        ))),
    }
}

fn check_directory(dir: &Path) -> Result<(), WalletError> {
    let metadata = fs::metadata(dir).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            WalletError::Configuration(format!("wallet directory not found: {}", dir.display()))
        } else {
            WalletError::Configuration(format!(
                "cannot access wallet directory {}: {}",
                dir.display(),
                e
            ))
        }
    })?;

    if !metadata.is_dir() {
        return Err(WalletError::Configuration(format!(
            "wallet path is not a directory: {}",
            dir.display()
        )));
    }
    Ok(())
}

fn scan_entries(
    entries: fs::ReadDir,
    dir: &Path,
    options: &DiscoveryOptions,
    candidates: &mut Vec<Candidate>,
    failures: &mut Vec<LoadFailure>,
) {
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                failures.push(LoadFailure::new(
                    dir,
                    None,
                    WalletError::Io(format!("Failed to read directory entry: {}", e)),
                ));
                continue;
            }
        };
        let path = entry.path();

        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) => {
                failures.push(LoadFailure::new(
                    path,
                    None,
                    WalletError::Io(format!("Failed to stat entry: {}", e)),
                ));
                continue;
            }
        };

        if file_type.is_dir() {
            if options.recursive {
                match fs::read_dir(&path) {
                    Ok(sub) => scan_entries(sub, &path, options, candidates, failures),
                    Err(e) => failures.push(LoadFailure::new(
                        path,
                        None,
                        WalletError::Io(format!("Failed to read directory: {}", e)),
                    )),
                }
            }
            continue;
        }

        if !has_extension(&path, &options.extension) {
            continue;
        }

        // Symlinks count when they resolve to a regular file; dangling ones
        // are reported rather than skipped.
        if file_type.is_symlink() {
            match fs::metadata(&path) {
                Ok(meta) if meta.is_file() => {}
                Ok(_) => continue,
                Err(e) => {
                    failures.push(LoadFailure::new(
                        path,
                        None,
                        WalletError::Io(format!("Failed to resolve link: {}", e)),
                    ));
                    continue;
                }
            }
        } else if !file_type.is_file() {
            continue;
        }

        match path.file_stem().and_then(OsStr::to_str) {
            Some(stem) => candidates.push(Candidate {
                label: stem.to_string(),
                path,
            }),
            None => failures.push(LoadFailure::new(
                path,
                None,
                ValidationError::InvalidLabel("file name is not valid UTF-8".to_string()).into(),
            )),
        }
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map_or(false, |ext| ext.eq_ignore_ascii_case(extension))
}
