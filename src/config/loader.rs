//! Configuration Loader
//!
//! Loads and validates keystore configuration from TOML. Every section is
//! optional; a missing file section falls back to defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::adapters::keystore::{DiscoveryOptions, LoadMode, WalletSource, DEFAULT_KEY_EXTENSION};

/// Environment variable overriding `wallets.dir`
pub const WALLETS_DIR_ENV: &str = "WALLETS_DIR";

/// Default wallet directory, relative to the working directory
pub const DEFAULT_WALLETS_DIR: &str = "wallets";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub wallets: WalletsSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Wallet discovery section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WalletsSection {
    /// Directory holding solana-keygen key files (`~` is expanded)
    pub dir: String,
    /// Key file extension
    pub extension: String,
    /// Descend into subdirectories
    pub recursive: bool,
    /// "all-or-nothing" or "partial"
    pub load_mode: LoadMode,
    /// Upper bound on a discovery pass, for network-backed filesystems
    pub io_timeout_secs: u64,
    /// Key files registered under an explicit label
    pub extra: Vec<ExtraWallet>,
}

impl Default for WalletsSection {
    fn default() -> Self {
        Self {
            dir: DEFAULT_WALLETS_DIR.to_string(),
            extension: DEFAULT_KEY_EXTENSION.to_string(),
            recursive: false,
            load_mode: LoadMode::AllOrNothing,
            io_timeout_secs: 10,
            extra: Vec::new(),
        }
    }
}

/// An explicitly labelled key file
#[derive(Debug, Clone, Deserialize)]
pub struct ExtraWallet {
    pub label: String,
    pub path: String,
}

impl WalletsSection {
    /// Wallet directory with `~` expanded
    pub fn get_dir(&self) -> PathBuf {
        expand_path(&self.dir)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }

    /// Discovery options described by this section
    pub fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions {
            extension: self.extension.clone(),
            recursive: self.recursive,
            load_mode: self.load_mode,
            extra: self
                .extra
                .iter()
                .map(|e| WalletSource::new(e.label.clone(), expand_path(&e.path)))
                .collect(),
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

impl Config {
    /// Apply environment overrides on top of the file values.
    /// Command-line flags are applied after this and take precedence
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var(WALLETS_DIR_ENV) {
            if !dir.trim().is_empty() {
                self.wallets.dir = dir;
            }
        }
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        let wallets = &self.wallets;

        if wallets.dir.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "wallets.dir cannot be empty".to_string(),
            ));
        }

        if wallets.extension.is_empty() || wallets.extension.contains('.') {
            return Err(ConfigError::ValidationError(format!(
                "wallets.extension must be a bare extension like \"json\", got {:?}",
                wallets.extension
            )));
        }

        if wallets.io_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "wallets.io_timeout_secs must be > 0".to_string(),
            ));
        }

        for extra in &wallets.extra {
            if extra.label.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "wallets.extra entry for {:?} has an empty label",
                    extra.path
                )));
            }
            if extra.label.contains(['/', '\\']) {
                return Err(ConfigError::ValidationError(format!(
                    "wallets.extra label {:?} cannot contain path separators",
                    extra.label
                )));
            }
            if extra.path.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "wallets.extra entry {:?} has an empty path",
                    extra.label
                )));
            }
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.level must be one of {:?}, got {:?}",
                LOG_LEVELS, self.logging.level
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[wallets]
dir = "~/sniper/wallets"
extension = "json"
recursive = true
load_mode = "partial"
io_timeout_secs = 5

[[wallets.extra]]
label = "treasury"
path = "/secure/treasury.json"

[logging]
level = "info"
"#
        .to_string()
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.wallets.dir, "~/sniper/wallets");
        assert!(config.wallets.recursive);
        assert_eq!(config.wallets.load_mode, LoadMode::Partial);
        assert_eq!(config.wallets.io_timeout(), Duration::from_secs(5));
        assert_eq!(config.wallets.extra.len(), 1);
        assert_eq!(config.wallets.extra[0].label, "treasury");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let file = write_config("");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.wallets.dir, DEFAULT_WALLETS_DIR);
        assert_eq!(config.wallets.extension, "json");
        assert!(!config.wallets.recursive);
        assert_eq!(config.wallets.load_mode, LoadMode::AllOrNothing);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_partial_section_fills_defaults() {
        let file = write_config("[wallets]\nload_mode = \"partial\"\n");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.wallets.load_mode, LoadMode::Partial);
        assert_eq!(config.wallets.dir, DEFAULT_WALLETS_DIR);
        assert_eq!(config.wallets.io_timeout_secs, 10);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/config.toml");
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_unknown_load_mode() {
        let file = write_config("[wallets]\nload_mode = \"yolo\"\n");
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_)));
    }

    #[test]
    fn test_invalid_extension() {
        let file = write_config("[wallets]\nextension = \".json\"\n");
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_zero_timeout() {
        let file = write_config("[wallets]\nio_timeout_secs = 0\n");
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_invalid_extra_label() {
        let file = write_config(
            r#"
[[wallets.extra]]
label = "../escape"
path = "/tmp/key.json"
"#,
        );
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_invalid_log_level() {
        let file = write_config("[logging]\nlevel = \"loud\"\n");
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_discovery_options_from_section() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();
        let options = config.wallets.discovery_options();

        assert!(options.recursive);
        assert_eq!(options.load_mode, LoadMode::Partial);
        assert_eq!(options.extra.len(), 1);
        assert_eq!(options.extra[0].label, "treasury");
        assert_eq!(options.extra[0].path, PathBuf::from("/secure/treasury.json"));
    }

    #[test]
    fn test_tilde_expansion() {
        let expanded = expand_path("~/wallets");
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.ends_with("wallets"));
    }
}
