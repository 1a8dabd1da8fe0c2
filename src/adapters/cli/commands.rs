//! CLI Command Handlers
//!
//! Implementation of all CLI commands for the sniper keystore.

use anyhow::{bail, Context, Result};
use base64::Engine;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;

use crate::adapters::keystore::{discover_wallets_with_timeout, LoadMode};
use crate::config::{load_config, Config};
use crate::domain::{ErrorKind, LoadFailure, WalletError, WalletRegistry};

/// Sniper Keystore - multi-wallet key custody for the Solana sniper bot
#[derive(Parser, Debug)]
#[command(
    name = "sniper-keystore",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Multi-wallet key custody and signing for the Solana sniper bot",
    long_about = "Discovers solana-keygen keypair files in a wallet directory, validates every \
                  one of them, and signs on behalf of the trading engine without ever exposing \
                  secret key material."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Discover wallets and list their public keys
    List(ListCmd),

    /// Print the public key of one wallet
    Pubkey(PubkeyCmd),

    /// Sign a message with one wallet
    Sign(SignCmd),
}

/// Where to find wallets and how strictly to load them
#[derive(Args, Debug, Clone)]
pub struct WalletArgs {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override wallet directory
    #[arg(long, value_name = "DIR")]
    pub dir: Option<String>,

    /// Load valid wallets even if some key files fail
    #[arg(long)]
    pub partial: bool,

    /// Scan subdirectories too
    #[arg(long)]
    pub recursive: bool,
}

/// List discovered wallets
#[derive(Parser, Debug)]
pub struct ListCmd {
    #[command(flatten)]
    pub wallets: WalletArgs,

    /// Output format (text, json)
    #[arg(short, long, value_name = "FORMAT", default_value = "text")]
    pub format: String,
}

/// Show one public key
#[derive(Parser, Debug)]
pub struct PubkeyCmd {
    /// Wallet label (key file name without extension)
    #[arg(value_name = "LABEL")]
    pub label: String,

    #[command(flatten)]
    pub wallets: WalletArgs,
}

/// Sign a message
#[derive(Parser, Debug)]
pub struct SignCmd {
    /// Wallet label (key file name without extension)
    #[arg(value_name = "LABEL")]
    pub label: String,

    /// Message to sign (UTF-8)
    #[arg(value_name = "MESSAGE")]
    pub message: String,

    /// Print the signature as base64 instead of base58
    #[arg(long)]
    pub base64: bool,

    #[command(flatten)]
    pub wallets: WalletArgs,
}

/// Public view of one wallet; never carries key material
#[derive(Debug, Serialize)]
struct WalletSummary {
    label: String,
    public_key: String,
    source: String,
}

#[derive(Debug, Serialize)]
struct FailureSummary {
    path: String,
    label: Option<String>,
    error: String,
}

#[derive(Debug, Serialize)]
struct ListOutput {
    directory: String,
    wallets: Vec<WalletSummary>,
    failures: Vec<FailureSummary>,
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    let args = match &app.command {
        Command::List(cmd) => &cmd.wallets,
        Command::Pubkey(cmd) => &cmd.wallets,
        Command::Sign(cmd) => &cmd.wallets,
    };
    let config = resolve_config(args)?;
    init_logging(app.verbose, app.debug, &config.logging.level)?;

    match app.command {
        Command::List(cmd) => list_command(cmd, config).await,
        Command::Pubkey(cmd) => pubkey_command(cmd, config).await,
        Command::Sign(cmd) => sign_command(cmd, config).await,
    }
}

/// Initialize logging system
fn init_logging(verbose: bool, debug: bool, configured_level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        configured_level
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Load the config file (if any) and apply overrides.
/// Precedence for the wallet directory: `--dir`, then WALLETS_DIR, then the file
fn resolve_config(args: &WalletArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    config.apply_env_overrides();

    if let Some(ref dir) = args.dir {
        config.wallets.dir = dir.clone();
    }
    if args.partial {
        config.wallets.load_mode = LoadMode::Partial;
    }
    if args.recursive {
        config.wallets.recursive = true;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Run discovery with the configured timeout, turning a missing directory
/// into setup guidance
async fn load_wallets(config: &Config) -> Result<(WalletRegistry, Vec<LoadFailure>)> {
    let dir = config.wallets.get_dir();
    let options = config.wallets.discovery_options();

    match discover_wallets_with_timeout(dir.clone(), options, config.wallets.io_timeout()).await {
        Ok(report) => Ok(report.into_parts()),
        Err(e) if e.kind() == ErrorKind::Configuration => bail!(
            "{}\n\n\
             Create the directory and a wallet with:\n  \
             solana-keygen new --outfile {}\n\n\
             Or point 'wallets.dir' in your config (or WALLETS_DIR) at an existing directory.",
            e,
            dir.join("trader1.json").display()
        ),
        Err(e @ WalletError::LoadAborted(_)) => Err(anyhow::Error::new(e).context(
            "Refusing to continue with an incomplete wallet set (use --partial to load the rest)",
        )),
        Err(e) => Err(e.into()),
    }
}

/// Handle list command
async fn list_command(cmd: ListCmd, config: Config) -> Result<()> {
    let dir = config.wallets.get_dir();
    let (registry, failures) = load_wallets(&config).await?;

    let output = ListOutput {
        directory: dir.display().to_string(),
        wallets: registry
            .records()
            .map(|record| WalletSummary {
                label: record.label().to_string(),
                public_key: record.public_key().to_string(),
                source: record.source().display().to_string(),
            })
            .collect(),
        failures: failures
            .iter()
            .map(|failure| FailureSummary {
                path: failure.path.display().to_string(),
                label: failure.label.clone(),
                error: failure.error.to_string(),
            })
            .collect(),
    };

    match cmd.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        "text" => print_text_listing(&output),
        other => bail!("Unsupported output format '{}' (expected text or json)", other),
    }

    registry.teardown();
    Ok(())
}

fn print_text_listing(output: &ListOutput) {
    print!("{}", render_text_listing(output));
}

fn render_text_listing(output: &ListOutput) -> String {
    let mut text = String::new();

    if output.wallets.is_empty() {
        if output.failures.is_empty() {
            let _ = writeln!(
                text,
                "No wallets found in '{}'. Create wallets with 'solana-keygen new --outfile {}' and re-run.",
                output.directory,
                PathBuf::from(&output.directory).join("trader1.json").display()
            );
        } else {
            // Key files exist but none loaded
            let _ = writeln!(text, "No wallets loaded from '{}'.", output.directory);
        }
    } else {
        let _ = writeln!(text, "Discovered wallets:");
        for wallet in &output.wallets {
            let _ = writeln!(text, "- {}: {} ({})", wallet.label, wallet.public_key, wallet.source);
        }
    }

    if !output.failures.is_empty() {
        let _ = writeln!(text);
        let _ = writeln!(text, "Failed to load {} file(s):", output.failures.len());
        for failure in &output.failures {
            let _ = writeln!(text, "- {}: {}", failure.path, failure.error);
        }
    }

    text
}

/// Handle pubkey command
async fn pubkey_command(cmd: PubkeyCmd, config: Config) -> Result<()> {
    let (registry, _) = load_wallets(&config).await?;
    let public_key = registry.get_public_key(&cmd.label)?;
    println!("{}", public_key);
    registry.teardown();
    Ok(())
}

/// Handle sign command
async fn sign_command(cmd: SignCmd, config: Config) -> Result<()> {
    let (registry, _) = load_wallets(&config).await?;

    tracing::info!("Signing {} byte(s) with wallet '{}'", cmd.message.len(), cmd.label);
    let signature = registry.sign(&cmd.label, cmd.message.as_bytes())?;

    if cmd.base64 {
        println!(
            "{}",
            base64::engine::general_purpose::STANDARD.encode(signature.as_ref())
        );
    } else {
        println!("{}", signature);
    }

    registry.teardown();
    Ok(())
}
