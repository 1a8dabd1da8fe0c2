//! Sniper Keystore - wallet discovery and signing CLI

use anyhow::Result;
use clap::Parser;

use sniper_keystore::adapters::cli::{self, CliApp};

fn main() -> Result<()> {
    // Load .env file if it exists (WALLETS_DIR and friends)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    cli::run(app)
}
