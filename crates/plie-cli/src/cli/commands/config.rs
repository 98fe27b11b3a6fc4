//! Config command handlers.

use anyhow::{Context, Result};
use plie_core::config::{self, BASE_URL_ENV};

pub fn path() {
    println!("{}", config::paths::config_path().display());
}

pub fn init() -> Result<()> {
    let config_path = config::paths::config_path();
    config::Config::init(&config_path)
        .with_context(|| format!("init config at {}", config_path.display()))?;
    println!("Created config at {}", config_path.display());
    println!("  [api]      base_url, timeout_ms ({BASE_URL_ENV} overrides base_url)");
    println!("  [storage]  timeout_ms, credentials_file");
    Ok(())
}
