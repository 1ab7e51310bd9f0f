// ⚙️ Configuration - where the ledger lives and how results are displayed
//
// Resolution order: built-in defaults, then environment variables, then
// whatever the binary overrides from its command line.

use std::fs;
use std::path::PathBuf;

use crate::error::{LedgerError, Result};
use crate::report::DEFAULT_DISPLAY_SCALE;

pub const ENV_DB_PATH: &str = "LEDGER_DB";
pub const ENV_DISPLAY_SCALE: &str = "LEDGER_DISPLAY_SCALE";
pub const ENV_SERVER_ADDR: &str = "LEDGER_ADDR";

const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:3000";
const DB_DIR: &str = "ledger";
const DB_FILE: &str = "ledger.db";

/// Largest scale `rust_decimal` can represent.
const MAX_DISPLAY_SCALE: u32 = 28;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// SQLite database file
    pub db_path: PathBuf,
    /// Fractional digits shown for aggregated amounts
    pub display_scale: u32,
    /// Listen address for the HTTP bridge
    pub server_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            display_scale: DEFAULT_DISPLAY_SCALE,
            server_addr: DEFAULT_SERVER_ADDR.into(),
        }
    }
}

/// `<data dir>/ledger/ledger.db`, or `./ledger.db` when the platform has no data dir.
pub fn default_db_path() -> PathBuf {
    match dirs::data_dir() {
        Some(dir) => dir.join(DB_DIR).join(DB_FILE),
        None => PathBuf::from(DB_FILE),
    }
}

impl Config {
    /// Defaults overridden by the process environment.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = lookup(ENV_DB_PATH).filter(|p| !p.trim().is_empty()) {
            config.db_path = PathBuf::from(path);
        }

        if let Some(raw) = lookup(ENV_DISPLAY_SCALE) {
            config.display_scale = parse_scale(&raw)?;
        }

        if let Some(addr) = lookup(ENV_SERVER_ADDR).filter(|a| !a.trim().is_empty()) {
            config.server_addr = addr;
        }

        Ok(config)
    }

    /// Create the directory that will hold the database file.
    pub fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

fn parse_scale(raw: &str) -> Result<u32> {
    let scale: u32 = raw.trim().parse().map_err(|_| {
        LedgerError::InvalidConfig(format!("{} must be a non-negative integer, got `{}`", ENV_DISPLAY_SCALE, raw))
    })?;

    if scale > MAX_DISPLAY_SCALE {
        return Err(LedgerError::InvalidConfig(format!(
            "{} must be at most {}, got {}",
            ENV_DISPLAY_SCALE, MAX_DISPLAY_SCALE, scale
        )));
    }

    Ok(scale)
}
