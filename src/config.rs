// Configuration & logging setup shared by the TUI and the server
//
// Resolution order: built-in defaults, then the JSON file named by
// FASTMONEY_CONFIG (if set), then individual FASTMONEY_* variables.

use anyhow::{bail, Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::{hash_password, AuthProvider};
use crate::listing::{ListingEngine, DEFAULT_PAGE_SIZE};

pub const DEFAULT_ADMIN_PASSWORD: &str = "changeme";

/// Longest admin session the server hands out (one year).
pub const MAX_SESSION_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_path: PathBuf,
    pub bind_addr: String,
    pub page_size: usize,
    pub admin_email: String,
    pub admin_password_sha256: String,
    pub session_ttl_minutes: i64,
    /// Where the TUI writes its log (the terminal is busy rendering)
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: PathBuf::from("fastmoney.db"),
            bind_addr: "0.0.0.0:3000".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            admin_email: "admin@fastmoney.local".to_string(),
            admin_password_sha256: hash_password(DEFAULT_ADMIN_PASSWORD),
            session_ttl_minutes: 60 * 8,
            log_file: PathBuf::from("fastmoney.log"),
        }
    }
}

impl Config {
    /// Load from the process environment.
    pub fn load() -> Result<Self> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let mut config = match vars.get("FASTMONEY_CONFIG") {
            Some(path) => Self::from_file(Path::new(path))?,
            None => Config::default(),
        };

        if let Some(path) = vars.get("FASTMONEY_DB") {
            config.database_path = PathBuf::from(path);
        }
        if let Some(addr) = vars.get("FASTMONEY_ADDR") {
            config.bind_addr = addr.clone();
        }
        if let Some(size) = vars.get("FASTMONEY_PAGE_SIZE") {
            config.page_size = size
                .parse()
                .with_context(|| format!("FASTMONEY_PAGE_SIZE is not a number: {size}"))?;
        }
        if let Some(email) = vars.get("FASTMONEY_ADMIN_EMAIL") {
            config.admin_email = email.clone();
        }
        if let Some(password) = vars.get("FASTMONEY_ADMIN_PASSWORD") {
            config.admin_password_sha256 = hash_password(password);
        }
        if let Some(file) = vars.get("FASTMONEY_LOG_FILE") {
            config.log_file = PathBuf::from(file);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would only fail later, at request time.
    pub fn validate(&self) -> Result<()> {
        self.session_ttl()?;
        Ok(())
    }

    pub fn session_ttl(&self) -> Result<Duration> {
        let minutes = self.session_ttl_minutes;
        if !(1..=MAX_SESSION_TTL_MINUTES).contains(&minutes) {
            bail!(
                "session_ttl_minutes must be between 1 and {}, got {}",
                MAX_SESSION_TTL_MINUTES,
                minutes
            );
        }

        Duration::try_minutes(minutes)
            .with_context(|| format!("session_ttl_minutes out of range: {minutes}"))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn uses_default_password(&self) -> bool {
        self.admin_password_sha256 == hash_password(DEFAULT_ADMIN_PASSWORD)
    }

    pub fn listing_engine(&self) -> ListingEngine {
        ListingEngine::new(self.page_size)
    }

    pub fn auth_provider(&self) -> Result<AuthProvider> {
        Ok(AuthProvider::new(
            self.admin_email.clone(),
            self.admin_password_sha256.clone(),
            self.session_ttl()?,
        ))
    }
}

// ============================================================================
// LOGGING
// ============================================================================

/// Where log lines go.
pub enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// `info` level.
pub fn init_logging(target: LogTarget<'_>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match target {
        LogTarget::Stderr => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()?,
        LogTarget::File(path) => {
            let file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
                .try_init()?
        }
    }

    Ok(())
}
