use anyhow::{Context, Result};
use std::env;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_ASSETS_DIR: &str = "static";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Process-wide settings, read once at startup.
#[derive(Clone)]
pub struct Config {
    /// OpenAI credential. Optional at startup: requests fail with 500 until it is set.
    pub api_key: Option<String>,
    pub api_base: String,
    pub timeout: Duration,
    pub bind_addr: String,
    pub assets_dir: String,
}

impl Config {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENAI_KEY").filter(|k| !k.trim().is_empty());

        let api_base = lookup("OPENAI_API_BASE")
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let timeout_secs = match lookup("OPENAI_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("OPENAI_TIMEOUT_SECS must be a number, got '{}'", raw))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_key,
            api_base,
            timeout: Duration::from_secs(timeout_secs),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            assets_dir: lookup("ASSETS_DIR").unwrap_or_else(|| DEFAULT_ASSETS_DIR.to_string()),
        })
    }
}

// Keeps the key out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .field("bind_addr", &self.bind_addr)
            .field("assets_dir", &self.assets_dir)
            .finish()
    }
}
