//! Configuration loader and validator for the eventdesk API server.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Environment variables read by the server and the operational scripts.
pub const REQUIRED_ENV_VARS: &[&str] = &[
    "DATABASE_URL",
    "RAZORPAY_KEY_ID",
    "RAZORPAY_KEY_SECRET",
    "GOOGLE_CLIENT_ID",
    "GOOGLE_CLIENT_SECRET",
    "GOOGLE_REDIRECT_URI",
];

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub gateway: Gateway,
    pub admin: Admin,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub bind_addr: String,
    pub data_dir: String,
    /// Public site root used to build event registration links.
    pub public_base_url: String,
}

/// Payment gateway credentials and invoice defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Gateway {
    pub base_url: String,
    pub key_id: String,
    pub key_secret: String,
    pub currency: String,
}

/// Admin session settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Admin {
    pub token_ttl_minutes: u64,
}

impl App {
    /// Data directory with a leading `~/` expanded against `$HOME`.
    pub fn resolved_data_dir(&self) -> String {
        match (self.data_dir.strip_prefix("~/"), std::env::var("HOME")) {
            (Some(rest), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), rest),
            _ => self.data_dir.clone(),
        }
    }
}

impl Config {
    /// Ensure required directories exist (creates `app.data_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.app.data_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(self.app.resolved_data_dir())
    }

    /// Database URL from `DATABASE_URL`, falling back to a file in the data dir.
    pub fn database_url(&self) -> String {
        std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| format!("sqlite://{}/eventdesk.db", self.app.resolved_data_dir()))
    }

    /// Overlay gateway credentials from the environment when present.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("RAZORPAY_KEY_ID").filter(|v| !v.trim().is_empty()) {
            self.gateway.key_id = v;
        }
        if let Some(v) = lookup("RAZORPAY_KEY_SECRET").filter(|v| !v.trim().is_empty()) {
            self.gateway.key_secret = v;
        }
    }
}

/// Load configuration from a YAML file, apply environment overrides and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let mut cfg: Config = serde_yaml::from_str(&content)?;
    cfg.apply_env_overrides(|key| std::env::var(key).ok());
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.bind_addr.trim().is_empty() {
        return Err(ConfigError::Invalid("app.bind_addr must be non-empty"));
    }
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }
    if !cfg.app.public_base_url.starts_with("http") {
        return Err(ConfigError::Invalid("app.public_base_url must be an http(s) URL"));
    }

    if !cfg.gateway.base_url.starts_with("http") {
        return Err(ConfigError::Invalid("gateway.base_url must be an http(s) URL"));
    }
    if cfg.gateway.key_id.trim().is_empty() {
        return Err(ConfigError::Invalid("gateway.key_id must be non-empty"));
    }
    if cfg.gateway.key_secret.trim().is_empty() {
        return Err(ConfigError::Invalid("gateway.key_secret must be non-empty"));
    }
    if cfg.gateway.currency.trim().len() != 3 {
        return Err(ConfigError::Invalid("gateway.currency must be a 3-letter ISO code"));
    }

    if cfg.admin.token_ttl_minutes == 0 {
        return Err(ConfigError::Invalid("admin.token_ttl_minutes must be > 0"));
    }

    Ok(())
}

/// Presence of one environment variable, with a masked preview of its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvStatus {
    pub name: &'static str,
    pub preview: Option<String>,
}

impl EnvStatus {
    pub fn is_set(&self) -> bool {
        self.preview.is_some()
    }
}

/// Report which of [`REQUIRED_ENV_VARS`] are set, masking all but the first
/// four characters of each value.
pub fn check_env<F>(lookup: F) -> Vec<EnvStatus>
where
    F: Fn(&str) -> Option<String>,
{
    REQUIRED_ENV_VARS
        .iter()
        .copied()
        .map(|name| EnvStatus {
            name,
            preview: lookup(name)
                .filter(|v| !v.trim().is_empty())
                .map(|v| mask_secret(&v)),
        })
        .collect()
}

fn mask_secret(value: &str) -> String {
    let visible: String = value.chars().take(4).collect();
    if value.chars().count() <= 4 {
        "*".repeat(value.chars().count())
    } else {
        format!("{visible}****")
    }
}

/// Returns an example configuration document.
pub fn example() -> &'static str {
    r#"app:
  bind_addr: "0.0.0.0:8080"
  data_dir: "./data"
  public_base_url: "https://events.example.com"

gateway:
  base_url: "https://api.razorpay.com/"
  key_id: "rzp_test_YOUR_KEY_ID"
  key_secret: "YOUR_KEY_SECRET"
  currency: "INR"

admin:
  token_ttl_minutes: 720
"#
}
