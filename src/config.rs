use anyhow::{Context, Result};
use reqwest::Url;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_MINI_APP_URL: &str = "https://logiccrafterdz.github.io/realpnl/";
pub const DEFAULT_HEALTH_PORT: u16 = 10000;
pub const DEFAULT_SUPPORT_CONTACT: &str = "@your_support_username";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("BOT_TOKEN is required")]
    MissingToken,
    #[error("invalid PORT value {0:?}")]
    InvalidPort(String),
}

/// Runtime configuration shared read-only by the dispatcher and the health listener.
#[derive(Debug, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub health: HealthConfig,
}

#[derive(Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// `None` when unset, blank or not an absolute URL.
    pub mini_app_url: Option<Url>,
    pub support_contact: String,
}

// Keeps the token out of logs.
impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("mini_app_url", &self.mini_app_url.as_ref().map(Url::as_str))
            .field("support_contact", &self.support_contact)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct HealthConfig {
    pub port: u16,
}

/// Shape of the optional TOML file. Every field may be omitted.
#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub telegram: FileTelegram,
    #[serde(default)]
    pub health: FileHealth,
}

#[derive(Debug, Deserialize, Default)]
pub struct FileTelegram {
    pub bot_token: Option<String>,
    pub mini_app_url: Option<String>,
    pub support_contact: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FileHealth {
    pub port: Option<u16>,
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

impl Config {
    /// Load from an optional TOML file, `.env`, then the process environment.
    ///
    /// An explicitly given `path` must exist; the default `config.toml` is
    /// only read when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => FileConfig::read(path)?,
            None => {
                let default_path = PathBuf::from("config.toml");
                if default_path.exists() {
                    FileConfig::read(&default_path)?
                } else {
                    FileConfig::default()
                }
            }
        };

        // A missing .env is normal in production
        dotenvy::dotenv().ok();

        let config = Self::resolve(file, |key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Merge file values with environment lookups; the environment wins.
    pub fn resolve<F>(file: FileConfig, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = env("BOT_TOKEN")
            .or(file.telegram.bot_token)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let raw_url = env("MINI_APP_URL")
            .or(file.telegram.mini_app_url)
            .unwrap_or_else(|| DEFAULT_MINI_APP_URL.to_string());
        let mini_app_url = parse_mini_app_url(&raw_url);

        let support_contact = env("SUPPORT_CONTACT")
            .or(file.telegram.support_contact)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_SUPPORT_CONTACT.to_string());

        let port = match env("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => file.health.port.unwrap_or(DEFAULT_HEALTH_PORT),
        };

        Ok(Self {
            telegram: TelegramConfig {
                bot_token,
                mini_app_url,
                support_contact,
            },
            health: HealthConfig { port },
        })
    }
}

fn parse_mini_app_url(raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match Url::parse(raw) {
        Ok(url) => Some(url),
        Err(e) => {
            warn!("Ignoring MINI_APP_URL {:?}: {}", raw, e);
            None
        }
    }
}
