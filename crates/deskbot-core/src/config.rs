//! Configuration management
//!
//! Settings are resolved in priority order:
//! 1. Environment variables
//! 2. `deskbot.toml` config file
//! 3. Defaults
//!
//! `${VAR_NAME}` strings inside the config file expand to environment
//! variable values.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Main configuration for the deskbot client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote backend settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Session persistence settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Terminal UI settings
    #[serde(default)]
    pub ui: UiConfig,
}

/// Remote backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the support backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for POST /chat requests
    #[serde(default = "default_chat_timeout")]
    pub chat_timeout_secs: u64,

    /// Timeout for POST /reset requests
    #[serde(default = "default_reset_timeout")]
    pub reset_timeout_secs: u64,

    /// Timeout for GET /health requests
    #[serde(default = "default_health_timeout")]
    pub health_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            chat_timeout_secs: default_chat_timeout(),
            reset_timeout_secs: default_reset_timeout(),
            health_timeout_secs: default_health_timeout(),
        }
    }
}

/// Session persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Path to the SQLite database holding the session id
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Terminal UI settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Banner title
    #[serde(default = "default_title")]
    pub title: String,

    /// Greeting line shown under the banner
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Canned questions offered by /prompts
    #[serde(default = "default_quick_prompts")]
    pub quick_prompts: Vec<String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            greeting: default_greeting(),
            quick_prompts: default_quick_prompts(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_chat_timeout() -> u64 {
    15
}

fn default_reset_timeout() -> u64 {
    10
}

fn default_health_timeout() -> u64 {
    5
}

fn default_db_path() -> String {
    "data/deskbot.db".to_string()
}

fn default_title() -> String {
    "AI Customer Support Bot".to_string()
}

fn default_greeting() -> String {
    "Welcome to Unthinkable Solutions AI Customer Support! How can I help you today?".to_string()
}

fn default_quick_prompts() -> Vec<String> {
    [
        "How do I reset my password?",
        "What are your business hours?",
        "What is your refund policy?",
        "I want to talk to a human agent.",
    ]
    .map(String::from)
    .to_vec()
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// Reads `./deskbot.toml` when present, otherwise falls back to
    /// environment variables over defaults.
    pub fn load() -> Result<Self> {
        if Path::new("deskbot.toml").exists() {
            return Self::from_toml_file("deskbot.toml");
        }
        Self::from_env()
    }

    /// Load configuration from a TOML file, expanding `${VAR}` references
    /// and applying environment overrides on top.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

        let expanded = Self::expand_env_vars(&content);

        let mut config: Config = toml::from_str(&expanded)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {e}")))?;

        config.apply_env_overrides();
        Ok(config)
    }

    /// Build configuration from environment variables over defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Replace `${VAR_NAME}` occurrences with environment variable values.
    /// Unset variables expand to the empty string.
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::with_capacity(value.len());
        let mut rest = value;

        while let Some(start) = rest.find("${") {
            result.push_str(&rest[..start]);
            match rest[start + 2..].find('}') {
                Some(end) => {
                    let var_name = &rest[start + 2..start + 2 + end];
                    if let Ok(env_value) = std::env::var(var_name) {
                        result.push_str(&env_value);
                    }
                    rest = &rest[start + 2 + end + 1..];
                }
                None => {
                    // Unterminated reference, keep the tail literally
                    result.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }

        result.push_str(rest);
        result
    }

    /// Overwrite settings from environment variables
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DESKBOT_BACKEND_URL") {
            if !url.is_empty() {
                self.backend.base_url = url;
            }
        }
        if let Ok(secs) = std::env::var("DESKBOT_CHAT_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                self.backend.chat_timeout_secs = secs;
            }
        }
        if let Ok(secs) = std::env::var("DESKBOT_RESET_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                self.backend.reset_timeout_secs = secs;
            }
        }
        if let Ok(secs) = std::env::var("DESKBOT_HEALTH_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                self.backend.health_timeout_secs = secs;
            }
        }
        if let Ok(path) = std::env::var("DESKBOT_DB_PATH") {
            if !path.is_empty() {
                self.session.db_path = path;
            }
        }
        if let Ok(title) = std::env::var("DESKBOT_TITLE") {
            if !title.is_empty() {
                self.ui.title = title;
            }
        }
    }
}
