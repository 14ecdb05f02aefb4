//! Configuration management for NovAi.
//!
//! Handles loading configuration from TOML files and environment variables:
//! the warehouse account and credentials, the target table the chat is scoped
//! to, and completion settings.

use crate::db::TargetTable;
use crate::error::{NovaiError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::Url;

/// Default Cortex model used for both SQL generation and summaries.
pub const DEFAULT_MODEL: &str = "snowflake-arctic";

/// Main configuration structure for NovAi.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Snowflake account and credentials.
    #[serde(default)]
    pub warehouse: WarehouseConfig,

    /// The single table the chat generates queries against.
    #[serde(default)]
    pub target: TargetTable,

    /// Completion service settings.
    #[serde(default)]
    pub completion: CompletionConfig,
}

/// Completion service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Cortex model identifier passed to `SNOWFLAKE.CORTEX.COMPLETE`.
    #[serde(default = "default_model")]
    pub model: String,

    /// Whether to ask the model for a prose summary of each result.
    #[serde(default = "default_summarize")]
    pub summarize: bool,

    /// Extra context added to every generation prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_summarize() -> bool {
    true
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            summarize: default_summarize(),
            context: None,
        }
    }
}

/// How the bearer token sent to the SQL API was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenType {
    /// JWT signed with the user's key pair.
    #[default]
    KeypairJwt,
    /// OAuth access token.
    Oauth,
    /// Programmatic access token.
    ProgrammaticAccessToken,
}

impl TokenType {
    /// Value for the `X-Snowflake-Authorization-Token-Type` header.
    pub fn as_header_value(&self) -> &'static str {
        match self {
            Self::KeypairJwt => "KEYPAIR_JWT",
            Self::Oauth => "OAUTH",
            Self::ProgrammaticAccessToken => "PROGRAMMATIC_ACCESS_TOKEN",
        }
    }
}

impl FromStr for TokenType {
    type Err = NovaiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "KEYPAIR_JWT" | "JWT" => Ok(Self::KeypairJwt),
            "OAUTH" => Ok(Self::Oauth),
            "PROGRAMMATIC_ACCESS_TOKEN" | "PAT" => Ok(Self::ProgrammaticAccessToken),
            _ => Err(NovaiError::config(format!(
                "Invalid token type '{s}'. Expected KEYPAIR_JWT, OAUTH or PROGRAMMATIC_ACCESS_TOKEN"
            ))),
        }
    }
}

/// Snowflake warehouse connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WarehouseConfig {
    /// Account identifier (e.g. `xy12345.us-east-1` or `myorg-myaccount`).
    pub account: Option<String>,

    /// Virtual warehouse to run statements on.
    pub warehouse: Option<String>,

    /// Role to run statements as.
    pub role: Option<String>,

    /// Bearer token (not recommended to store in config; use SNOWFLAKE_TOKEN).
    pub token: Option<String>,

    /// Kind of bearer token. Unset means `KEYPAIR_JWT`.
    pub token_type: Option<TokenType>,

    /// Server-side statement timeout in seconds. Unset means the account default.
    pub timeout_secs: Option<u64>,

    /// Overrides the account URL (proxies, private link, tests).
    pub base_url: Option<String>,
}

impl WarehouseConfig {
    /// Merges another config into this one, with the other taking precedence.
    pub fn merge(&mut self, other: &WarehouseConfig) {
        if other.account.is_some() {
            self.account = other.account.clone();
        }
        if other.warehouse.is_some() {
            self.warehouse = other.warehouse.clone();
        }
        if other.role.is_some() {
            self.role = other.role.clone();
        }
        if other.token.is_some() {
            self.token = other.token.clone();
        }
        if other.token_type.is_some() {
            self.token_type = other.token_type;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        if other.base_url.is_some() {
            self.base_url = other.base_url.clone();
        }
    }

    /// Applies environment variables (SNOWFLAKE_ACCOUNT, etc.) as defaults.
    pub fn apply_env_defaults(&mut self) {
        self.apply_defaults_from(|key| std::env::var(key).ok());
    }

    /// Fills unset fields from `lookup`, keyed by environment variable name.
    pub fn apply_defaults_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.account.is_none() {
            self.account = lookup("SNOWFLAKE_ACCOUNT");
        }
        if self.warehouse.is_none() {
            self.warehouse = lookup("SNOWFLAKE_WAREHOUSE");
        }
        if self.role.is_none() {
            self.role = lookup("SNOWFLAKE_ROLE");
        }
        if self.token.is_none() {
            self.token = lookup("SNOWFLAKE_TOKEN");
        }
        if self.token_type.is_none() {
            self.token_type = lookup("SNOWFLAKE_TOKEN_TYPE").and_then(|s| s.parse().ok());
        }
    }

    /// Returns the configured token type, defaulting to `KEYPAIR_JWT`.
    pub fn token_type(&self) -> TokenType {
        self.token_type.unwrap_or_default()
    }

    /// Returns the root URL of the SQL API for this account.
    pub fn api_base_url(&self) -> Result<Url> {
        if let Some(base_url) = &self.base_url {
            return Url::parse(base_url)
                .map_err(|e| NovaiError::config(format!("Invalid base_url '{base_url}': {e}")));
        }

        let account = self
            .account
            .as_deref()
            .ok_or_else(|| NovaiError::config("Snowflake account is required"))?;

        if account.is_empty()
            || !account
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(NovaiError::config(format!(
                "Invalid account identifier '{account}'"
            )));
        }

        // Underscores are not valid in hostnames; Snowflake accepts dashes instead.
        let host = account.to_lowercase().replace('_', "-");
        Url::parse(&format!("https://{host}.snowflakecomputing.com"))
            .map_err(|e| NovaiError::config(format!("Invalid account identifier: {e}")))
    }

    /// Returns the bearer token or a configuration error.
    pub fn require_token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| NovaiError::config("No token configured. Set SNOWFLAKE_TOKEN."))
    }

    /// Returns a display-safe string (no token) for UI purposes.
    pub fn display_string(&self) -> String {
        let account = self.account.as_deref().unwrap_or("unknown");
        match (&self.warehouse, &self.role) {
            (Some(wh), Some(role)) => format!("{account} ({wh}, {role})"),
            (Some(wh), None) => format!("{account} ({wh})"),
            (None, Some(role)) => format!("{account} ({role})"),
            (None, None) => account.to_string(),
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("novai")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| NovaiError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            NovaiError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }
}
