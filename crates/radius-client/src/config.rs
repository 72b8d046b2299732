use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Client configuration
///
/// Layered as: defaults, then a JSON file, then `RADIUS_*` environment
/// variables, then whatever the caller sets explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// RADIUS server host name or address
    #[serde(default = "default_server")]
    pub server: String,

    /// Shared secret
    #[serde(default = "default_secret")]
    pub secret: String,

    /// Authentication port (Access-Request, Status-Server)
    #[serde(default = "default_auth_port")]
    pub auth_port: u16,

    /// Accounting port (Accounting-Request)
    #[serde(default = "default_acct_port")]
    pub acct_port: u16,

    /// Retransmissions after the first attempt
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Time to wait for a reply to each attempt, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Dictionary file; the built-in dictionary is used when unset
    #[serde(default)]
    pub dictionary: Option<PathBuf>,

    /// NAS-Identifier sent with every request built by the client helpers
    #[serde(default = "default_nas_identifier")]
    pub nas_identifier: String,

    /// Add Message-Authenticator to Access-Requests (always added to Status-Server)
    #[serde(default = "default_message_authenticator")]
    pub message_authenticator: bool,
}

fn default_server() -> String {
    "localhost".to_string()
}

fn default_secret() -> String {
    "testing123".to_string()
}

fn default_auth_port() -> u16 {
    1812 // Standard RADIUS authentication port
}

fn default_acct_port() -> u16 {
    1813 // Standard RADIUS accounting port
}

fn default_retries() -> u32 {
    3
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_nas_identifier() -> String {
    "radcli".to_string()
}

fn default_message_authenticator() -> bool {
    true
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            server: default_server(),
            secret: default_secret(),
            auth_port: default_auth_port(),
            acct_port: default_acct_port(),
            retries: default_retries(),
            timeout_ms: default_timeout_ms(),
            dictionary: None,
            nas_identifier: default_nas_identifier(),
            message_authenticator: default_message_authenticator(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: ClientConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Override fields from `RADIUS_SERVER`, `RADIUS_SECRET`,
    /// `RADIUS_AUTH_PORT` and `RADIUS_ACCT_PORT`
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Same as [`apply_env`](Self::apply_env) with an explicit variable source
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(server) = lookup("RADIUS_SERVER") {
            self.server = server;
        }
        if let Some(secret) = lookup("RADIUS_SECRET") {
            self.secret = secret;
        }
        if let Some(port) = lookup("RADIUS_AUTH_PORT") {
            self.auth_port = parse_port("RADIUS_AUTH_PORT", &port)?;
        }
        if let Some(port) = lookup("RADIUS_ACCT_PORT") {
            self.acct_port = parse_port("RADIUS_ACCT_PORT", &port)?;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.trim().is_empty() {
            return Err(ConfigError::Invalid("Server cannot be empty".to_string()));
        }

        if self.secret.is_empty() {
            return Err(ConfigError::Invalid("Shared secret cannot be empty".to_string()));
        }

        if self.auth_port == 0 || self.acct_port == 0 {
            return Err(ConfigError::Invalid("Ports cannot be 0".to_string()));
        }

        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("Timeout cannot be 0".to_string()));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Secret with all but the first two characters masked, for display
    pub fn masked_secret(&self) -> String {
        let chars: Vec<char> = self.secret.chars().collect();
        if chars.len() > 2 {
            let visible: String = chars[..2].iter().collect();
            format!("{}{}", visible, "*".repeat(chars.len() - 2))
        } else {
            "***".to_string()
        }
    }
}

fn parse_port(variable: &str, value: &str) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{} is not a valid port: {}", variable, value)))
}
