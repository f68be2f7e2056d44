//! Simple config loader using TOML and serde.
//!
//! The struct is intentionally small and typed. Secrets default to obvious
//! dev placeholders so a fresh checkout runs; deployments must override them.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Bind address for the HTTP surface (e.g., "127.0.0.1:8080").
    pub bind_addr: Option<String>,

    /// HS256 shared secret for verifying bearer tokens. Token issuance is
    /// the identity provider's job; this side only verifies.
    pub auth_secret: Option<String>,

    /// Shared secret for webhook HMAC signatures.
    pub webhook_secret: Option<String>,

    /// Token contract allow-list: contract address -> currency code.
    pub tokens: Option<HashMap<String, String>>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: Some("127.0.0.1:8080".to_string()),
            auth_secret: Some("dev-auth-secret".to_string()),
            webhook_secret: Some("dev-webhook-secret".to_string()),
            tokens: None,
        }
    }
}

impl Config {
    pub fn bind_addr(&self) -> &str {
        self.bind_addr.as_deref().unwrap_or("127.0.0.1:8080")
    }

    pub fn auth_secret(&self) -> &str {
        self.auth_secret.as_deref().unwrap_or("dev-auth-secret")
    }

    pub fn webhook_secret(&self) -> &str {
        self.webhook_secret.as_deref().unwrap_or("dev-webhook-secret")
    }
}

/// Load config from a TOML file path.
/// If the file is missing or fails to parse, an error is returned.
pub fn load_from_file(path: impl AsRef<Path>) -> anyhow::Result<Config> {
    let s = fs::read_to_string(path.as_ref())?;
    let cfg: Config = toml::from_str(&s)?;
    Ok(cfg)
}
