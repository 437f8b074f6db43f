use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub provider: ProviderDefaults,
    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

/// Storage settings. When `path` is absent the relay keeps chats and
/// messages in process memory only.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DbConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    /// Requests allowed per client per one-minute window.
    #[serde(default = "default_per_minute")]
    pub per_minute: u32,
    /// How often expired limiter windows are swept from memory.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_minute: default_per_minute(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_per_minute() -> u32 {
    3
}
fn default_sweep_interval_secs() -> u64 {
    300
}

/// Fallback provider settings used when a chat request does not name its
/// own provider, endpoint, or model.
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderDefaults {
    #[serde(default = "default_provider")]
    pub default: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    /// Upper bound on one outbound vendor call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderDefaults {
    fn default() -> Self {
        Self {
            default: default_provider(),
            endpoint: None,
            model: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}

/// Administrative access settings. With no token configured, every admin
/// endpoint rejects with 401.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AdminConfig {
    #[serde(default)]
    pub token: Option<String>,
}

/// Provider credentials read once from the environment at process start.
///
/// A missing credential is a warning, not a fatal error: the matching
/// provider simply cannot be used until a key is supplied per request.
#[derive(Debug, Clone, Default)]
pub struct ProviderKeys {
    pub gemini: Option<String>,
    pub mistral: Option<String>,
    pub github: Option<String>,
}

impl ProviderKeys {
    pub fn from_env() -> Self {
        let read = |var: &str| {
            let value = std::env::var(var).ok().filter(|v| !v.is_empty());
            if value.is_none() {
                warn!(var, "provider credential not set");
            }
            value
        };
        Self {
            gemini: read("GEMINI_API_KEY"),
            mistral: read("MISTRAL_API_KEY"),
            github: read("GITHUB_TOKEN"),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.server.bind.is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    if config.provider.timeout_secs == 0 {
        anyhow::bail!("provider.timeout_secs must be > 0");
    }

    if config.rate_limit.sweep_interval_secs == 0 {
        anyhow::bail!("rate_limit.sweep_interval_secs must be > 0");
    }

    match config.provider.default.as_str() {
        "openai" | "github" | "anthropic" | "cohere" | "mistral" | "gemini" => {}
        other => anyhow::bail!(
            "Unknown provider: '{}'. Must be openai, github, anthropic, cohere, mistral, or gemini.",
            other
        ),
    }

    if let Some(token) = &config.admin.token {
        if token.len() < 16 {
            anyhow::bail!("admin.token must be at least 16 characters");
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("relay.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[server]\nbind = \"127.0.0.1:7777\"\n");
        let config = load_config(&path).unwrap();
        assert_eq!(config.rate_limit.per_minute, 3);
        assert_eq!(config.provider.default, "gemini");
        assert_eq!(config.provider.timeout_secs, 60);
        assert!(config.db.path.is_none());
        assert!(config.admin.token.is_none());
    }

    #[test]
    fn unknown_provider_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "[server]\nbind = \"127.0.0.1:7777\"\n\n[provider]\ndefault = \"grok\"\n",
        );
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn short_admin_token_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "[server]\nbind = \"127.0.0.1:7777\"\n\n[admin]\ntoken = \"short\"\n",
        );
        assert!(load_config(&path).is_err());
    }
}
