//! Configuration management with TOML, environment variables, and CLI overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Base delay between requests in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Random jitter added to delay (0 to this value)
    #[serde(default = "default_delay_jitter_ms")]
    pub delay_jitter_ms: u64,

    /// Overall request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Path to the SQLite review store
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// How a non-empty page shorter than the page size affects pagination
    #[serde(default)]
    pub sparse_page: SparsePagePolicy,
}

fn default_delay_ms() -> u64 {
    2000
}

fn default_delay_jitter_ms() -> u64 {
    3000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_db_path() -> PathBuf {
    PathBuf::from("reviews.db")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proxy: None,
            delay_ms: default_delay_ms(),
            delay_jitter_ms: default_delay_jitter_ms(),
            timeout_secs: default_timeout_secs(),
            db_path: default_db_path(),
            sparse_page: SparsePagePolicy::Count,
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("review-grabber").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(proxy) = std::env::var("RG_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Ok(delay) = std::env::var("RG_DELAY") {
            if let Ok(d) = delay.parse() {
                self.delay_ms = d;
            }
        }

        if let Ok(db) = std::env::var("RG_DB") {
            self.db_path = PathBuf::from(db);
        }

        self
    }
}

/// Whether a sparse (non-empty but partial) page counts toward the expected
/// total or ends the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SparsePagePolicy {
    /// Partial pages count toward progress and paging continues.
    #[default]
    Count,
    /// A non-empty page shorter than the page size ends the run after its
    /// reviews are kept.
    SoftStop,
}

impl std::str::FromStr for SparsePagePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "count" => Ok(SparsePagePolicy::Count),
            "soft-stop" | "softstop" => Ok(SparsePagePolicy::SoftStop),
            _ => Err(format!("Unknown sparse-page policy: {}. Use: count, soft-stop", s)),
        }
    }
}

impl std::fmt::Display for SparsePagePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SparsePagePolicy::Count => write!(f, "count"),
            SparsePagePolicy::SoftStop => write!(f, "soft-stop"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.proxy.is_none());
        assert_eq!(config.delay_ms, 2000);
        assert_eq!(config.delay_jitter_ms, 3000);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.db_path, PathBuf::from("reviews.db"));
        assert_eq!(config.sparse_page, SparsePagePolicy::Count);
    }

    #[test]
    fn test_sparse_page_policy_parsing() {
        assert_eq!("count".parse::<SparsePagePolicy>().unwrap(), SparsePagePolicy::Count);
        assert_eq!("COUNT".parse::<SparsePagePolicy>().unwrap(), SparsePagePolicy::Count);
        assert_eq!("soft-stop".parse::<SparsePagePolicy>().unwrap(), SparsePagePolicy::SoftStop);
        assert_eq!("softstop".parse::<SparsePagePolicy>().unwrap(), SparsePagePolicy::SoftStop);

        let err = "invalid".parse::<SparsePagePolicy>().unwrap_err();
        assert!(err.contains("Unknown sparse-page policy"));
    }

    #[test]
    fn test_sparse_page_policy_display() {
        assert_eq!(SparsePagePolicy::Count.to_string(), "count");
        assert_eq!(SparsePagePolicy::SoftStop.to_string(), "soft-stop");
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            delay_ms = 3000
            timeout_secs = 10
            db_path = "other.db"
            sparse_page = "soft-stop"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.delay_ms, 3000);
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.db_path, PathBuf::from("other.db"));
        assert_eq!(config.sparse_page, SparsePagePolicy::SoftStop);
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            proxy = "socks5://localhost:1080"
            delay_ms = 4000
            "#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.proxy, Some("socks5://localhost:1080".to_string()));
        assert_eq!(config.delay_ms, 4000);
    }

    #[test]
    fn test_config_from_file_not_found() {
        let result = Config::from_file("/nonexistent/path/config.toml");
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn test_config_from_file_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml {{{{").unwrap();

        let result = Config::from_file(file.path());
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_config_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            delay_ms = 1234
            "#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.delay_ms, 1234);
    }

    #[test]
    fn test_config_with_env() {
        // Save original env vars
        let orig_proxy = std::env::var("RG_PROXY").ok();
        let orig_delay = std::env::var("RG_DELAY").ok();
        let orig_db = std::env::var("RG_DB").ok();

        std::env::set_var("RG_PROXY", "http://proxy:8080");
        std::env::set_var("RG_DELAY", "5000");
        std::env::set_var("RG_DB", "env.db");

        let config = Config::new().with_env();
        assert_eq!(config.proxy, Some("http://proxy:8080".to_string()));
        assert_eq!(config.delay_ms, 5000);
        assert_eq!(config.db_path, PathBuf::from("env.db"));

        // An unparseable delay is ignored, keeping the default
        std::env::set_var("RG_DELAY", "not_a_number");
        let config = Config::new().with_env();
        assert_eq!(config.delay_ms, 2000);

        // Restore original env vars
        match orig_proxy {
            Some(v) => std::env::set_var("RG_PROXY", v),
            None => std::env::remove_var("RG_PROXY"),
        }
        match orig_delay {
            Some(v) => std::env::set_var("RG_DELAY", v),
            None => std::env::remove_var("RG_DELAY"),
        }
        match orig_db {
            Some(v) => std::env::set_var("RG_DB", v),
            None => std::env::remove_var("RG_DB"),
        }
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config {
            proxy: Some("socks5://localhost:1080".to_string()),
            delay_ms: 3000,
            delay_jitter_ms: 1500,
            timeout_secs: 15,
            db_path: PathBuf::from("roundtrip.db"),
            sparse_page: SparsePagePolicy::SoftStop,
        };

        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.proxy, config.proxy);
        assert_eq!(parsed.delay_ms, config.delay_ms);
        assert_eq!(parsed.timeout_secs, config.timeout_secs);
        assert_eq!(parsed.db_path, config.db_path);
        assert_eq!(parsed.sparse_page, config.sparse_page);
    }
}
