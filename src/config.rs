use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::api::fetch::{RetryPolicy, DEFAULT_MAX_ATTEMPTS, REQUEST_TIMEOUT};

/// Environment variable overriding `api.base_url`.
pub const API_URL_ENV: &str = "FOLIO_API_URL";

const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Upper bound on `api.max_attempts`; backoff doubles per attempt.
pub const MAX_ATTEMPTS_LIMIT: u32 = 10;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub storage: StorageConfig,
  #[serde(default)]
  pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Origin the `/api/...` paths are resolved against
  #[serde(default = "default_base_url")]
  pub base_url: String,
  /// Per-attempt timeout in seconds
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
  /// Total attempts for transient network failures
  #[serde(default = "default_max_attempts")]
  pub max_attempts: u32,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      timeout_secs: default_timeout_secs(),
      max_attempts: default_max_attempts(),
    }
  }
}

fn default_base_url() -> String {
  DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
  REQUEST_TIMEOUT.as_secs()
}

fn default_max_attempts() -> u32 {
  DEFAULT_MAX_ATTEMPTS
}

impl ApiConfig {
  pub fn base_url(&self) -> Result<Url> {
    Url::parse(&self.base_url).map_err(|e| eyre!("Invalid api.base_url {}: {}", self.base_url, e))
  }

  pub fn retry_policy(&self) -> RetryPolicy {
    RetryPolicy {
      max_attempts: self.max_attempts,
      timeout: Duration::from_secs(self.timeout_secs),
      ..RetryPolicy::default()
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
  /// Set to false to keep preferences in memory only
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// SQLite file (defaults to $XDG_DATA_HOME/folio/store.db)
  pub path: Option<PathBuf>,
}

impl Default for StorageConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      path: None,
    }
  }
}

fn default_true() -> bool {
  true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
  /// Directory for daily log files; stderr only when unset
  pub directory: Option<PathBuf>,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./folio.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/folio/config.yaml
  ///
  /// Without a file the defaults are used. `FOLIO_API_URL` overrides the
  /// base URL either way.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };

    if let Ok(url) = std::env::var(API_URL_ENV) {
      config.api.base_url = url;
    }

    config.validate()?;
    Ok(config)
  }

  /// Reject settings that would make every request fail.
  pub fn validate(&self) -> Result<()> {
    self.api.base_url()?;

    if self.api.timeout_secs == 0 {
      return Err(eyre!("api.timeout_secs must be at least 1"));
    }
    if !(1..=MAX_ATTEMPTS_LIMIT).contains(&self.api.max_attempts) {
      return Err(eyre!(
        "api.max_attempts must be between 1 and {}, got {}",
        MAX_ATTEMPTS_LIMIT,
        self.api.max_attempts
      ));
    }

    Ok(())
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("folio.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("folio").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  pub fn parse(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
    serde_yaml::from_str(contents)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.api.base_url, "http://localhost:3000");
    assert_eq!(config.api.retry_policy(), RetryPolicy::default());
    assert!(config.storage.enabled);
    assert!(config.logging.directory.is_none());
  }

  #[test]
  fn test_partial_yaml_fills_defaults() {
    let config = Config::parse(
      "api:\n  base_url: https://example.com\n  max_attempts: 5\nstorage:\n  enabled: false\n",
    )
    .unwrap();

    assert_eq!(config.api.base_url, "https://example.com");
    assert_eq!(config.api.timeout_secs, 10);

    let policy = config.api.retry_policy();
    assert_eq!(policy.max_attempts, 5);
    assert_eq!(policy.timeout, Duration::from_secs(10));
    assert!(!config.storage.enabled);
  }

  #[test]
  fn test_invalid_base_url_rejected() {
    let config = Config::parse("api:\n  base_url: not a url\n").unwrap();
    assert!(config.api.base_url().is_err());
  }

  #[test]
  fn test_zero_timeout_rejected() {
    let config = Config::parse("api:\n  timeout_secs: 0\n").unwrap();
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_max_attempts_bounds() {
    for attempts in [0, MAX_ATTEMPTS_LIMIT + 1, u32::MAX] {
      let config = Config::parse(&format!("api:\n  max_attempts: {attempts}\n")).unwrap();
      assert!(config.validate().is_err(), "{attempts} accepted");
    }

    let config = Config::parse(&format!("api:\n  max_attempts: {MAX_ATTEMPTS_LIMIT}\n")).unwrap();
    assert!(config.validate().is_ok());
    assert!(Config::default().validate().is_ok());
  }

  #[test]
  fn test_load_rejects_invalid_settings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("folio.yaml");
    std::fs::write(&path, "api:\n  timeout_secs: 0\n").unwrap();
    assert!(Config::load(Some(&path)).is_err());
  }

  #[test]
  fn test_missing_explicit_path_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.yaml");
    assert!(Config::load(Some(&missing)).is_err());
  }

  #[test]
  fn test_load_from_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("folio.yaml");
    std::fs::write(&path, "storage:\n  path: /tmp/folio-test.db\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(
      config.storage.path.as_deref(),
      Some(Path::new("/tmp/folio-test.db"))
    );
  }
}
