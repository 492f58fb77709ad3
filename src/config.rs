use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable selecting the API base URL.
pub const BASE_URL_ENV: &str = "GYMDESK_API_URL";

/// Production API host used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.gymdesk.app";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub storage: StorageConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
  /// Overridden by `GYMDESK_API_URL` when that is set
  pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Seconds before a cached read is refetched
  #[serde(default = "default_stale_secs")]
  pub stale_secs: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      stale_secs: default_stale_secs(),
    }
  }
}

fn default_stale_secs() -> u64 {
  300
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
  /// Location of the persisted client state database
  pub path: Option<PathBuf>,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./gymdesk.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/gymdesk/config.yaml
  ///
  /// Unlike an explicit path, a missing search-path file just yields defaults.
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

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("gymdesk.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("gymdesk").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  pub fn from_yaml(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    Ok(config)
  }

  /// Resolve the API base URL once for the process.
  ///
  /// `GYMDESK_API_URL` wins over the config file, which wins over
  /// [`DEFAULT_BASE_URL`].
  pub fn base_url(&self) -> String {
    let from_env = std::env::var(BASE_URL_ENV).ok();
    resolve_base_url(from_env.as_deref(), self.api.base_url.as_deref())
  }

  pub fn stale_time(&self) -> Duration {
    Duration::from_secs(self.cache.stale_secs)
  }

  /// Path of the persisted client state database.
  pub fn storage_path(&self) -> Result<PathBuf> {
    if let Some(path) = &self.storage.path {
      return Ok(path.clone());
    }

    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("gymdesk").join("storage.db"))
  }
}

/// Pick the first non-blank candidate and strip trailing slashes.
pub fn resolve_base_url(from_env: Option<&str>, from_file: Option<&str>) -> String {
  let chosen = [from_env, from_file]
    .into_iter()
    .flatten()
    .map(str::trim)
    .find(|s| !s.is_empty())
    .unwrap_or(DEFAULT_BASE_URL);

  chosen.trim_end_matches('/').to_string()
}
