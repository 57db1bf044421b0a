use std::{fmt, path::Path, str::FromStr};

use anyhow::{anyhow, Result};
use serde::Deserialize;

pub const ENV_CONFIG_PATH: &str = "CONFIG_PATH";
pub const ENV_STORAGE_PATH: &str = "REVIEWS_STORAGE_PATH";
pub const ENV_STORAGE_BACKEND: &str = "REVIEWS_STORAGE_BACKEND";
pub const ENV_DELETION: &str = "REVIEWS_DELETION";

/// Limits apply to the JSON encoding; a quoted hyphenated UUID takes 38 bytes.
pub const MIN_KEY_BYTES: usize = 38;
pub const MIN_VALUE_BYTES: usize = 256;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub reviews: ReviewsConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_storage_path")]
    pub path: String,
    #[serde(default = "default_max_key_bytes")]
    pub max_key_bytes: usize,
    #[serde(default = "default_max_value_bytes")]
    pub max_value_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            path: default_storage_path(),
            max_key_bytes: default_max_key_bytes(),
            max_value_bytes: default_max_value_bytes(),
        }
    }
}

fn default_storage_path() -> String { "data/reviews.json".into() }
fn default_max_key_bytes() -> usize { 64 }
fn default_max_value_bytes() -> usize { 64 * 1024 }

/// Whether reviews may be removed once published.
///
/// `Disabled` keeps every review forever: single deletes and the bulk clear
/// are both rejected.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeletionPolicy {
    #[default]
    Enabled,
    Disabled,
}

impl DeletionPolicy {
    pub fn allows_deletion(self) -> bool { matches!(self, DeletionPolicy::Enabled) }
}

impl FromStr for DeletionPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enabled" | "on" | "true" => Ok(DeletionPolicy::Enabled),
            "disabled" | "off" | "false" => Ok(DeletionPolicy::Disabled),
            other => Err(anyhow!("unknown deletion policy `{other}` (expected enabled|disabled)")),
        }
    }
}

impl fmt::Display for DeletionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeletionPolicy::Enabled => f.write_str("enabled"),
            DeletionPolicy::Disabled => f.write_str("disabled"),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow!("unknown storage backend `{other}` (expected file|memory)")),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ReviewsConfig {
    #[serde(default)]
    pub deletion: DeletionPolicy,
}

pub fn config_path() -> String {
    std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| "config.toml".to_string())
}

/// Reads `CONFIG_PATH` (or `config.toml`); a missing file yields the defaults.
pub fn load_default() -> Result<AppConfig> {
    let path = config_path();
    if Path::new(&path).exists() {
        load_from_file(&path)
    } else {
        Ok(AppConfig::default())
    }
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Loads `.env`, then `load_default`, then applies env overrides.
    pub fn load_and_validate() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let mut cfg = load_default()?;
        cfg.apply_overrides(|key| std::env::var(key).ok())?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Applies overrides from a variable lookup (normally the process env).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_STORAGE_PATH) {
            self.storage.path = path;
        }
        if let Some(backend) = lookup(ENV_STORAGE_BACKEND) {
            self.storage.backend = backend.parse()?;
        }
        if let Some(policy) = lookup(ENV_DELETION) {
            self.reviews.deletion = policy.parse()?;
        }
        Ok(())
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.storage.normalize();
        self.storage.validate()?;
        Ok(())
    }
}

impl StorageConfig {
    fn normalize(&mut self) {
        self.path = self.path.trim().to_string();
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend == StorageBackend::File && self.path.is_empty() {
            return Err(anyhow!(
                "storage.path is empty; set it in config.toml or {ENV_STORAGE_PATH}"
            ));
        }
        if self.max_key_bytes < MIN_KEY_BYTES {
            return Err(anyhow!("storage.max_key_bytes must be >= {MIN_KEY_BYTES}"));
        }
        if self.max_value_bytes < MIN_VALUE_BYTES {
            return Err(anyhow!("storage.max_value_bytes must be >= {MIN_VALUE_BYTES}"));
        }
        Ok(())
    }
}
