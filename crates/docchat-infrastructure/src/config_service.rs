//! Configuration service implementation.
//!
//! This module provides a ConfigService that loads the client configuration
//! from the configuration file (~/.config/docchat/config.toml) and applies
//! environment overrides on top of it.

use crate::paths::DocchatPaths;
use docchat_core::config::ClientConfig;
use docchat_core::error::{DocchatError, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// Overrides `backend.base_url`.
pub const ENV_BASE_URL: &str = "DOCCHAT_BASE_URL";
/// Overrides `logging.level`.
pub const ENV_LOG_LEVEL: &str = "DOCCHAT_LOG";

/// Configuration service that loads and caches the client configuration.
///
/// A missing file is created with defaults on first load.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<ClientConfig>>>,
}

impl ConfigService {
    /// Creates a ConfigService reading from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Creates a ConfigService for the default location under `paths`.
    pub fn from_paths(paths: &DocchatPaths) -> Result<Self> {
        Ok(Self::new(paths.config_file()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the configuration with environment overrides applied, loading from
    /// file if not cached.
    pub fn get_config(&self) -> Result<ClientConfig> {
        {
            let read_lock = self.config.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let mut loaded = self.load_config()?;
        apply_env_overrides(&mut loaded, |key| std::env::var(key).ok());

        let mut write_lock = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *write_lock = Some(loaded.clone());

        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *write_lock = None;
    }

    /// Reads the file, writing defaults first when it does not exist.
    fn load_config(&self) -> Result<ClientConfig> {
        if !self.path.exists() {
            let default_config = ClientConfig::default();
            self.write_config(&default_config)?;
            tracing::info!(
                "[ConfigService] Created default config at {}",
                self.path.display()
            );
            return Ok(default_config);
        }

        let content = std::fs::read_to_string(&self.path).map_err(|err| {
            DocchatError::io(format!("Failed to read {}: {}", self.path.display(), err))
        })?;
        let config: ClientConfig = toml::from_str(&content)?;
        tracing::debug!("[ConfigService] Loaded config from {}", self.path.display());
        Ok(config)
    }

    fn write_config(&self, config: &ClientConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

/// Applies `DOCCHAT_*` overrides looked up through `lookup`.
///
/// Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut ClientConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(base_url) = non_empty(ENV_BASE_URL) {
        config.backend.base_url = base_url;
    }
    if let Some(level) = non_empty(ENV_LOG_LEVEL) {
        config.logging.level = level;
    }
}
