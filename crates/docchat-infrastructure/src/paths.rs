//! Path management for docchat configuration and logs.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/docchat/           # Config directory
//! ├── config.toml              # Client configuration
//! └── logs/                    # Application logs
//!     └── docchat.log.YYYY-MM-DD
//! ```

use docchat_core::error::{DocchatError, Result};
use std::path::PathBuf;

const APP_DIR: &str = "docchat";
const CONFIG_FILE: &str = "config.toml";
const LOG_DIR: &str = "logs";

/// Resolves docchat paths, optionally under a custom root.
#[derive(Debug, Clone)]
pub struct DocchatPaths {
    root: Option<PathBuf>,
}

impl DocchatPaths {
    /// Paths under `root`, or under the platform config directory when `None`.
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    /// Returns the docchat configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: e.g. `~/.config/docchat/`
    /// - `Err(DocchatError::Config)`: the platform config directory is unknown
    pub fn config_dir(&self) -> Result<PathBuf> {
        if let Some(root) = &self.root {
            return Ok(root.clone());
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| DocchatError::config("Cannot find config directory"))
    }

    pub fn config_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join(CONFIG_FILE))
    }

    pub fn log_dir(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join(LOG_DIR))
    }
}
