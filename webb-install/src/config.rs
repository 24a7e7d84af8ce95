use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::InstallError;
use crate::release::DEFAULT_RELEASE_URL;
use crate::utils::Extractor;

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub default: DefaultConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DefaultConfig {
    #[serde(default = "default_install_dir")]
    pub install_dir: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_release_url")]
    pub release_url: String,

    #[serde(default)]
    pub extractor: Extractor,
}

impl Default for DefaultConfig {
    fn default() -> Self {
        Self {
            install_dir: default_install_dir(),
            timeout: default_timeout(),
            release_url: default_release_url(),
            extractor: Extractor::default(),
        }
    }
}

pub(crate) fn default_install_dir() -> String {
    "~/.webb".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_release_url() -> String {
    DEFAULT_RELEASE_URL.to_string()
}

impl Config {
    /// Load configuration from file, falling back to defaults when absent
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No configuration at {}, using defaults", path.display());
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content).map_err(|e| InstallError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(config)
    }

    /// Get the default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        directories::BaseDirs::new().map(|dirs| dirs.config_dir().join("webb-install.toml"))
    }

    /// Fill in whatever the command line and environment left unset
    pub fn merge_with_args(&self, args: &mut crate::cli::Args) {
        if args.install_dir.is_none() {
            args.install_dir = Some(self.default.install_dir.clone());
        }

        if args.release_url.is_none() {
            args.release_url = Some(self.default.release_url.clone());
        }

        if args.extractor.is_none() {
            args.extractor = Some(self.default.extractor);
        }

        if args.timeout.is_none() {
            args.timeout = Some(self.default.timeout);
        }
    }
}
