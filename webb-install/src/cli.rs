use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;
use crate::platform::Platform;
use crate::release::{VersionSelector, DEFAULT_RELEASE_URL};
use crate::utils::{self, Extractor};

#[derive(Parser, Debug, Clone)]
#[clap(
    name = "webb-install",
    version,
    about = "Install the webb CLI from its prebuilt GitHub releases",
    long_about = None
)]
pub struct Args {
    /// Release tag to install (e.g. v0.1.0-beta.2). Installs the latest
    /// release when omitted
    #[clap(id = "tag", value_name = "VERSION")]
    pub tag: Option<String>,

    /// Target platform triple, overriding host detection (e.g. aarch64-apple-darwin)
    #[clap(short = 'T', long)]
    pub target: Option<String>,

    /// Installation directory [default: ~/.webb]
    #[clap(short = 'd', long, env = "WEBB_INSTALL_DIR")]
    pub install_dir: Option<String>,

    /// Base URL of the release host
    #[clap(long, env = "WEBB_RELEASE_URL", hide = true)]
    pub release_url: Option<String>,

    /// Archive extractor to use
    #[clap(long, value_enum)]
    pub extractor: Option<Extractor>,

    /// HTTP timeout in seconds
    #[clap(long)]
    pub timeout: Option<u64>,

    /// Configuration file path [default: <config dir>/webb-install.toml]
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[clap(long)]
    pub verbose: bool,
}

impl Args {
    pub fn version_selector(&self) -> VersionSelector {
        VersionSelector::from(self.tag.clone())
    }

    /// Target platform, detected from the host unless overridden
    pub fn platform(&self) -> Platform {
        match &self.target {
            Some(triple) => Platform::from_triple(triple),
            None => Platform::detect(),
        }
    }

    /// Get the installation directory as PathBuf, expanding ~
    pub fn install_dir(&self) -> Result<PathBuf> {
        match &self.install_dir {
            Some(dir) => utils::expand_home(dir),
            None => utils::expand_home(&crate::config::default_install_dir()),
        }
    }

    pub fn release_url(&self) -> &str {
        self.release_url.as_deref().unwrap_or(DEFAULT_RELEASE_URL)
    }

    pub fn extractor(&self) -> Extractor {
        self.extractor.unwrap_or_default()
    }

    /// Explicit `--config`, else the per-user default when a config dir exists
    pub fn config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(Config::default_path)
    }
}
