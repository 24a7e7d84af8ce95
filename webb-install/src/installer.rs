use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use crate::advisor::{self, Advice};
use crate::cli::Args;
use crate::config::Config;
use crate::download::Downloader;
use crate::platform::Platform;
use crate::release;
use crate::utils;

/// Fixed file name (without extension) of the downloaded archive
const DOWNLOAD_STEM: &str = "webb-download";

const STAGING_PREFIX: &str = ".webb-staging";

/// Outcome of a successful installation
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub url: String,
    pub platform: Platform,
    pub binary_path: PathBuf,
}

pub struct Installer {
    args: Args,
    downloader: Downloader,
    search_path: Option<OsString>,
}

impl Installer {
    pub fn new(mut args: Args) -> Result<Self> {
        // Load configuration
        let config = match args.config_path() {
            Some(path) => Config::load(&path).context("Failed to load configuration")?,
            None => Config::default(),
        };

        // Merge configuration with args
        config.merge_with_args(&mut args);

        let timeout = Duration::from_secs(args.timeout.unwrap_or(config.default.timeout));
        let downloader = Downloader::new(timeout)?;

        Ok(Self {
            args,
            downloader,
            search_path: std::env::var_os("PATH"),
        })
    }

    /// Search path used to locate host extraction utilities
    pub fn with_search_path(mut self, search_path: Option<OsString>) -> Self {
        self.search_path = search_path;
        self
    }

    /// Install and then tell the user how to reach the binary
    pub async fn run(&self) -> Result<(InstallReport, Advice)> {
        let report = self.install().await?;

        let binary = report.platform.binary_name();
        let install_dir = self.args.install_dir()?;
        let advice = advisor::advise(&binary, &install_dir);

        Ok((report, advice))
    }

    /// Resolve, download, extract. Any failure aborts the whole run.
    pub async fn install(&self) -> Result<InstallReport> {
        let platform = self.args.platform();

        // Check preconditions before touching the network
        let method = utils::prepare_extractor(
            self.args.extractor(),
            platform.format,
            self.search_path.as_deref(),
        )?;

        let version = self.args.version_selector();
        let url = release::release_url(self.args.release_url(), &version, &platform);

        tracing::info!(
            "Installing webb {} for {} ({})",
            version,
            platform.target,
            platform.format
        );

        let install_dir = self.args.install_dir()?;
        let archive_path =
            install_dir.join(format!("{DOWNLOAD_STEM}.{}", platform.format.extension()));

        let archive = self.downloader.download(&url, &archive_path).await?;

        // Unpack next to the install so the final moves stay on one filesystem
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&install_dir)?;
        utils::extract_archive(archive.path(), platform.format, staging.path(), &method)?;

        let binary_path =
            utils::promote_staged(staging.path(), &install_dir, &platform.binary_name())?;
        utils::make_executable(&binary_path)?;

        // Removes the staging directory and the archive
        drop(staging);
        drop(archive);

        tracing::info!("Installed {}", binary_path.display());

        Ok(InstallReport {
            url,
            platform,
            binary_path,
        })
    }
}
