use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;

use crate::error::{InstallError, Result};

/// Downloaded archive that is removed again when dropped.
///
/// Removal is best-effort: a failed delete is logged and otherwise ignored.
#[derive(Debug)]
pub struct TempArchive {
    path: PathBuf,
}

impl TempArchive {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempArchive {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("Removed {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Could not remove {}: {}", self.path.display(), e),
        }
    }
}

pub struct Downloader {
    http_client: Client,
}

impl Downloader {
    /// `timeout` bounds connecting and each read, not the whole transfer
    pub fn new(timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(concat!("webb-install/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()?;

        Ok(Self { http_client })
    }

    /// Stream `url` into `dest`, failing on any transport error.
    ///
    /// Nothing is written to disk unless the server answers with a success
    /// status. There is no retry.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<TempArchive> {
        tracing::info!("Downloading {}", url);

        let response = self.http_client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(InstallError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let expected = response.content_length();

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::File::create(dest)?;
        let archive = TempArchive {
            path: dest.to_path_buf(),
        };

        let mut received: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)?;
            received += chunk.len() as u64;
        }
        file.flush()?;

        if let Some(expected) = expected {
            if received != expected {
                return Err(InstallError::IncompleteTransfer {
                    url: url.to_string(),
                    expected,
                    received,
                });
            }
        }

        tracing::debug!("Wrote {} bytes to {}", received, dest.display());
        Ok(archive)
    }
}
