use thiserror::Error;

#[derive(Error, Debug)]
pub enum InstallError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("'{tool}' is required to extract {format} archives but was not found on PATH. Install it or re-run with --extractor builtin")]
    MissingUtility { tool: String, format: String },

    #[error("Failed to download {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    #[error("Incomplete download from {url}: expected {expected} bytes, received {received}")]
    IncompleteTransfer {
        url: String,
        expected: u64,
        received: u64,
    },

    #[error("Archive extraction failed for {file}: {reason}")]
    ArchiveExtraction { file: String, reason: String },

    #[error("Binary '{name}' not found in {dir} after extraction")]
    BinaryNotFound { name: String, dir: String },

    #[error("Configuration error at {path}: {message}")]
    Config { path: String, message: String },

    #[error("Could not determine the home directory of the current user")]
    HomeDirNotFound,
}

impl InstallError {
    /// Errors raised before any network activity took place
    pub fn is_precondition(&self) -> bool {
        matches!(self, InstallError::MissingUtility { .. })
    }
}

pub type Result<T> = std::result::Result<T, InstallError>;
