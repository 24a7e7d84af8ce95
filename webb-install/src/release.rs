use std::fmt;

use crate::platform::Platform;

/// Default location of the webb CLI release artifacts
pub const DEFAULT_RELEASE_URL: &str = "https://github.com/webb-tools/webb-cli/releases";

/// Which release to install
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VersionSelector {
    #[default]
    Latest,
    Tag(String),
}

impl From<Option<String>> for VersionSelector {
    fn from(tag: Option<String>) -> Self {
        match tag {
            Some(tag) => VersionSelector::Tag(tag),
            None => VersionSelector::Latest,
        }
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSelector::Latest => f.write_str("latest"),
            VersionSelector::Tag(tag) => f.write_str(tag),
        }
    }
}

/// Name of the release asset for a platform, e.g. `webb-x86_64-apple-darwin.tar.gz`
pub fn asset_name(platform: &Platform) -> String {
    format!(
        "{}-{}.{}",
        crate::BINARY_NAME,
        platform.target,
        platform.format.extension()
    )
}

/// Build the download URL for a release asset.
///
/// Tags are passed through untouched; a bad tag surfaces as a 404 at
/// download time.
pub fn release_url(base: &str, version: &VersionSelector, platform: &Platform) -> String {
    let base = base.trim_end_matches('/');
    let asset = asset_name(platform);

    match version {
        VersionSelector::Latest => format!("{base}/latest/download/{asset}"),
        VersionSelector::Tag(tag) => format!("{base}/download/{tag}/{asset}"),
    }
}
