//! # webb-install
//!
//! Bootstrap installer for the `webb` command-line tools.
//!
//! ## Overview
//!
//! `webb-install` picks the prebuilt release archive matching the host
//! operating system and CPU architecture, downloads it from the webb-cli
//! GitHub releases, unpacks it into `~/.webb` and tells the user how to put
//! that directory on their `PATH`.
//!
//! The pipeline is strictly sequential:
//!
//! 1. [`platform`] maps the host to a target triple and archive format
//! 2. [`release`] turns a version selector into a download URL
//! 3. [`download`] fetches the archive, failing on any transport error
//! 4. [`installer`] extracts it and marks the binary executable
//! 5. [`advisor`] checks PATH visibility and prints instructions
//!
//! ## Usage
//!
//! ```bash
//! # Install the latest release
//! webb-install
//!
//! # Install a specific release
//! webb-install v0.1.0-beta.2
//! ```
//!
//! ## Configuration
//!
//! Defaults can be changed in `<config dir>/webb-install.toml`:
//!
//! ```toml
//! [default]
//! install_dir = "~/.webb"
//! timeout = 30
//! extractor = "builtin"
//! ```

/// Name of the installed executable, without platform suffix
pub const BINARY_NAME: &str = "webb";

/// PATH inspection and shell-specific guidance
pub mod advisor;

/// Command-line interface definitions and argument parsing
pub mod cli;

/// Configuration file handling
pub mod config;

/// Streaming archive download
pub mod download;

/// Error types and error handling utilities
pub mod error;

/// Installation pipeline
pub mod installer;

/// Host platform to release target mapping
pub mod platform;

/// Release URL construction
pub mod release;

/// Archive extraction and file operations
pub mod utils;
