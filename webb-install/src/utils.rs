use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::error::{InstallError, Result};
use crate::platform::ArchiveFormat;

/// How archives get unpacked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Extractor {
    /// In-process extraction with the tar/flate2/zip crates
    #[default]
    Builtin,
    /// Host utilities (`tar`, `unzip`) found on PATH
    System,
}

/// Extraction strategy that passed its preconditions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionMethod {
    Builtin,
    System(PathBuf),
}

/// Host utility needed to unpack `format` with the system extractor
pub fn required_tool(format: ArchiveFormat) -> &'static str {
    match format {
        ArchiveFormat::TarGz => "tar",
        ArchiveFormat::Zip => "unzip",
    }
}

/// Check that the chosen extractor can handle `format` on this host.
///
/// Runs before anything touches the network so a missing utility fails fast.
pub fn prepare_extractor(
    extractor: Extractor,
    format: ArchiveFormat,
    search_path: Option<&OsStr>,
) -> Result<ExtractionMethod> {
    match extractor {
        Extractor::Builtin => Ok(ExtractionMethod::Builtin),
        Extractor::System => {
            let tool = required_tool(format);
            let cwd = std::env::current_dir()?;
            which::which_in(tool, search_path, cwd)
                .map(ExtractionMethod::System)
                .map_err(|_| InstallError::MissingUtility {
                    tool: tool.to_string(),
                    format: format.to_string(),
                })
        }
    }
}

/// Extract `archive_path` into `dest_dir`, overwriting existing entries
pub fn extract_archive(
    archive_path: &Path,
    format: ArchiveFormat,
    dest_dir: &Path,
    method: &ExtractionMethod,
) -> Result<()> {
    tracing::debug!(
        "Extracting {} ({}) into {}",
        archive_path.display(),
        format,
        dest_dir.display()
    );

    let extraction_error = |reason: String| InstallError::ArchiveExtraction {
        file: archive_path.display().to_string(),
        reason,
    };

    match method {
        ExtractionMethod::Builtin => match format {
            ArchiveFormat::TarGz => {
                extract_tar_gz(archive_path, dest_dir).map_err(|e| extraction_error(e.to_string()))
            }
            ArchiveFormat::Zip => extract_zip(archive_path, dest_dir).map_err(extraction_error),
        },
        ExtractionMethod::System(tool) => {
            let mut cmd = Command::new(tool);
            match format {
                ArchiveFormat::TarGz => {
                    cmd.arg("-xzf").arg(archive_path).arg("-C").arg(dest_dir);
                }
                ArchiveFormat::Zip => {
                    cmd.arg("-o").arg("-q").arg(archive_path).arg("-d").arg(dest_dir);
                }
            }

            let status = cmd.status()?;
            if !status.success() {
                return Err(extraction_error(format!(
                    "{} exited with {}",
                    tool.display(),
                    status
                )));
            }
            Ok(())
        }
    }
}

/// Extract tar.gz archive
fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> io::Result<()> {
    let file = fs::File::open(archive_path)?;
    let gz_decoder = flate2::read::GzDecoder::new(file);
    let mut archive = tar::Archive::new(gz_decoder);
    archive.set_overwrite(true);
    archive.unpack(dest_dir)?;
    Ok(())
}

/// Extract zip archive
fn extract_zip(archive_path: &Path, dest_dir: &Path) -> std::result::Result<(), String> {
    let file = fs::File::open(archive_path).map_err(|e| e.to_string())?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| e.to_string())?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(|e| e.to_string())?;
        let outpath = match file.enclosed_name() {
            Some(name) => dest_dir.join(name),
            None => {
                tracing::warn!("Skipping unsafe zip entry {}", file.name());
                continue;
            }
        };

        if file.is_dir() {
            fs::create_dir_all(&outpath).map_err(|e| e.to_string())?;
        } else {
            if let Some(parent) = outpath.parent() {
                fs::create_dir_all(parent).map_err(|e| e.to_string())?;
            }
            let mut outfile = fs::File::create(&outpath).map_err(|e| e.to_string())?;
            io::copy(&mut file, &mut outfile).map_err(|e| e.to_string())?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = file.unix_mode() {
                fs::set_permissions(&outpath, fs::Permissions::from_mode(mode))
                    .map_err(|e| e.to_string())?;
            }
        }
    }

    Ok(())
}

/// Move a freshly extracted release from `staging` into `install_dir`.
///
/// The binary is looked up in `staging` only, so a binary left over from a
/// previous install never shadows the new one. It always lands at the top of
/// `install_dir`, whatever directory the archive nested it in. Directories
/// emptied by that move are dropped; every other entry replaces its namesake
/// in `install_dir`.
pub fn promote_staged(staging: &Path, install_dir: &Path, name: &str) -> Result<PathBuf> {
    let staged = walkdir::WalkDir::new(staging)
        .min_depth(1)
        .max_depth(4)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .find(|entry| entry.file_type().is_file() && entry.file_name() == OsStr::new(name))
        .ok_or_else(|| InstallError::BinaryNotFound {
            name: name.to_string(),
            dir: install_dir.display().to_string(),
        })?;

    let dest = install_dir.join(name);
    tracing::debug!("Moving {} to {}", staged.path().display(), dest.display());
    replace_path(staged.path(), &dest)?;

    prune_empty_dirs(staging);

    for entry in fs::read_dir(staging)? {
        let entry = entry?;
        replace_path(&entry.path(), &install_dir.join(entry.file_name()))?;
    }

    Ok(dest)
}

fn replace_path(from: &Path, to: &Path) -> Result<()> {
    if to.is_dir() && !to.is_symlink() {
        fs::remove_dir_all(to)?;
    } else if to.exists() || to.is_symlink() {
        fs::remove_file(to)?;
    }
    fs::rename(from, to)?;
    Ok(())
}

/// Remove every directory under `root` that holds no files
fn prune_empty_dirs(root: &Path) {
    for entry in walkdir::WalkDir::new(root)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
    {
        // Fails for non-empty directories, which are kept
        let _ = fs::remove_dir(entry.path());
    }
}

/// Make a file executable (Unix only)
#[cfg(unix)]
pub fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(permissions.mode() | 0o111);
    fs::set_permissions(path, permissions)?;
    Ok(())
}

#[cfg(not(unix))]
pub fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// Expand a leading `~` against the current user's home directory
pub fn expand_home(path: &str) -> Result<PathBuf> {
    if let Some(rest) = path.strip_prefix('~') {
        let home = directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().to_path_buf())
            .ok_or(InstallError::HomeDirNotFound)?;
        let rest = rest.trim_start_matches(['/', '\\']);
        return Ok(if rest.is_empty() { home } else { home.join(rest) });
    }
    Ok(PathBuf::from(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_tar_gz(path: &Path, entries: &[(&str, &[u8])]) {
        let file = fs::File::create(path).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (name, data) in entries {
            writer
                .start_file(*name, zip::write::SimpleFileOptions::default().unix_permissions(0o644))
                .unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_extract_tar_gz_overwrites() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("webb-download.tar.gz");
        write_tar_gz(&archive, &[("webb", b"new build")]);

        let dest = dir.path().join("install");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("webb"), b"old build").unwrap();

        extract_archive(&archive, ArchiveFormat::TarGz, &dest, &ExtractionMethod::Builtin)
            .unwrap();

        assert_eq!(fs::read(dest.join("webb")).unwrap(), b"new build");
    }

    #[test]
    fn test_extract_zip_overwrites() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("webb-download.zip");
        write_zip(&archive, &[("webb.exe", b"new build"), ("README.md", b"docs")]);

        let dest = dir.path().join("install");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("webb.exe"), b"old build").unwrap();

        extract_archive(&archive, ArchiveFormat::Zip, &dest, &ExtractionMethod::Builtin).unwrap();

        assert_eq!(fs::read(dest.join("webb.exe")).unwrap(), b"new build");
        assert_eq!(fs::read(dest.join("README.md")).unwrap(), b"docs");
    }

    #[test]
    fn test_corrupt_archive_is_extraction_error() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("webb-download.tar.gz");
        fs::write(&archive, b"<html>this is not gzip</html>").unwrap();

        let err = extract_archive(
            &archive,
            ArchiveFormat::TarGz,
            dir.path(),
            &ExtractionMethod::Builtin,
        )
        .unwrap_err();
        assert!(matches!(err, InstallError::ArchiveExtraction { .. }));

        let err = extract_archive(&archive, ArchiveFormat::Zip, dir.path(), &ExtractionMethod::Builtin)
            .unwrap_err();
        assert!(matches!(err, InstallError::ArchiveExtraction { .. }));
    }

    #[test]
    fn test_builtin_extractor_has_no_preconditions() {
        let empty = tempdir().unwrap();
        let method = prepare_extractor(
            Extractor::Builtin,
            ArchiveFormat::Zip,
            Some(empty.path().as_os_str()),
        )
        .unwrap();
        assert_eq!(method, ExtractionMethod::Builtin);
    }

    #[test]
    fn test_missing_system_utility() {
        let empty = tempdir().unwrap();
        let err = prepare_extractor(
            Extractor::System,
            ArchiveFormat::Zip,
            Some(empty.path().as_os_str()),
        )
        .unwrap_err();

        assert!(err.is_precondition());
        assert!(err.to_string().contains("unzip"));
    }

    #[cfg(unix)]
    #[test]
    fn test_system_utility_found_on_path() {
        let bin_dir = tempdir().unwrap();
        let tool = bin_dir.path().join("tar");
        fs::write(&tool, "#!/bin/sh\nexit 0\n").unwrap();
        make_executable(&tool).unwrap();

        let method = prepare_extractor(
            Extractor::System,
            ArchiveFormat::TarGz,
            Some(bin_dir.path().as_os_str()),
        )
        .unwrap();
        match method {
            ExtractionMethod::System(found) => assert!(found.ends_with("tar")),
            other => panic!("expected system extractor, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_system_tar_extracts() {
        let Ok(tar_tool) = which::which("tar") else {
            return;
        };

        let dir = tempdir().unwrap();
        let archive = dir.path().join("webb-download.tar.gz");
        write_tar_gz(&archive, &[("webb", b"from system tar")]);

        let dest = dir.path().join("install");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("webb"), b"old build").unwrap();

        extract_archive(
            &archive,
            ArchiveFormat::TarGz,
            &dest,
            &ExtractionMethod::System(tar_tool),
        )
        .unwrap();

        assert_eq!(fs::read(dest.join("webb")).unwrap(), b"from system tar");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_tool_failure_is_extraction_error() {
        let dir = tempdir().unwrap();
        let tool = dir.path().join("unzip");
        fs::write(&tool, "#!/bin/sh\nexit 9\n").unwrap();
        make_executable(&tool).unwrap();

        let archive = dir.path().join("webb-download.zip");
        write_zip(&archive, &[("webb.exe", b"build")]);

        let err = extract_archive(
            &archive,
            ArchiveFormat::Zip,
            dir.path(),
            &ExtractionMethod::System(tool),
        )
        .unwrap_err();

        match err {
            InstallError::ArchiveExtraction { reason, .. } => assert!(reason.contains("exited")),
            other => panic!("expected extraction error, got {other:?}"),
        }
    }

    #[test]
    fn test_promote_nested_binary() {
        let dir = tempdir().unwrap();
        let staging = dir.path().join("staging");
        let nested = staging.join("webb-v0.1.0").join("bin");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("webb"), b"binary").unwrap();
        fs::write(staging.join("LICENSE"), b"license").unwrap();

        let install_dir = dir.path().join("install");
        fs::create_dir_all(&install_dir).unwrap();

        let promoted = promote_staged(&staging, &install_dir, "webb").unwrap();

        assert_eq!(promoted, install_dir.join("webb"));
        assert_eq!(fs::read(&promoted).unwrap(), b"binary");
        assert_eq!(fs::read(install_dir.join("LICENSE")).unwrap(), b"license");
        assert!(!install_dir.join("webb-v0.1.0").exists());
        assert_eq!(fs::read_dir(&staging).unwrap().count(), 0);
    }

    #[test]
    fn test_promote_ignores_previous_install() {
        let dir = tempdir().unwrap();
        let staging = dir.path().join("staging");
        fs::create_dir_all(staging.join("webb-dist")).unwrap();
        fs::write(staging.join("webb-dist").join("webb"), b"v2").unwrap();

        let install_dir = dir.path().join("install");
        fs::create_dir_all(&install_dir).unwrap();
        fs::write(install_dir.join("webb"), b"v1").unwrap();

        let promoted = promote_staged(&staging, &install_dir, "webb").unwrap();

        assert_eq!(fs::read(promoted).unwrap(), b"v2");
        let names: Vec<_> = fs::read_dir(&install_dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![OsStr::new("webb").to_os_string()]);
    }

    #[test]
    fn test_promote_missing_binary() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("README.md"), b"docs").unwrap();

        let err = promote_staged(dir.path(), dir.path(), "webb").unwrap_err();
        assert!(matches!(err, InstallError::BinaryNotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_make_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let file = dir.path().join("webb");
        fs::write(&file, b"binary").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o644)).unwrap();

        make_executable(&file).unwrap();

        let mode = fs::metadata(&file).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn test_expand_home() {
        let expanded = expand_home("~/.webb").unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.ends_with(".webb"));

        assert_eq!(expand_home("/opt/webb").unwrap(), PathBuf::from("/opt/webb"));
    }
}
