//! Post-install guidance for making the installed binary reachable on PATH.
//!
//! On Unix this only prints instructions for the user's shell. On Windows the
//! user-scope `Path` variable is updated directly, the way the official
//! PowerShell installers do it.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{InstallError, Result};

/// Interactive shell, detected from `$SHELL`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shell {
    Zsh,
    Bash,
    Fish,
    Other(String),
}

impl Shell {
    /// Detect the shell from the value of `$SHELL`, e.g. `/usr/bin/zsh`
    pub fn from_shell_var(value: Option<&str>) -> Shell {
        let name = value
            .and_then(|v| Path::new(v).file_name())
            .and_then(|n| n.to_str())
            .unwrap_or("sh");

        match name {
            "zsh" => Shell::Zsh,
            "bash" => Shell::Bash,
            "fish" => Shell::Fish,
            other => Shell::Other(other.to_string()),
        }
    }

    /// Startup file the PATH line belongs in
    pub fn rc_file(&self) -> &'static str {
        match self {
            Shell::Zsh => "~/.zshrc",
            Shell::Bash if cfg!(target_os = "macos") => "~/.bash_profile",
            Shell::Bash => "~/.bashrc",
            Shell::Fish => "~/.config/fish/config.fish",
            Shell::Other(_) => "~/.profile",
        }
    }

    /// Line that puts `dir` on the search path for this shell
    pub fn path_line(&self, dir: &Path) -> String {
        match self {
            Shell::Fish => format!("fish_add_path \"{}\"", dir.display()),
            _ => format!("export PATH=\"{}:$PATH\"", dir.display()),
        }
    }
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shell::Zsh => f.write_str("zsh"),
            Shell::Bash => f.write_str("bash"),
            Shell::Fish => f.write_str("fish"),
            Shell::Other(name) => f.write_str(name),
        }
    }
}

/// What the user should know once the binary is installed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advice {
    /// The binary already resolves through PATH
    Ready { binary: String },
    /// Unix: the user has to extend PATH in their shell profile
    AddToShell {
        shell: Shell,
        rc_file: String,
        line: String,
    },
    /// Windows: the install directory is on the user `Path`
    UserPathUpdated { dir: PathBuf, persisted: bool },
    /// Windows: the user `Path` could not be changed
    UserPathUpdateFailed { dir: PathBuf, reason: String },
}

impl fmt::Display for Advice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advice::Ready { binary } => {
                write!(f, "{binary} is ready to use. Run `{binary} --help` to get started.")
            }
            Advice::AddToShell {
                shell,
                rc_file,
                line,
            } => {
                writeln!(f, "To use webb from a new {shell} session, run:")?;
                writeln!(f)?;
                writeln!(f, "    echo {} >> {rc_file}", quote_posix(line))?;
                writeln!(f)?;
                write!(f, "and then restart your shell, or run `{line}` right now.")
            }
            Advice::UserPathUpdated { dir, persisted } => {
                if *persisted {
                    write!(
                        f,
                        "Added {} to your user PATH. Open a new terminal to use webb.",
                        dir.display()
                    )
                } else {
                    write!(
                        f,
                        "{} is already on your user PATH. Open a new terminal to use webb.",
                        dir.display()
                    )
                }
            }
            Advice::UserPathUpdateFailed { dir, reason } => write!(
                f,
                "Could not update your user PATH ({reason}). Add {} to PATH manually.",
                dir.display()
            ),
        }
    }
}

/// Whether `binary` resolves through the given search path
pub fn is_on_path(binary: &str, search_path: Option<&OsStr>) -> bool {
    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(_) => return false,
    };
    which::which_in(binary, search_path, cwd).is_ok()
}

/// Advice for a Unix host, given the current search path and `$SHELL`
pub fn advise_unix(
    binary: &str,
    install_dir: &Path,
    search_path: Option<&OsStr>,
    shell_var: Option<&str>,
) -> Advice {
    if is_on_path(binary, search_path) {
        return Advice::Ready {
            binary: binary.to_string(),
        };
    }

    let shell = Shell::from_shell_var(shell_var);
    tracing::debug!("{} is not on PATH; detected shell {}", binary, shell);

    Advice::AddToShell {
        rc_file: shell.rc_file().to_string(),
        line: shell.path_line(install_dir),
        shell,
    }
}

/// Persistent, per-user environment variable table
pub trait UserEnvironment {
    fn get(&self, name: &str) -> Result<Option<String>>;
    fn set(&mut self, name: &str, value: &str) -> Result<()>;
}

/// User environment of a Windows account, accessed through PowerShell
pub struct PowerShellEnvironment;

impl PowerShellEnvironment {
    fn run(script: &str) -> Result<String> {
        let output = Command::new("powershell")
            .args(["-NoProfile", "-NonInteractive", "-Command", script])
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(InstallError::Io(std::io::Error::other(format!(
                "powershell exited with {}: {}",
                output.status,
                stderr.trim()
            ))));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Single-quote `value` for a POSIX shell
fn quote_posix(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

fn quote_powershell(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

impl UserEnvironment for PowerShellEnvironment {
    fn get(&self, name: &str) -> Result<Option<String>> {
        let value = Self::run(&format!(
            "[Environment]::GetEnvironmentVariable({}, 'User')",
            quote_powershell(name)
        ))?;
        Ok(if value.is_empty() { None } else { Some(value) })
    }

    fn set(&mut self, name: &str, value: &str) -> Result<()> {
        Self::run(&format!(
            "[Environment]::SetEnvironmentVariable({}, {}, 'User')",
            quote_powershell(name),
            quote_powershell(value)
        ))?;
        Ok(())
    }
}

fn same_dir(entry: &str, dir: &str) -> bool {
    entry
        .trim()
        .trim_end_matches(['\\', '/'])
        .eq_ignore_ascii_case(dir.trim_end_matches(['\\', '/']))
}

/// New `Path` value with `dir` appended, or `None` if it is already present
pub fn append_to_path(current: Option<&str>, dir: &Path) -> Option<String> {
    let dir = dir.to_string_lossy();

    match current {
        Some(current) if current.split(';').any(|entry| same_dir(entry, &dir)) => None,
        Some(current) if !current.trim().is_empty() => {
            Some(format!("{};{}", current.trim_end_matches(';'), dir))
        }
        _ => Some(dir.into_owned()),
    }
}

/// Read-modify-write of the user `Path`. Returns whether a write happened.
pub fn update_user_path<E: UserEnvironment>(store: &mut E, dir: &Path) -> Result<bool> {
    let current = store.get("Path")?;

    match append_to_path(current.as_deref(), dir) {
        Some(updated) => {
            tracing::info!("Adding {} to the user PATH", dir.display());
            store.set("Path", &updated)?;
            Ok(true)
        }
        None => {
            tracing::debug!("{} is already on the user PATH", dir.display());
            Ok(false)
        }
    }
}

/// Advice for a Windows host; persists the PATH change through `store`
pub fn advise_windows<E: UserEnvironment>(
    binary: &str,
    install_dir: &Path,
    search_path: Option<&OsStr>,
    store: &mut E,
) -> Advice {
    if is_on_path(binary, search_path) {
        return Advice::Ready {
            binary: binary.to_string(),
        };
    }

    match update_user_path(store, install_dir) {
        Ok(persisted) => Advice::UserPathUpdated {
            dir: install_dir.to_path_buf(),
            persisted,
        },
        Err(e) => Advice::UserPathUpdateFailed {
            dir: install_dir.to_path_buf(),
            reason: e.to_string(),
        },
    }
}

/// Extend the PATH of the running process so child processes see `dir`
pub fn extend_session_path(dir: &Path) {
    let mut entries: Vec<PathBuf> = std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default();

    if entries.iter().any(|entry| entry == dir) {
        return;
    }
    entries.push(dir.to_path_buf());

    match std::env::join_paths(entries) {
        Ok(joined) => std::env::set_var("PATH", joined),
        Err(e) => tracing::warn!("Could not extend PATH for this session: {}", e),
    }
}

/// Inspect the current host and produce advice for `binary` in `install_dir`
pub fn advise(binary: &str, install_dir: &Path) -> Advice {
    let search_path: Option<OsString> = std::env::var_os("PATH");

    if cfg!(windows) {
        let advice = advise_windows(
            binary,
            install_dir,
            search_path.as_deref(),
            &mut PowerShellEnvironment,
        );
        if matches!(advice, Advice::UserPathUpdated { .. }) {
            extend_session_path(install_dir);
        }
        advice
    } else {
        let shell = std::env::var("SHELL").ok();
        advise_unix(binary, install_dir, search_path.as_deref(), shell.as_deref())
    }
}
